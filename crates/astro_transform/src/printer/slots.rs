//! Slot partitioning for component children.
//!
//! Children of a component are grouped into the slots object passed to
//! `$$renderComponent`: a default bucket, named buckets keyed by quoted
//! `slot` attributes, computed buckets keyed by `slot` expressions, and
//! conditional expressions merged in through `$$mergeSlots`.

use crate::ast::{AttributeKind, NodeId, NodeKind};
use crate::diagnostic::{Diagnostic, DiagnosticCode, DiagnosticLabel};

use super::escape::escape_double_quotes;
use super::{flavor, runtime, NodeFlavor, Printer};

/// One slot bucket: the rendered object key and the children that feed it.
struct SlotGroup {
    key: String,
    children: Vec<NodeId>,
}

impl Printer<'_> {
    pub(super) fn print_component_slots(&mut self, id: NodeId) {
        let (groups, conditional) = self.partition_slot_children(id);
        if groups.is_empty() && conditional.is_empty() {
            return;
        }

        self.print(",");
        if !conditional.is_empty() {
            self.print(&format!("{}(", runtime::MERGE_SLOTS));
        }

        self.print("{");
        for group in &groups {
            self.print(&group.key);
            self.print(": ");
            self.print(self.get_async_prefix());
            self.print(self.get_slot_params());
            self.print(runtime::RENDER);
            self.print("`");
            for &child in &group.children {
                self.skip_slot_attribute = true;
                self.print_node(child);
                self.skip_slot_attribute = false;
            }
            self.print("`,");
        }
        self.print("}");

        if !conditional.is_empty() {
            for expr in conditional {
                self.print(",");
                self.print_conditional_slot_expression(expr);
            }
            self.print(")");
        }
    }

    /// Split a component's children into named/default buckets and the
    /// conditional expressions that must be merged at runtime.
    fn partition_slot_children(&mut self, id: NodeId) -> (Vec<SlotGroup>, Vec<NodeId>) {
        let mut groups: Vec<SlotGroup> = Vec::new();
        let mut conditional: Vec<NodeId> = Vec::new();

        let mut push = |groups: &mut Vec<SlotGroup>, key: String, child: NodeId| {
            if let Some(group) = groups.iter_mut().find(|g| g.key == key) {
                group.children.push(child);
            } else {
                groups.push(SlotGroup {
                    key,
                    children: vec![child],
                });
            }
        };
        let default_key = "\"default\"".to_string();

        for child in self.doc.children(id) {
            match flavor(self.doc, child) {
                NodeFlavor::Frontmatter | NodeFlavor::Doctype => {}
                NodeFlavor::Comment => {
                    if !self.options.strip_slot_comments {
                        push(&mut groups, default_key.clone(), child);
                    }
                }
                NodeFlavor::Text | NodeFlavor::Raw => {
                    push(&mut groups, default_key.clone(), child);
                }
                NodeFlavor::Expression => {
                    match self.expression_slot_name(child) {
                        ExpressionSlot::Uniform(None) => {
                            push(&mut groups, default_key.clone(), child);
                        }
                        ExpressionSlot::Uniform(Some(name)) => {
                            let key = format!("\"{}\"", escape_double_quotes(&name));
                            push(&mut groups, key, child);
                        }
                        ExpressionSlot::Mixed => conditional.push(child),
                    }
                }
                _ => {
                    let slot = self.doc.node(child).attribute("slot").cloned();
                    let key = match slot {
                        Some(attr) if attr.kind == AttributeKind::Quoted
                            && !attr.value.is_empty() =>
                        {
                            format!("\"{}\"", escape_double_quotes(&attr.value))
                        }
                        Some(attr) if attr.kind == AttributeKind::Expression
                            && !attr.value.trim().is_empty() =>
                        {
                            format!("[{}]", attr.value)
                        }
                        Some(attr) => {
                            let span = self.doc.node(child).span;
                            self.diagnostics.push(
                                Diagnostic::warning(
                                    DiagnosticCode::DynamicSlotName,
                                    format!(
                                        "Unable to resolve the `slot` name \"{}\"",
                                        attr.value
                                    ),
                                )
                                .with_label(DiagnosticLabel::new(
                                    None,
                                    span.start,
                                    span.end,
                                    self.source,
                                )),
                            );
                            default_key.clone()
                        }
                        None => default_key.clone(),
                    };
                    push(&mut groups, key, child);
                }
            }
        }

        // A default bucket that only holds whitespace renders nothing useful;
        // drop it so `<Layout>\n  <p slot="a"/>\n</Layout>` gets no phantom
        // default slot.
        if let Some(pos) = groups.iter().position(|g| g.key == default_key) {
            let contentless = groups[pos]
                .children
                .iter()
                .all(|&c| !crate::transform::jsx_child_has_content(self.doc, c));
            if contentless {
                groups.remove(pos);
            }
        }

        (groups, conditional)
    }

    /// Inspect the embedded markup of an expression child: if every element
    /// targets the same slot name (or none), the whole expression belongs to
    /// that bucket; otherwise it must be merged conditionally.
    fn expression_slot_name(&self, id: NodeId) -> ExpressionSlot {
        let mut seen: Option<Option<String>> = None;
        for child in self.doc.children(id) {
            let node = self.doc.node(child);
            if node.kind != NodeKind::Element {
                continue;
            }
            let name = node
                .attribute("slot")
                .filter(|a| a.kind == AttributeKind::Quoted && !a.value.is_empty())
                .map(|a| a.value.clone());
            match &seen {
                None => seen = Some(name),
                Some(prev) if *prev == name => {}
                Some(_) => return ExpressionSlot::Mixed,
            }
        }
        ExpressionSlot::Uniform(seen.flatten())
    }

    /// A conditional slot expression renders as a JavaScript expression whose
    /// embedded elements become single-entry slot objects, ready for
    /// `$$mergeSlots`.
    fn print_conditional_slot_expression(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        self.map_span(node.span);

        for child in self.doc.children(id) {
            match flavor(self.doc, child) {
                NodeFlavor::Text => {
                    let content = self.doc.node(child).content.clone();
                    self.print(&content);
                }
                NodeFlavor::Comment | NodeFlavor::Doctype | NodeFlavor::Frontmatter => {}
                _ => {
                    let name = self
                        .doc
                        .node(child)
                        .attribute("slot")
                        .filter(|a| a.kind == AttributeKind::Quoted && !a.value.is_empty())
                        .map_or_else(|| "default".to_string(), |a| a.value.clone());
                    self.print(&format!(
                        "{{\"{}\": {}{}{}`",
                        escape_double_quotes(&name),
                        self.get_async_prefix(),
                        self.get_slot_params(),
                        runtime::RENDER
                    ));
                    self.skip_slot_attribute = true;
                    self.print_node(child);
                    self.skip_slot_attribute = false;
                    self.print("`}");
                }
            }
        }
    }
}

enum ExpressionSlot {
    /// Every embedded element targets the same bucket (`None` = default).
    Uniform(Option<String>),
    /// Elements target different buckets; merge at runtime.
    Mixed,
}

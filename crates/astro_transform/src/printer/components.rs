//! Component rendering.
//!
//! `impl Printer` methods for `$$renderComponent` calls: the to-object
//! attribute form, transition attributes, `set:html`/`set:text` default
//! slots, and the component reference rules for custom elements and
//! `client:only` islands.

use crate::ast::{Attribute, AttributeKind, NodeId};

use super::escape::{decode_html_entities, escape_double_quotes, escape_template_literal};
use super::{runtime, Printer};

/// Attribute keys consumed by the compiler rather than forwarded as props.
fn is_consumed_attribute(key: &str) -> bool {
    matches!(key, "set:html" | "set:text" | "is:raw" | "define:vars")
        || key.starts_with("transition:")
}

/// Whether an expression is a bare string/template literal that needs no
/// wrapping parentheses in the props object.
fn is_bare_literal(value: &str) -> bool {
    let t = value.trim();
    t.starts_with('"') || t.starts_with('\'') || t.starts_with('`')
}

impl Printer<'_> {
    pub(super) fn print_component(&mut self, id: NodeId) {
        let skip_slot = std::mem::take(&mut self.skip_slot_attribute);
        let node = self.doc.node(id);
        self.map_span(node.span);

        let tag = node.tag.clone();
        let display_name = if node.is_fragment {
            runtime::FRAGMENT.to_string()
        } else {
            tag.clone()
        };
        let is_client_only = node.attributes.iter().any(|a| a.key == "client:only");
        let reference = if is_client_only {
            // Resolved purely from the injected path/export attributes.
            "null".to_string()
        } else if node.is_custom_element {
            format!("\"{tag}\"")
        } else if node.is_fragment {
            runtime::FRAGMENT.to_string()
        } else {
            tag.clone()
        };

        self.print(&format!(
            "${{{}({},\"{display_name}\",{reference},",
            runtime::RENDER_COMPONENT,
            runtime::RESULT
        ));
        self.print_component_attributes(id, skip_slot);

        let node = self.doc.node(id);
        if node.has_attribute("set:html") || node.has_attribute("set:text") {
            self.print_set_directive_slot(id);
        } else {
            self.print_component_slots(id);
        }

        self.print(")}");
    }

    fn print_component_attributes(&mut self, id: NodeId, skip_slot: bool) {
        let node = self.doc.node(id);
        let attrs = node.attributes.clone();
        let transition_scope = node.transition_scope.clone();

        let mut items: Vec<String> = Vec::new();
        for attr in &attrs {
            if is_consumed_attribute(&attr.key) {
                continue;
            }
            if skip_slot && attr.key == "slot" {
                continue;
            }
            let key = format!("\"{}\"", escape_double_quotes(&attr.key));
            match attr.kind {
                AttributeKind::Quoted => {
                    items.push(format!("{key}:\"{}\"", escape_double_quotes(&attr.value)));
                }
                AttributeKind::Empty => items.push(format!("{key}:true")),
                AttributeKind::Expression => {
                    let value = attr.value.trim();
                    if value.is_empty() {
                        items.push(format!("{key}:undefined"));
                    } else if is_bare_literal(value) {
                        items.push(format!("{key}:{value}"));
                    } else {
                        items.push(format!("{key}:({value})"));
                    }
                }
                AttributeKind::Spread => items.push(format!("...({})", attr.value)),
                AttributeKind::Shorthand => {
                    items.push(format!("{key}:({})", attr.key));
                }
                AttributeKind::TemplateLiteral => {
                    items.push(format!("{key}:`{}`", attr.value));
                }
            }
        }

        items.extend(self.component_transition_items(&attrs, transition_scope.as_deref()));

        self.print("{");
        self.print(&items.join(","));
        self.print("}");
    }

    /// `transition:*` directives become runtime-call props appended after
    /// the regular attributes.
    fn component_transition_items(
        &self,
        attrs: &[Attribute],
        scope: Option<&str>,
    ) -> Vec<String> {
        let name = attrs.iter().find(|a| a.key == "transition:name");
        let animate = attrs.iter().find(|a| a.key == "transition:animate");
        let persist = attrs
            .iter()
            .find(|a| a.key == "transition:persist" || a.key == "transition:persist-props");

        let value_of = |attr: &Attribute| match attr.kind {
            AttributeKind::Quoted => format!("\"{}\"", escape_double_quotes(&attr.value)),
            AttributeKind::Expression => format!("({})", attr.value),
            AttributeKind::TemplateLiteral => format!("`{}`", attr.value),
            _ => "\"\"".to_string(),
        };

        let mut items = Vec::new();
        if persist.is_some() {
            if let Some(name) = name {
                items.push(format!(
                    "\"data-astro-transition-persist\":{}",
                    value_of(name)
                ));
            } else if let Some(scope) = scope {
                items.push(format!(
                    "\"data-astro-transition-persist\":({}({}, \"{scope}\"))",
                    runtime::CREATE_TRANSITION_SCOPE,
                    runtime::RESULT
                ));
            }
        }
        if name.is_some() || animate.is_some() {
            let name_val = name.map_or_else(|| "\"\"".to_string(), value_of);
            let animate_val = animate.map_or_else(|| "\"\"".to_string(), value_of);
            let scope = scope.unwrap_or_default();
            items.push(format!(
                "\"data-astro-transition-scope\":({}({}, \"{scope}\", {animate_val}, {name_val}))",
                runtime::RENDER_TRANSITION,
                runtime::RESULT
            ));
        }
        items
    }

    /// `set:html`/`set:text` on a component becomes its default slot.
    fn print_set_directive_slot(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        let async_prefix = self.get_async_prefix();
        let params = self.get_slot_params();

        let body = if let Some(attr) = node.attribute("set:text") {
            match attr.kind {
                AttributeKind::Quoted => escape_template_literal(&attr.value),
                _ => format!("${{{}}}", attr.value),
            }
        } else if let Some(attr) = node.attribute("set:html") {
            match attr.kind {
                AttributeKind::Quoted => {
                    escape_template_literal(&decode_html_entities(&attr.value))
                }
                AttributeKind::TemplateLiteral if !attr.value.contains("${") => {
                    escape_template_literal(&decode_html_entities(&attr.value))
                }
                AttributeKind::TemplateLiteral => format!(
                    "${{{}(`{}`)}}",
                    runtime::UNESCAPE_HTML,
                    attr.value
                ),
                _ => format!("${{{}({})}}", runtime::UNESCAPE_HTML, attr.value),
            }
        } else {
            String::new()
        };

        self.print(&format!(
            ",{{\"default\": {async_prefix}{params}{}`{body}`,}}",
            runtime::RENDER
        ));
    }
}

//! HTML element printing, attributes, and element classification.
//!
//! `impl Printer` methods for rendering plain HTML elements (non-component),
//! including the attribute rendering matrix, transition attributes, `<slot>`
//! elements and `<head>` handling.

use crate::ast::{Attribute, AttributeKind, NodeId};
use crate::options::ScopedStyleStrategy;

use super::escape::{escape_double_quotes, escape_html_attribute};
use super::{runtime, Printer};

/// Returns `true` for HTML void elements that must not have a closing tag.
pub(super) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "selectedcontent" // HTML customizable select element
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements that can appear in `<head>` and should NOT trigger
/// `$$maybeRenderHead`.
pub(super) fn is_head_element(name: &str) -> bool {
    matches!(
        name,
        "html"
            | "head"
            | "base"
            | "basefont"
            | "bgsound"
            | "link"
            | "meta"
            | "noframes"
            | "script"
            | "style"
            | "template"
            | "title"
    )
}

/// Attribute keys that are compiler directives, never literal output.
fn is_suppressed_attribute(key: &str) -> bool {
    matches!(
        key,
        "set:html" | "set:text" | "is:inline" | "is:raw" | "is:global" | "define:vars"
    ) || key.starts_with("transition:")
}

impl Printer<'_> {
    pub(super) fn print_element(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        if node.is_handled_script {
            self.print_handled_script(id);
            return;
        }

        let tag = node.tag.clone();
        self.maybe_insert_render_head(&tag);
        self.map_span(node.span);

        self.print("<");
        self.print(&tag);
        self.print_element_attributes(id);
        self.print(">");

        if is_void_element(&tag) {
            // Children of void elements are never rendered.
            return;
        }

        let entering_head = tag == "head";
        let was_in_head = self.in_head;
        if entering_head {
            self.in_head = true;
        }

        self.print_children(id);

        if entering_head {
            self.print(&format!("${{{}({})}}", runtime::RENDER_HEAD, runtime::RESULT));
            self.in_head = was_in_head;
            self.render_head_inserted = true;
        }

        if let Some(close) = self.doc.node(id).close_span {
            self.map_span(close);
        }
        self.print("</");
        self.print(&tag);
        self.print(">");
    }

    fn print_element_attributes(&mut self, id: NodeId) {
        let skip_slot = std::mem::take(&mut self.skip_slot_attribute);
        let node = self.doc.node(id);
        let attrs = node.attributes.clone();
        let transition_scope = node.transition_scope.clone();
        let span = node.span;

        self.print_transition_attributes(&attrs, transition_scope.as_deref());

        let needs_spread_scope_class = self.options.scoped_style_strategy
            == ScopedStyleStrategy::Class
            && self.ctx.has_scoped_styles
            && node.is_plain_element()
            && !attrs.iter().any(|a| a.key == "class" || a.key == "class:list");

        for attr in &attrs {
            if is_suppressed_attribute(&attr.key) {
                continue;
            }
            if skip_slot && attr.key == "slot" {
                continue;
            }
            self.map_span(attr.key_span);
            match attr.kind {
                AttributeKind::Quoted => {
                    self.print(" ");
                    self.print(&attr.key);
                    self.print("=\"");
                    self.print(&escape_html_attribute(&attr.value));
                    self.print("\"");
                }
                AttributeKind::Empty => {
                    self.print(" ");
                    self.print(&attr.key);
                }
                AttributeKind::Expression => {
                    let value = if attr.value.trim().is_empty() {
                        "undefined"
                    } else {
                        attr.value.as_str()
                    };
                    self.print(&format!(
                        "${{{}({value}, \"{}\")}}",
                        runtime::ADD_ATTRIBUTE,
                        attr.key
                    ));
                }
                AttributeKind::Spread => {
                    if needs_spread_scope_class {
                        self.print(&format!(
                            "${{{}({}, undefined, {{ class: \"astro-{}\" }})}}",
                            runtime::SPREAD_ATTRIBUTES,
                            attr.value,
                            self.ctx.scope
                        ));
                    } else {
                        self.print(&format!(
                            "${{{}({})}}",
                            runtime::SPREAD_ATTRIBUTES,
                            attr.value
                        ));
                    }
                }
                AttributeKind::Shorthand => {
                    if is_comment_only(&attr.key) {
                        continue;
                    }
                    self.print(&format!(
                        "${{{}({}, \"{}\")}}",
                        runtime::ADD_ATTRIBUTE,
                        attr.key,
                        attr.key
                    ));
                }
                AttributeKind::TemplateLiteral => {
                    self.print(&format!(
                        "${{{}(`{}`, \"{}\")}}",
                        runtime::ADD_ATTRIBUTE,
                        attr.value,
                        attr.key
                    ));
                }
            }
        }

        if self.options.annotate_source_file
            && attrs.iter().any(|a| a.key == "data-astro-source-file")
        {
            let loc = self.source_loc_for(span);
            self.print(&format!(" data-astro-source-loc=\"{loc}\""));
        }
    }

    /// Render `transition:*` directives into their runtime attribute forms.
    /// `transition:persist` with a `transition:name` borrows the name; on its
    /// own it allocates a transition scope.
    fn print_transition_attributes(&mut self, attrs: &[Attribute], scope: Option<&str>) {
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

        if persist.is_some() {
            if let Some(name) = name {
                let clean = value_of(name);
                let clean = clean.trim_matches('"');
                self.print(&format!(" data-astro-transition-persist=\"{clean}\""));
            } else if let Some(scope) = scope {
                self.print(&format!(
                    "${{{}({}({}, \"{scope}\"), \"data-astro-transition-persist\")}}",
                    runtime::ADD_ATTRIBUTE,
                    runtime::CREATE_TRANSITION_SCOPE,
                    runtime::RESULT
                ));
            }
        }

        if name.is_some() || animate.is_some() {
            let name_val = name.map_or_else(|| "\"\"".to_string(), value_of);
            let animate_val = animate.map_or_else(|| "\"\"".to_string(), value_of);
            let scope = scope.unwrap_or_default();
            self.print(&format!(
                "${{{}({}({}, \"{scope}\", {animate_val}, {name_val}), \"data-astro-transition-scope\")}}",
                runtime::ADD_ATTRIBUTE,
                runtime::RENDER_TRANSITION,
                runtime::RESULT
            ));
        }
    }

    /// `<slot>` elements render through the slot runtime with an optional
    /// fallback template.
    pub(super) fn print_slot_element(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        self.map_span(node.span);
        let name = node
            .attribute("name")
            .filter(|a| a.kind == AttributeKind::Quoted && !a.value.is_empty())
            .map_or_else(|| "default".to_string(), |a| a.value.clone());

        let children = self.doc.children(id);
        let has_fallback = children
            .iter()
            .any(|&c| crate::transform::jsx_child_has_content(self.doc, c));

        self.print(&format!(
            "${{{}({},$$slots[\"{}\"]",
            runtime::RENDER_SLOT,
            runtime::RESULT,
            escape_double_quotes(&name)
        ));
        if has_fallback {
            self.print(",");
            self.print(runtime::RENDER);
            self.print("`");
            for child in children {
                self.print_node(child);
            }
            self.print("`");
        }
        self.print(")}");
    }
}

/// A shorthand attribute whose braces only contained a comment.
fn is_comment_only(key: &str) -> bool {
    let trimmed = key.trim();
    trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with("/*")
}

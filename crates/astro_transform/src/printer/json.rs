//! Debug JSON output.
//!
//! Serializes the document tree to a JSON value for debugging and tooling:
//! `{type, name, value?, attributes[], directives[], children[], position?}`.
//! Positions are included only on request and carry a 1-based line/column
//! plus the 0-based byte offset.

use serde_json::{json, Map, Value};

use crate::ast::{Attribute, AttributeKind, Document, NodeId, NodeKind, Span};
use crate::diagnostic::byte_offset_to_line_column;

/// Serialize a document as a debug JSON string.
pub fn print_json(doc: &Document, source: &str, include_positions: bool) -> String {
    let value = document_to_value(doc, source, include_positions);
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

/// Serialize a document as a `serde_json::Value` tree.
pub fn document_to_value(doc: &Document, source: &str, include_positions: bool) -> Value {
    node_to_value(doc, doc.root, source, include_positions)
}

fn node_type(doc: &Document, id: NodeId) -> &'static str {
    let node = doc.node(id);
    match node.kind {
        NodeKind::Document => "root",
        NodeKind::Frontmatter => "frontmatter",
        NodeKind::Text => "text",
        NodeKind::Comment => "comment",
        NodeKind::Doctype => "doctype",
        NodeKind::Raw => "raw",
        NodeKind::Element => {
            if node.is_expression {
                "expression"
            } else if node.is_fragment {
                "fragment"
            } else if node.is_component {
                "component"
            } else if node.is_custom_element {
                "custom-element"
            } else {
                "element"
            }
        }
    }
}

/// Namespaced attributes (`client:load`, `set:html`, `transition:name`, …)
/// are reported separately from plain attributes.
fn is_directive(attr: &Attribute) -> bool {
    attr.namespace.is_some()
}

fn attribute_to_value(attr: &Attribute) -> Value {
    let kind = match attr.kind {
        AttributeKind::Quoted => "quoted",
        AttributeKind::Empty => "empty",
        AttributeKind::Expression => "expression",
        AttributeKind::Spread => "spread",
        AttributeKind::Shorthand => "shorthand",
        AttributeKind::TemplateLiteral => "template-literal",
    };
    json!({
        "kind": kind,
        "name": attr.key,
        "value": attr.value,
    })
}

fn position_to_value(span: Span, source: &str) -> Value {
    // The shared helper returns a 0-based column (the diagnostic-label
    // convention); the JSON position is 1-based for both line and column.
    let (line, column) = byte_offset_to_line_column(source, span.start as usize);
    json!({
        "line": line,
        "column": column + 1,
        "offset": span.start,
    })
}

fn node_to_value(doc: &Document, id: NodeId, source: &str, include_positions: bool) -> Value {
    let node = doc.node(id);
    let mut out = Map::new();
    out.insert("type".into(), Value::String(node_type(doc, id).to_string()));
    out.insert("name".into(), Value::String(node.tag.clone()));

    if matches!(
        node.kind,
        NodeKind::Text | NodeKind::Comment | NodeKind::Doctype | NodeKind::Raw | NodeKind::Frontmatter
    ) {
        out.insert("value".into(), Value::String(node.content.clone()));
    }

    let attributes: Vec<Value> = node
        .attributes
        .iter()
        .filter(|a| !is_directive(a))
        .map(attribute_to_value)
        .collect();
    let directives: Vec<Value> = node
        .attributes
        .iter()
        .filter(|a| is_directive(a))
        .map(attribute_to_value)
        .collect();
    out.insert("attributes".into(), Value::Array(attributes));
    out.insert("directives".into(), Value::Array(directives));

    let children: Vec<Value> = doc
        .children(id)
        .into_iter()
        .map(|c| node_to_value(doc, c, source, include_positions))
        .collect();
    out.insert("children".into(), Value::Array(children));

    if include_positions && !node.span.is_empty() {
        out.insert("position".into(), position_to_value(node.span, source));
    }

    Value::Object(out)
}

//! Compact-mode whitespace collapsing.
//!
//! Runs after all other transform steps. Interior whitespace runs collapse
//! to a single space (or a single newline when the run spans lines), except
//! inside raw-text elements and `is:raw` subtrees. Text adjacent to an
//! expression container is trimmed at that edge instead of collapsed, so
//! interpolations don't accumulate padding.

use crate::ast::{Document, NodeId, NodeKind};

/// Elements whose text content is significant and never collapsed.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "pre", "script", "style", "textarea", "listing", "xmp", "plaintext",
];

fn preserves_whitespace(doc: &Document, id: NodeId) -> bool {
    let node = doc.node(id);
    if RAW_TEXT_ELEMENTS.contains(&node.tag.as_str()) || node.has_attribute("is:raw") {
        return true;
    }
    doc.closest_ancestor(id, |n| {
        RAW_TEXT_ELEMENTS.contains(&n.tag.as_str()) || n.has_attribute("is:raw")
    })
    .is_some()
}

/// Collapse a whitespace run to one space, or one newline if it spans lines.
fn collapse_run(run: &str) -> char {
    if run.contains('\n') { '\n' } else { ' ' }
}

fn collapse_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
        } else {
            if !run.is_empty() {
                out.push(collapse_run(&run));
                run.clear();
            }
            out.push(c);
        }
    }
    if !run.is_empty() {
        out.push(collapse_run(&run));
    }
    out
}

/// Collapse whitespace in every eligible text node of the document.
pub fn compact(doc: &mut Document) {
    let mut ids = doc.descendants(doc.root);
    if let Some(head) = doc.head {
        ids.extend(doc.descendants(head));
    }

    for id in ids {
        let node = doc.node(id);
        if node.kind != NodeKind::Text {
            continue;
        }
        // Text inside an expression container is JavaScript, not markup.
        if node
            .parent
            .is_some_and(|p| doc.node(p).is_expression)
        {
            continue;
        }
        if preserves_whitespace(doc, id) {
            continue;
        }

        let mut collapsed = collapse_text(&doc.node(id).content);

        let prev_is_expression = doc
            .node(id)
            .prev_sibling
            .is_some_and(|s| doc.node(s).is_expression);
        let next_is_expression = doc
            .node(id)
            .next_sibling
            .is_some_and(|s| doc.node(s).is_expression);
        if prev_is_expression {
            collapsed = collapsed.trim_start().to_string();
        }
        if next_is_expression {
            collapsed = collapsed.trim_end().to_string();
        }

        if collapsed.is_empty() {
            doc.detach(id);
        } else {
            doc.node_mut(id).content = collapsed;
        }
    }
}

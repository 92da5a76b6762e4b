//! Scope marker injection for the markup side, plus `class`/`class:list`
//! merging.
//!
//! The CSS side of each strategy lives in [`crate::css_scoping`]; this module
//! applies the matching marker to every scopeable element in the tree.

use crate::ast::{Attribute, AttributeKind, Document, NodeId, NodeKind};
use crate::css_scoping::should_scope_element;
use crate::options::ScopedStyleStrategy;
use crate::printer::escape::escape_double_quotes;

/// Whether the scope marker applies to this node. Components participate:
/// the class (or marker attribute) is forwarded to them as a prop.
fn is_scopeable(doc: &Document, id: NodeId) -> bool {
    let node = doc.node(id);
    node.kind == NodeKind::Element
        && !node.is_expression
        && !node.is_fragment
        && node.tag != "slot"
        && (node.is_component || should_scope_element(&node.tag))
}

fn scope_targets(doc: &Document) -> Vec<NodeId> {
    let mut ids = doc.descendants(doc.root);
    if let Some(head) = doc.head {
        ids.extend(doc.descendants(head));
    }
    ids.into_iter().filter(|&id| is_scopeable(doc, id)).collect()
}

/// Inject the scope marker into every scopeable element, per strategy.
pub fn inject_scope_markers(doc: &mut Document, strategy: ScopedStyleStrategy, scope: &str) {
    for id in scope_targets(doc) {
        match strategy {
            ScopedStyleStrategy::Where => {
                doc.node_mut(id)
                    .attributes
                    .push(Attribute::quoted("data-astro-scope", scope));
            }
            ScopedStyleStrategy::Attribute => {
                doc.node_mut(id)
                    .attributes
                    .push(Attribute::empty(format!("data-astro-cid-{scope}")));
            }
            ScopedStyleStrategy::Class => {
                merge_class_marker(doc, id, &format!("astro-{scope}"));
            }
        }
    }
}

/// Merge a scope class into a node's `class` (or `class:list`) attribute,
/// honoring each attribute kind's merge rule. Plain elements that only carry
/// a spread attribute are skipped: the spread renderer injects the class at
/// print time so a spread-provided `class` is not clobbered.
fn merge_class_marker(doc: &mut Document, id: NodeId, marker: &str) {
    let has_class = doc.node(id).has_attribute("class");
    let has_class_list = doc.node(id).has_attribute("class:list");

    if has_class {
        let node = doc.node_mut(id);
        let attr = node.attribute_mut("class").unwrap_or_else(|| unreachable!());
        match attr.kind {
            AttributeKind::Quoted => {
                if attr.value.is_empty() {
                    attr.value = marker.to_string();
                } else {
                    attr.value = format!("{} {marker}", attr.value);
                }
            }
            AttributeKind::Empty => {
                attr.kind = AttributeKind::Quoted;
                attr.value = marker.to_string();
            }
            AttributeKind::Expression => {
                // The source expression gets its own parentheses: `??` cannot
                // sit unparenthesized next to `||`/`&&`, and a bare ternary
                // would bind the guard to its else branch only.
                attr.value = format!("(({}) ?? \"\") + \" {marker}\"", attr.value);
            }
            AttributeKind::Shorthand => {
                attr.kind = AttributeKind::Expression;
                attr.value = format!("(({}) ?? \"\") + \" {marker}\"", attr.key);
            }
            AttributeKind::TemplateLiteral => {
                attr.value = format!("{} {marker}", attr.value);
            }
            AttributeKind::Spread => {}
        }
        return;
    }

    if has_class_list {
        let node = doc.node_mut(id);
        let attr = node
            .attribute_mut("class:list")
            .unwrap_or_else(|| unreachable!());
        match attr.kind {
            AttributeKind::Expression => {
                attr.value = format!("[(({}) ?? \"\"), \"{marker}\"]", attr.value);
            }
            AttributeKind::Quoted => {
                attr.value = format!("{} {marker}", attr.value);
            }
            _ => {}
        }
        return;
    }

    let node = doc.node(id);
    let has_spread = node.attributes.iter().any(|a| a.kind == AttributeKind::Spread);
    if has_spread && node.is_plain_element() {
        return;
    }

    doc.node_mut(id)
        .attributes
        .push(Attribute::quoted("class", marker));
}

/// Fold `class` into `class:list` when both are present: static classes
/// become quoted string members, expression classes are inlined
/// parenthesized, and the redundant `class` attribute is removed.
pub fn merge_class_lists(doc: &mut Document) {
    let mut ids = doc.descendants(doc.root);
    if let Some(head) = doc.head {
        ids.extend(doc.descendants(head));
    }
    for id in ids {
        let node = doc.node(id);
        if node.kind != NodeKind::Element
            || !node.has_attribute("class")
            || !node.has_attribute("class:list")
        {
            continue;
        }

        let class = doc.node_mut(id).remove_attribute("class").unwrap_or_else(|| unreachable!());
        let member = match class.kind {
            AttributeKind::Quoted => format!("\"{}\"", escape_double_quotes(&class.value)),
            AttributeKind::TemplateLiteral => format!("`{}`", class.value),
            AttributeKind::Expression => format!("({})", class.value),
            AttributeKind::Empty | AttributeKind::Shorthand | AttributeKind::Spread => {
                "\"\"".to_string()
            }
        };

        let node = doc.node_mut(id);
        let list = node
            .attribute_mut("class:list")
            .unwrap_or_else(|| unreachable!());
        let list_value = match list.kind {
            AttributeKind::Quoted => format!("\"{}\"", escape_double_quotes(&list.value)),
            _ => format!("({})", list.value),
        };
        list.kind = AttributeKind::Expression;
        list.value = format!("[{member}, {list_value}]");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_with(doc: &mut Document, tag: &str, attrs: Vec<Attribute>) -> NodeId {
        let id = doc.new_element(tag);
        doc.node_mut(id).attributes = attrs;
        doc.append_child(doc.root, id);
        id
    }

    #[test]
    fn where_strategy_adds_scope_attribute() {
        let mut doc = Document::new();
        let div = element_with(&mut doc, "div", vec![]);
        inject_scope_markers(&mut doc, ScopedStyleStrategy::Where, "xxxxxx");

        let attr = doc.node(div).attribute("data-astro-scope").unwrap();
        assert_eq!(attr.kind, AttributeKind::Quoted);
        assert_eq!(attr.value, "xxxxxx");
    }

    #[test]
    fn attribute_strategy_adds_boolean_attribute() {
        let mut doc = Document::new();
        let div = element_with(&mut doc, "div", vec![]);
        inject_scope_markers(&mut doc, ScopedStyleStrategy::Attribute, "xxxxxx");

        let attr = doc.node(div).attribute("data-astro-cid-xxxxxx").unwrap();
        assert_eq!(attr.kind, AttributeKind::Empty);
    }

    #[test]
    fn class_strategy_appends_to_static_class() {
        let mut doc = Document::new();
        let div = element_with(&mut doc, "div", vec![Attribute::quoted("class", "a")]);
        inject_scope_markers(&mut doc, ScopedStyleStrategy::Class, "xxxxxx");

        assert_eq!(doc.node(div).attribute("class").unwrap().value, "a astro-xxxxxx");
    }

    #[test]
    fn class_strategy_guards_expression_class() {
        let mut doc = Document::new();
        let div = element_with(
            &mut doc,
            "div",
            vec![Attribute::expression("class", "cond ? 'a' : 'b'")],
        );
        inject_scope_markers(&mut doc, ScopedStyleStrategy::Class, "xxxxxx");

        // The whole ternary is parenthesized so the guard applies to its
        // result, not just the else branch.
        assert_eq!(
            doc.node(div).attribute("class").unwrap().value,
            "((cond ? 'a' : 'b') ?? \"\") + \" astro-xxxxxx\""
        );
    }

    #[test]
    fn class_strategy_parenthesizes_logical_expressions() {
        // `a || b ?? ""` is a SyntaxError; the source must be wrapped first.
        let mut doc = Document::new();
        let div = element_with(&mut doc, "div", vec![Attribute::expression("class", "a || b")]);
        inject_scope_markers(&mut doc, ScopedStyleStrategy::Class, "xxxxxx");

        assert_eq!(
            doc.node(div).attribute("class").unwrap().value,
            "((a || b) ?? \"\") + \" astro-xxxxxx\""
        );
    }

    #[test]
    fn class_list_merge_guards_logical_expressions() {
        let mut doc = Document::new();
        let div = element_with(
            &mut doc,
            "div",
            vec![Attribute::expression("class:list", "a || b")],
        );
        inject_scope_markers(&mut doc, ScopedStyleStrategy::Class, "xxxxxx");

        assert_eq!(
            doc.node(div).attribute("class:list").unwrap().value,
            "[((a || b) ?? \"\"), \"astro-xxxxxx\"]"
        );
    }

    #[test]
    fn class_strategy_expands_shorthand() {
        let mut doc = Document::new();
        let card = element_with(&mut doc, "Card", vec![Attribute::shorthand("class")]);
        inject_scope_markers(&mut doc, ScopedStyleStrategy::Class, "xxxxxx");

        let attr = doc.node(card).attribute("class").unwrap();
        assert_eq!(attr.kind, AttributeKind::Expression);
        assert_eq!(attr.value, "((class) ?? \"\") + \" astro-xxxxxx\"");
    }

    #[test]
    fn class_strategy_creates_class_when_absent() {
        let mut doc = Document::new();
        let div = element_with(&mut doc, "div", vec![]);
        inject_scope_markers(&mut doc, ScopedStyleStrategy::Class, "xxxxxx");

        assert_eq!(doc.node(div).attribute("class").unwrap().value, "astro-xxxxxx");
    }

    #[test]
    fn spread_only_plain_element_defers_to_printer() {
        let mut doc = Document::new();
        let div = element_with(&mut doc, "div", vec![Attribute::spread("rest")]);
        inject_scope_markers(&mut doc, ScopedStyleStrategy::Class, "xxxxxx");

        assert!(!doc.node(div).has_attribute("class"));
    }

    #[test]
    fn exempt_elements_are_never_marked() {
        let mut doc = Document::new();
        let meta = element_with(&mut doc, "meta", vec![]);
        let slot = element_with(&mut doc, "slot", vec![]);
        inject_scope_markers(&mut doc, ScopedStyleStrategy::Where, "xxxxxx");

        assert!(!doc.node(meta).has_attribute("data-astro-scope"));
        assert!(!doc.node(slot).has_attribute("data-astro-scope"));
    }

    #[test]
    fn class_folds_into_class_list() {
        let mut doc = Document::new();
        let div = element_with(
            &mut doc,
            "div",
            vec![
                Attribute::quoted("class", "a"),
                Attribute::expression("class:list", "[cond && 'b']"),
            ],
        );
        merge_class_lists(&mut doc);

        assert!(!doc.node(div).has_attribute("class"));
        let list = doc.node(div).attribute("class:list").unwrap();
        assert_eq!(list.value, "[\"a\", ([cond && 'b'])]");
    }

    #[test]
    fn expression_class_is_inlined_raw() {
        let mut doc = Document::new();
        let div = element_with(
            &mut doc,
            "div",
            vec![
                Attribute::expression("class", "base"),
                Attribute::expression("class:list", "extra"),
            ],
        );
        merge_class_lists(&mut doc);

        let list = doc.node(div).attribute("class:list").unwrap();
        assert_eq!(list.value, "[(base), (extra)]");
    }
}

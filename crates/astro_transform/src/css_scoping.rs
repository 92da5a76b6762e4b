//! Scoped-style rewriting.
//!
//! Rewrites the selectors of a component's `<style>` text so they only match
//! elements carrying the component's scope marker. lightningcss parses the
//! stylesheet and a selector visitor injects the marker; everything that is
//! not a selector (declarations, at-rule preludes, keyframe steps) passes
//! through untouched.
//!
//! CSS-modules mode is enabled at parse time with an identity pattern so
//! `:global()` parses as a first-class `PseudoClass::Global { selector }`
//! node instead of an opaque custom function. No class renaming occurs.

use std::convert::Infallible;

use cow_utils::CowUtils;
use lightningcss::css_modules;
use lightningcss::printer::PrinterOptions;
use lightningcss::selector::{Combinator, Component, PseudoClass, Selector, SelectorList};
use lightningcss::stylesheet::{ParserFlags, ParserOptions, StyleSheet};
use lightningcss::values::ident::Ident;
use lightningcss::values::string::CowArcStr;
use lightningcss::visit_types;
use lightningcss::visitor::{Visit, VisitTypes, Visitor};
use smallvec::smallvec;

use crate::options::ScopedStyleStrategy;

/// Rewrite every selector in `css` to carry the scope marker for `scope`.
///
/// Malformed CSS is returned unchanged; the caller reports a diagnostic and
/// ships the original text.
pub fn scope_css(css: &str, scope: &str, strategy: ScopedStyleStrategy) -> Option<String> {
    let options = ParserOptions {
        flags: ParserFlags::NESTING,
        error_recovery: true,
        css_modules: Some(css_modules::Config {
            // Identity pattern: [local] means names are output unchanged.
            pattern: css_modules::Pattern {
                segments: smallvec![css_modules::Segment::Local],
            },
            animation: false,
            grid: false,
            custom_idents: false,
            container: false,
            dashed_idents: false,
            pure: false,
        }),
        ..ParserOptions::default()
    };

    let Ok(mut stylesheet) = StyleSheet::parse(css, options) else {
        return None;
    };

    let mut rewriter = ScopeRewriter { scope, strategy };
    let _ = stylesheet.visit(&mut rewriter);

    let Ok(result) = stylesheet.to_css(PrinterOptions::default()) else {
        return None;
    };

    // The `:where` strategy serializes through a placeholder class (the
    // attribute-selector component cannot be built directly, only parsed);
    // swap it for the real marker now. The placeholder embeds the scope id,
    // so it cannot collide with authored class names.
    if strategy == ScopedStyleStrategy::Where {
        let placeholder = format!(":where(.{})", where_placeholder(scope));
        let marker = format!(":where([data-astro-scope=\"{scope}\"])");
        return Some(result.code.cow_replace(&*placeholder, &marker).into_owned());
    }
    Some(result.code)
}

fn where_placeholder(scope: &str) -> String {
    format!("astro-mk-{scope}")
}

struct ScopeRewriter<'a> {
    scope: &'a str,
    strategy: ScopedStyleStrategy,
}

impl<'i> Visitor<'i> for ScopeRewriter<'_> {
    type Error = Infallible;

    fn visit_types(&self) -> VisitTypes {
        visit_types!(SELECTORS)
    }

    fn visit_selector_list(&mut self, selectors: &mut SelectorList<'i>) -> Result<(), Self::Error> {
        let rewritten: Vec<Selector<'i>> = selectors
            .0
            .iter()
            .flat_map(|selector| self.scope_selector(selector))
            .collect();
        selectors.0 = rewritten.into();
        Ok(())
    }
}

impl ScopeRewriter<'_> {
    /// The marker component injected next to each scoped compound.
    fn marker<'i>(&self) -> Component<'i> {
        match self.strategy {
            ScopedStyleStrategy::Where => {
                // Placeholder class wrapped in :where(); replaced with the
                // attribute form after printing.
                let class = Component::Class(Ident(where_placeholder(self.scope).into()));
                let inner: Selector<'i> = vec![class].into();
                Component::Where(Box::new([inner]))
            }
            ScopedStyleStrategy::Class => {
                Component::Class(Ident(format!("astro-{}", self.scope).into()))
            }
            ScopedStyleStrategy::Attribute => {
                let attr_name: CowArcStr<'i> = format!("data-astro-cid-{}", self.scope).into();
                Component::AttributeInNoNamespaceExists {
                    local_name: Ident(attr_name.clone()),
                    local_name_lower: Ident(attr_name),
                }
            }
        }
    }

    /// Scope one full selector: split into compounds, scope each, rejoin.
    fn scope_selector<'i>(&self, selector: &Selector<'i>) -> Vec<Selector<'i>> {
        let compounds = split_into_compounds(selector);
        let merged = merge_pseudo_element_compounds(&compounds);

        let mut components: Vec<Component<'i>> = Vec::new();
        for (i, (combinator, compound)) in merged.iter().enumerate() {
            if i > 0
                && let Some(comb) = combinator
            {
                components.push(Component::Combinator(*comb));
            }
            components.extend(self.scope_compound(compound));
        }

        if components.is_empty() {
            return vec![];
        }
        vec![components.into()]
    }

    fn scope_compound<'i>(&self, compound: &[Component<'i>]) -> Vec<Component<'i>> {
        if compound.is_empty() {
            return vec![];
        }

        if compound.iter().any(|c| matches!(c, Component::Nesting)) {
            return self.scope_nesting_compound(compound);
        }

        if compound.iter().any(is_global_pseudo) {
            return self.unwrap_global_compound(compound);
        }

        // html/body/:root are exempt: scoping them would detach the rule
        // from the real document root.
        if compound.len() == 1 && matches!(&compound[0], Component::Root) {
            return compound.to_vec();
        }
        if is_body_or_html(compound) {
            return compound.to_vec();
        }

        self.inject_marker(compound)
    }

    /// Strip `:global()` wrappers, copying their contents through verbatim.
    /// Mixed compounds like `.class:global(.bar)` still scope the non-global
    /// parts.
    fn unwrap_global_compound<'i>(&self, compound: &[Component<'i>]) -> Vec<Component<'i>> {
        let mut result = Vec::new();
        let mut has_non_global = false;

        for component in compound {
            if let Component::NonTSPseudoClass(PseudoClass::Global { selector }) = component {
                result.extend(flatten_selector(selector));
                continue;
            }
            has_non_global = true;
            result.push(component.clone());
        }

        if is_body_or_html(&result) {
            return result;
        }
        if has_non_global {
            return self.inject_marker(&result);
        }
        result
    }

    /// Compounds containing `&` inherit the parent rule's scoping; only the
    /// bare `&::after` shape needs its own marker (the pseudo-element has no
    /// carrier otherwise).
    fn scope_nesting_compound<'i>(&self, compound: &[Component<'i>]) -> Vec<Component<'i>> {
        if compound.len() == 1 && matches!(&compound[0], Component::Nesting) {
            return compound.to_vec();
        }

        let has_pseudo_element = compound.iter().any(is_pseudo_element);
        let has_real_selector = compound.iter().any(is_real_selector);

        if has_pseudo_element && !has_real_selector {
            let mut result = Vec::new();
            let mut marked = false;
            for c in compound {
                if is_pseudo_element(c) && !marked {
                    result.push(self.marker());
                    marked = true;
                }
                result.push(c.clone());
            }
            return result;
        }

        compound.to_vec()
    }

    /// Inject the marker into a plain compound: after the last simple
    /// selector of the elemental prefix, before attribute selectors and
    /// pseudo-elements, at the front when only pseudos are present.
    fn inject_marker<'i>(&self, compound: &[Component<'i>]) -> Vec<Component<'i>> {
        let marker = self.marker();
        let mut result = Vec::new();
        let mut marked = false;

        let only_pseudo = compound
            .iter()
            .all(|c| is_pseudo_class(c) || is_pseudo_element(c));

        for (i, component) in compound.iter().enumerate() {
            match component {
                Component::ExplicitUniversalType => {
                    // `*` is replaced by the marker outright.
                    result.push(marker.clone());
                    marked = true;
                }
                Component::LocalName(_) | Component::Class(_) | Component::ID(_) => {
                    result.push(component.clone());
                    if !marked {
                        result.push(marker.clone());
                        marked = true;
                    }
                }
                Component::AttributeInNoNamespaceExists { .. }
                | Component::AttributeInNoNamespace { .. }
                | Component::AttributeOther(_)
                | Component::PseudoElement(_) => {
                    if !marked {
                        result.push(marker.clone());
                        marked = true;
                    }
                    result.push(component.clone());
                }
                Component::NonTSPseudoClass(pseudo) => {
                    if let PseudoClass::Global { selector } = pseudo {
                        result.extend(flatten_selector(selector));
                        marked = true;
                        continue;
                    }
                    if only_pseudo && i == 0 && !marked {
                        result.push(marker.clone());
                        marked = true;
                    }
                    result.push(component.clone());
                }
                Component::Root => {
                    result.push(component.clone());
                    marked = true;
                }
                _ => {
                    if only_pseudo && i == 0 && !marked {
                        result.push(marker.clone());
                        marked = true;
                    }
                    result.push(component.clone());
                }
            }
        }

        if !marked {
            result.push(marker);
        }
        result
    }
}

/// Split a selector into `(combinator, compound)` pairs in parse order.
///
/// The raw component slice is stored in match order (rightmost compound
/// first) with intra-compound components in parse order, so the compound
/// order is reversed while each compound's interior is kept as-is — the
/// same approach lightningcss's own serializer takes.
fn split_into_compounds<'i>(
    selector: &Selector<'i>,
) -> Vec<(Option<Combinator>, Vec<Component<'i>>)> {
    let raw_slice = selector.iter_raw_match_order().as_slice();
    let mut combinators = selector
        .iter_raw_match_order()
        .rev()
        .filter_map(|x| x.as_combinator());

    let compound_slices: Vec<&[Component<'i>]> =
        raw_slice.split(|x| x.is_combinator()).rev().collect();

    let mut result = Vec::with_capacity(compound_slices.len());
    for (i, compound) in compound_slices.iter().enumerate() {
        let combinator = if i == 0 { None } else { combinators.next() };
        result.push((combinator, compound.to_vec()));
    }
    result
}

/// `h3::before` parses as two "compounds" joined by the internal
/// `Combinator::PseudoElement` marker; fold the pseudo-element back into its
/// preceding compound so scoping treats them as one unit.
fn merge_pseudo_element_compounds<'i>(
    compounds: &[(Option<Combinator>, Vec<Component<'i>>)],
) -> Vec<(Option<Combinator>, Vec<Component<'i>>)> {
    let mut result: Vec<(Option<Combinator>, Vec<Component<'i>>)> = Vec::new();
    for (combinator, compound) in compounds {
        if matches!(combinator, Some(Combinator::PseudoElement))
            && let Some(last) = result.last_mut()
        {
            last.1.extend(compound.iter().cloned());
        } else {
            result.push((*combinator, compound.clone()));
        }
    }
    result
}

/// Flatten a parsed selector (e.g. the interior of `:global()`) back into a
/// parse-order component list, combinators included.
fn flatten_selector<'i>(selector: &Selector<'i>) -> Vec<Component<'i>> {
    let raw = selector.iter_raw_match_order().as_slice();
    let combinators: Vec<Combinator> = selector
        .iter_raw_match_order()
        .rev()
        .filter_map(|c| c.as_combinator())
        .collect();
    let compound_slices: Vec<&[Component<'i>]> =
        raw.split(|c| c.is_combinator()).rev().collect();

    let mut result = Vec::new();
    for (i, compound) in compound_slices.iter().enumerate() {
        if i > 0
            && let Some(comb) = combinators.get(i - 1)
        {
            result.push(Component::Combinator(*comb));
        }
        result.extend(compound.iter().cloned());
    }
    result
}

fn is_global_pseudo(component: &Component<'_>) -> bool {
    matches!(
        component,
        Component::NonTSPseudoClass(PseudoClass::Global { .. })
    )
}

fn is_body_or_html(compound: &[Component<'_>]) -> bool {
    compound.iter().any(|c| match c {
        Component::LocalName(local) => {
            let name = local.name.0.as_ref();
            name == "body" || name == "html"
        }
        _ => false,
    })
}

fn is_pseudo_element(component: &Component<'_>) -> bool {
    matches!(component, Component::PseudoElement(_))
}

fn is_real_selector(component: &Component<'_>) -> bool {
    matches!(
        component,
        Component::LocalName(_)
            | Component::Class(_)
            | Component::ID(_)
            | Component::AttributeInNoNamespaceExists { .. }
            | Component::AttributeInNoNamespace { .. }
            | Component::AttributeOther(_)
    )
}

fn is_pseudo_class(component: &Component<'_>) -> bool {
    matches!(
        component,
        Component::NonTSPseudoClass(_)
            | Component::Negation(_)
            | Component::Root
            | Component::Empty
            | Component::Scope
            | Component::Nth(_)
            | Component::NthOf(_)
            | Component::Is(_)
            | Component::Where(_)
            | Component::Has(_)
    )
}

/// Elements that never receive a scope marker in the HTML.
pub const NEVER_SCOPED_ELEMENTS: &[&str] = &[
    "Fragment", "base", "font", "frame", "frameset", "head", "link", "meta", "noframes",
    "noscript", "script", "style", "slot", "title",
];

pub fn should_scope_element(name: &str) -> bool {
    !NEVER_SCOPED_ELEMENTS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(source: &str) -> String {
        scope_css(source, "xxxxxx", ScopedStyleStrategy::Where).unwrap()
    }

    fn scope_class(source: &str) -> String {
        scope_css(source, "xxxxxx", ScopedStyleStrategy::Class).unwrap()
    }

    fn scope_attribute(source: &str) -> String {
        scope_css(source, "xxxxxx", ScopedStyleStrategy::Attribute).unwrap()
    }

    const W: &str = ":where([data-astro-scope=\"xxxxxx\"])";

    // lightningcss pretty-prints output (spaces around combinators,
    // newlines, indentation) and normalizes values: `::before` → `:before`,
    // attribute values quoted, `min-width: 640px` → `width >= 640px`,
    // named colors shortened, `rotate(0deg)` → `rotate(0)`.

    #[test]
    fn test_class() {
        assert_eq!(scope(".class{}"), format!(".class{W} {{\n}}\n"));
    }

    #[test]
    fn test_id() {
        assert_eq!(scope("#id{}"), format!("#id{W} {{\n}}\n"));
    }

    #[test]
    fn test_element() {
        assert_eq!(scope("h1{}"), format!("h1{W} {{\n}}\n"));
    }

    #[test]
    fn test_adjacent_sibling() {
        assert_eq!(
            scope(".class+.class{}"),
            format!(".class{W} + .class{W} {{\n}}\n")
        );
    }

    #[test]
    fn test_selector_list() {
        assert_eq!(
            scope(".a,.b{}"),
            format!(".a{W}, .b{W} {{\n}}\n")
        );
    }

    #[test]
    fn test_descendant_universal() {
        assert_eq!(scope(".class *{}"), format!(".class{W} {W} {{\n}}\n"));
    }

    #[test]
    fn test_attr() {
        assert_eq!(
            scope("a[aria-current=page]{}"),
            format!("a{W}[aria-current=\"page\"] {{\n}}\n")
        );
    }

    #[test]
    fn test_bare_attr_gets_anchor() {
        assert_eq!(
            scope("[aria-visible],[aria-hidden]{}"),
            format!("{W}[aria-visible], {W}[aria-hidden] {{\n}}\n")
        );
    }

    #[test]
    fn test_universal_pseudo_state() {
        assert_eq!(scope("*:hover{}"), format!("{W}:hover {{\n}}\n"));
    }

    #[test]
    fn test_element_pseudo_state() {
        assert_eq!(
            scope(".class button:focus{}"),
            format!(".class{W} button{W}:focus {{\n}}\n")
        );
    }

    #[test]
    fn test_element_pseudo_element() {
        assert_eq!(
            scope(".class h3::before{}"),
            format!(".class{W} h3{W}:before {{\n}}\n")
        );
    }

    #[test]
    fn test_media_query() {
        assert_eq!(
            scope("@media screen and (min-width:640px){.class{}}"),
            format!("@media screen and (width >= 640px) {{\n  .class{W} {{\n  }}\n}}\n")
        );
    }

    #[test]
    fn test_global_children() {
        assert_eq!(
            scope(".class :global(ul li){}"),
            format!(".class{W} ul li {{\n}}\n")
        );
    }

    #[test]
    fn test_global_with_scoped_children() {
        assert_eq!(
            scope(":global(section) .class{}"),
            format!("section .class{W} {{\n}}\n")
        );
    }

    #[test]
    fn test_global_nested_parens() {
        assert_eq!(
            scope(".class :global(.nav:not(.is-active)){}"),
            format!(".class{W} .nav:not(.is-active) {{\n}}\n")
        );
    }

    #[test]
    fn test_global_chaining_global() {
        assert_eq!(scope(":global(.foo):global(.bar){}"), ".foo.bar {\n}\n");
    }

    #[test]
    fn test_class_chained_global() {
        assert_eq!(
            scope(".class:global(.bar){}"),
            format!(".class{W}.bar {{\n}}\n")
        );
    }

    #[test]
    fn test_global_is_not_idempotent() {
        // The wrapper is consumed, so a second pass scopes what the first
        // pass passed through.
        let once = scope(".x :global(ul){}");
        assert_eq!(once, format!(".x{W} ul {{\n}}\n"));
        let twice = scope(&once);
        assert_eq!(twice, format!(".x{W}{W} ul{W} {{\n}}\n"));
    }

    #[test]
    fn test_body_descendant_scoped() {
        assert_eq!(scope("body h1{}"), format!("body h1{W} {{\n}}\n"));
    }

    #[test]
    fn test_body_class_exempt() {
        assert_eq!(scope("body.theme-dark{}"), "body.theme-dark {\n}\n");
    }

    #[test]
    fn test_html_and_body_exempt() {
        assert_eq!(scope("html,body{}"), "html, body {\n}\n");
    }

    #[test]
    fn test_root_exempt() {
        assert_eq!(scope(":root{}"), ":root {\n}\n");
    }

    #[test]
    fn test_chained_not() {
        assert_eq!(
            scope(".class:not(.is-active):not(.is-disabled){}"),
            format!(".class{W}:not(.is-active):not(.is-disabled) {{\n}}\n")
        );
    }

    #[test]
    fn test_keyframes_pass_through() {
        assert_eq!(
            scope("@keyframes shuffle{from{transform:rotate(0deg);}to{transform:rotate(360deg);}}"),
            "@keyframes shuffle {\n  from {\n    transform: rotate(0);\n  }\n\n  to {\n    transform: rotate(360deg);\n  }\n}\n"
        );
    }

    #[test]
    fn test_keyframes_with_sibling_rules() {
        assert_eq!(
            scope("@keyframes s{0%{color:blue}100%{color:red}} h1{}"),
            format!(
                "@keyframes s {{\n  0% {{\n    color: #00f;\n  }}\n\n  100% {{\n    color: red;\n  }}\n}}\n\nh1{W} {{\n}}\n"
            )
        );
    }

    #[test]
    fn test_class_strategy() {
        assert_eq!(scope_class(".class{}"), ".class.astro-xxxxxx {\n}\n");
    }

    #[test]
    fn test_attribute_strategy() {
        assert_eq!(
            scope_attribute(".class{}"),
            ".class[data-astro-cid-xxxxxx] {\n}\n"
        );
    }

    #[test]
    fn test_nesting_combinator() {
        assert_eq!(
            scope("div{& span{color:blue}}"),
            format!("div{W} {{\n  & span{W} {{\n    color: #00f;\n  }}\n}}\n")
        );
    }

    #[test]
    fn test_nesting_modifier_unscoped() {
        assert_eq!(
            scope(".header{background-color:white;&.dark{background-color:blue}}"),
            format!(
                ".header{W} {{\n  background-color: #fff;\n\n  &.dark {{\n    background-color: #00f;\n  }}\n}}\n"
            )
        );
    }

    #[test]
    fn test_nested_only_pseudo_element() {
        assert_eq!(
            scope(".class{& .other_class{&::after{}}}"),
            format!(
                ".class{W} {{\n  & .other_class{W} {{\n    &{W}:after {{\n    }}\n  }}\n}}\n"
            )
        );
    }

    #[test]
    fn test_only_pseudo_element() {
        assert_eq!(
            scope(".class>::before{}"),
            format!(".class{W} > {W}:before {{\n}}\n")
        );
    }

    #[test]
    fn test_global_compound_with_not() {
        // `:global(html:not(.theme-dark))` must keep `html` before
        // `:not(.theme-dark)`; a naive reverse would emit `:not(...)html`.
        assert_eq!(
            scope(":global(html:not(.theme-dark)) .icon.light{}"),
            format!("html:not(.theme-dark) .icon{W}.light {{\n}}\n")
        );
    }

    #[test]
    fn test_never_scoped_elements() {
        assert!(!should_scope_element("script"));
        assert!(!should_scope_element("Fragment"));
        assert!(should_scope_element("div"));
    }
}

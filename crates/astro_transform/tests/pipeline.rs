//! End-to-end pipeline tests: hand-built document trees run through the
//! full transform + print pass, asserting on the generated module text and
//! the result aggregates.

use astro_transform::{
    transform, Attribute, AttributeKind, CompileError, Document, DiagnosticCode, NodeId,
    ScopedStyleStrategy, SourcemapOption, TransformOptions,
};

fn options() -> TransformOptions {
    TransformOptions::new().with_scope("XXXXXX")
}

fn style_with(doc: &mut Document, css: &str) -> NodeId {
    let style = doc.new_element("style");
    let text = doc.new_text(css);
    doc.append_child(doc.root, style);
    doc.append_child(style, text);
    style
}

fn div_with_class(doc: &mut Document, class: &str, text: &str) -> NodeId {
    let div = doc.new_element("div");
    doc.node_mut(div).attributes = vec![Attribute::quoted("class", class)];
    doc.append_child(doc.root, div);
    let t = doc.new_text(text);
    doc.append_child(div, t);
    div
}

#[test]
fn scoped_style_where_strategy() {
    let mut doc = Document::new();
    style_with(&mut doc, ".a{color:red}");
    div_with_class(&mut doc, "a", "x");

    let result = transform(&mut doc, "", &options()).unwrap();

    assert_eq!(result.css.len(), 1);
    assert!(result.css[0].contains(".a:where([data-astro-scope=\"XXXXXX\"])"));
    assert!(result
        .code
        .contains("<div class=\"a\" data-astro-scope=\"XXXXXX\">x</div>"));
    // The hoisted style leaves no tag behind.
    assert!(!result.code.contains("<style"));
    // One CSS import per extracted style.
    assert!(result
        .code
        .contains("import \"<stdin>?astro&type=style&index=0&lang.css\";"));
}

#[test]
fn scoped_style_class_strategy() {
    let mut doc = Document::new();
    style_with(&mut doc, ".a{color:red}");
    div_with_class(&mut doc, "a", "x");

    let opts = options().with_scoped_style_strategy(ScopedStyleStrategy::Class);
    let result = transform(&mut doc, "", &opts).unwrap();

    assert!(result.css[0].contains(".a.astro-XXXXXX"));
    assert!(result.code.contains("<div class=\"a astro-XXXXXX\">x</div>"));
}

#[test]
fn expression_class_merge_stays_valid_javascript() {
    let mut doc = Document::new();
    style_with(&mut doc, ".a{color:red}");
    let div = doc.new_element("div");
    doc.node_mut(div).attributes = vec![Attribute::expression("class", "a || b")];
    doc.append_child(doc.root, div);

    let opts = options().with_scoped_style_strategy(ScopedStyleStrategy::Class);
    let result = transform(&mut doc, "", &opts).unwrap();

    // `a || b ?? ""` would be rejected by any JS parser; the source
    // expression keeps its own parentheses.
    assert!(result.code.contains("((a || b) ?? \"\") + \" astro-XXXXXX\""));
    assert!(!result.code.contains("a || b ?? "));
}

#[test]
fn component_children_partition_into_slots() {
    let mut doc = Document::new();
    let card = doc.new_element("Card");
    doc.append_child(doc.root, card);

    let plain = doc.new_element("div");
    doc.append_child(card, plain);
    let hi = doc.new_text("hi");
    doc.append_child(plain, hi);

    let named = doc.new_element("div");
    doc.node_mut(named).attributes = vec![Attribute::quoted("slot", "named")];
    doc.append_child(card, named);
    let x = doc.new_text("x");
    doc.append_child(named, x);

    let result = transform(&mut doc, "", &options()).unwrap();

    assert!(result.code.contains("$$renderComponent($$result,\"Card\",Card,"));
    assert!(result.code.contains("\"default\": () => $$render`"));
    assert!(result.code.contains("\"named\": () => $$render`"));
    // The slot attribute itself is consumed by the bucket key.
    assert!(!result.code.contains("slot=\"named\""));
    assert!(result.code.contains("<div>x</div>"));
}

#[test]
fn whitespace_only_default_slot_is_suppressed() {
    let mut doc = Document::new();
    let layout = doc.new_element("Layout");
    doc.append_child(doc.root, layout);

    let ws = doc.new_text("\n  ");
    doc.append_child(layout, ws);
    let named = doc.new_element("p");
    doc.node_mut(named).attributes = vec![Attribute::quoted("slot", "header")];
    doc.append_child(layout, named);

    let result = transform(&mut doc, "", &options()).unwrap();
    assert!(result.code.contains("\"header\": () => $$render`"));
    assert!(!result.code.contains("\"default\""));
}

#[test]
fn hoisted_script_is_removed_from_markup() {
    let mut doc = Document::new();
    let script = doc.new_element("script");
    doc.node_mut(script).attributes = vec![Attribute::empty("hoist")];
    doc.append_child(doc.root, script);
    let code = doc.new_text("console.log(1)");
    doc.append_child(script, code);
    div_with_class(&mut doc, "a", "x");

    let result = transform(&mut doc, "", &options()).unwrap();

    assert_eq!(result.scripts.len(), 1);
    assert_eq!(result.scripts[0].code.as_deref(), Some("console.log(1)"));
    assert!(!result.code.contains("<script"));
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::DeprecatedHoistAttribute));
}

#[test]
fn unresolvable_client_only_component_is_fatal() {
    let mut doc = Document::new();
    let counter = doc.new_element("Counter");
    doc.node_mut(counter).attributes = vec![Attribute::quoted("client:only", "preact")];
    doc.append_child(doc.root, counter);

    let err = transform(&mut doc, "", &options()).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnresolvedClientOnly {
            component: "Counter".to_string()
        }
    );
    assert!(err.to_string().contains("Counter"));
}

#[test]
fn client_directive_on_plain_element_is_a_warning() {
    let mut doc = Document::new();
    let div = doc.new_element("div");
    doc.node_mut(div).attributes = vec![Attribute::quoted("client:only", "preact")];
    doc.append_child(doc.root, div);

    let result = transform(&mut doc, "", &options()).unwrap();
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::ClientDirectiveOnElement));
}

#[test]
fn hydrated_component_gets_reference_attributes() {
    let source = "import Counter from './Counter.jsx';\n";
    let mut doc = Document::new();
    let fm = doc.new_frontmatter(source);
    doc.append_child(doc.root, fm);
    let counter = doc.new_element("Counter");
    doc.node_mut(counter).attributes = vec![Attribute::quoted("client:load", "")];
    doc.append_child(doc.root, counter);

    let result = transform(&mut doc, source, &options()).unwrap();

    assert_eq!(result.hydrated_components.len(), 1);
    assert_eq!(result.hydrated_components[0].specifier, "./Counter.jsx");
    assert_eq!(result.hydration_directives, vec!["load".to_string()]);
    assert!(result.code.contains("\"client:component-hydration\":\"load\""));
    assert!(result
        .code
        .contains("\"client:component-path\":($$metadata.resolvePath(\"./Counter.jsx\"))"));
    assert!(result.code.contains("\"client:component-export\":\"default\""));
    assert!(result.code.contains("hydratedComponents: [Counter]"));
}

#[test]
fn prelude_is_emitted_exactly_once() {
    let mut doc = Document::new();
    div_with_class(&mut doc, "a", "x");
    div_with_class(&mut doc, "b", "y");

    let result = transform(&mut doc, "", &options()).unwrap();

    assert_eq!(
        result
            .code
            .matches("from \"astro/runtime/server/index.js\";")
            .count(),
        1
    );
    assert_eq!(result.code.matches("= $$createComponent(").count(), 1);
    assert_eq!(result.code.matches("export default $$Component;").count(), 1);
}

#[test]
fn void_element_children_are_never_rendered() {
    let mut doc = Document::new();
    let br = doc.new_element("br");
    doc.append_child(doc.root, br);
    let stray = doc.new_text("never");
    doc.append_child(br, stray);

    let result = transform(&mut doc, "", &options()).unwrap();
    assert!(result.code.contains("<br>"));
    assert!(!result.code.contains("never"));
    assert!(!result.code.contains("</br>"));
}

#[test]
fn explicit_head_renders_at_close() {
    let mut doc = Document::new();
    let html = doc.new_element("html");
    doc.append_child(doc.root, html);
    let head = doc.new_element("head");
    doc.append_child(html, head);
    let title = doc.new_element("title");
    doc.append_child(head, title);
    let t = doc.new_text("hi");
    doc.append_child(title, t);
    let body = doc.new_element("body");
    doc.append_child(html, body);
    let h1 = doc.new_element("h1");
    doc.append_child(body, h1);

    let result = transform(&mut doc, "", &options()).unwrap();

    assert!(result.contains_head);
    assert!(result.code.contains("$$renderHead($$result)}</head>"));
    assert!(!result.code.contains("${$$maybeRenderHead"));
}

#[test]
fn first_body_element_triggers_maybe_render_head() {
    let mut doc = Document::new();
    div_with_class(&mut doc, "a", "x");

    let result = transform(&mut doc, "", &options()).unwrap();
    assert!(result
        .code
        .contains("${$$maybeRenderHead($$result)}<div class=\"a\">x</div>"));
    assert_eq!(result.code.matches("$$maybeRenderHead").count(), 2);
}

#[test]
fn define_vars_binds_styles_to_elements() {
    let mut doc = Document::new();
    let style = style_with(&mut doc, "div{color:var(--c)}");
    doc.node_mut(style)
        .attributes
        .push(Attribute::expression("define:vars", "{ c: color }"));
    div_with_class(&mut doc, "a", "x");

    let result = transform(&mut doc, "", &options()).unwrap();

    assert!(result
        .code
        .contains("const $$definedVars = $$defineStyleVars(["));
    assert!(result.code.contains("$$addAttribute($$definedVars, \"style\")"));
}

#[test]
fn external_sourcemap_is_populated() {
    let mut doc = Document::new();
    div_with_class(&mut doc, "a", "x");

    let opts = options().with_sourcemap(SourcemapOption::External);
    let result = transform(&mut doc, "<div class=\"a\">x</div>", &opts).unwrap();

    assert!(!result.map.is_empty());
    assert!(result.map.contains("\"mappings\""));
    assert!(!result.code.contains("sourceMappingURL"));
}

#[test]
fn frontmatter_body_lands_inside_the_component() {
    let source = "const greeting = \"hello\";\n";
    let mut doc = Document::new();
    let fm = doc.new_frontmatter(source);
    doc.append_child(doc.root, fm);
    let div = doc.new_element("div");
    doc.append_child(doc.root, div);
    let expr = doc.new_expression();
    let chunk = doc.new_text("greeting");
    doc.append_child(expr, chunk);
    doc.append_child(div, expr);

    let result = transform(&mut doc, source, &options()).unwrap();

    let wrapper_at = result.code.find("= $$createComponent(").unwrap();
    let body_at = result.code.find("const greeting").unwrap();
    assert!(body_at > wrapper_at);
    assert!(result.code.contains("${greeting}"));
}

#[test]
fn set_html_on_element_uses_unescape() {
    let mut doc = Document::new();
    let div = doc.new_element("div");
    doc.node_mut(div).attributes = vec![Attribute::expression("set:html", "content")];
    doc.append_child(doc.root, div);

    let result = transform(&mut doc, "", &options()).unwrap();
    assert!(result.code.contains("${$$unescapeHTML(content)}"));
}

#[test]
fn compact_mode_collapses_interelement_whitespace() {
    let mut doc = Document::new();
    let ul = doc.new_element("ul");
    doc.append_child(doc.root, ul);
    let a = doc.new_element("li");
    doc.append_child(ul, a);
    let ws = doc.new_text("\n    ");
    doc.append_child(ul, ws);
    let b = doc.new_element("li");
    doc.append_child(ul, b);

    let result = transform(&mut doc, "", &options().with_compact(true)).unwrap();
    assert!(result.code.contains("</li>\n<li>"));
}

#[test]
fn transition_directive_marks_propagation() {
    let mut doc = Document::new();
    let div = doc.new_element("div");
    doc.node_mut(div).attributes = vec![Attribute::quoted("transition:name", "hero")];
    doc.append_child(doc.root, div);

    let result = transform(&mut doc, "", &options()).unwrap();

    assert!(result.propagation);
    assert!(result
        .code
        .contains("import \"astro/components/viewtransitions.css\";"));
    assert!(result.code.contains("$$renderTransition($$result,"));
    assert!(result.code.contains(", \"self\");"));
}

#[test]
fn spread_attributes_go_through_the_runtime() {
    let mut doc = Document::new();
    let div = doc.new_element("div");
    doc.node_mut(div).attributes = vec![Attribute::spread("rest")];
    doc.append_child(doc.root, div);

    let result = transform(&mut doc, "", &options()).unwrap();
    assert!(result.code.contains("${$$spreadAttributes(rest)}"));
}

#[test]
fn spread_only_element_under_class_strategy_injects_scope_class() {
    let mut doc = Document::new();
    style_with(&mut doc, "div{color:red}");
    let div = doc.new_element("div");
    doc.node_mut(div).attributes = vec![Attribute::spread("rest")];
    doc.append_child(doc.root, div);

    let opts = options().with_scoped_style_strategy(ScopedStyleStrategy::Class);
    let result = transform(&mut doc, "", &opts).unwrap();
    assert!(result
        .code
        .contains("${$$spreadAttributes(rest, undefined, { class: \"astro-XXXXXX\" })}"));
}

#[test]
fn slot_element_renders_with_fallback() {
    let mut doc = Document::new();
    let slot = doc.new_element("slot");
    doc.append_child(doc.root, slot);
    let fallback = doc.new_text("fallback");
    doc.append_child(slot, fallback);

    let result = transform(&mut doc, "", &options()).unwrap();
    assert!(result
        .code
        .contains("${$$renderSlot($$result,$$slots[\"default\"],$$render`fallback`)}"));
}

#[test]
fn use_of_astro_global_creates_the_binding() {
    let source = "const url = Astro.url;\n";
    let mut doc = Document::new();
    let fm = doc.new_frontmatter(source);
    doc.append_child(doc.root, fm);

    let result = transform(&mut doc, source, &options()).unwrap();

    assert!(result.code.contains("const $$Astro = $$createAstro("));
    assert!(result
        .code
        .contains("const Astro = $$result.createAstro($$props, $$slots);"));
    assert!(result.code.contains("Astro.self = $$Component;"));
}

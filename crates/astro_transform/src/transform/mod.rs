//! Tree transform pass.
//!
//! A single depth-first rewrite of the parsed document: head extraction,
//! style/script hoisting, hydration directive collection, scope marker
//! injection, `class`/`class:list` merging, `define:vars` propagation,
//! `set:html`/`set:text` normalization and whitespace compaction. The tree
//! that comes out is what the printer renders; everything removed from it
//! lands in one of the document aggregates.

pub mod scope_html;
pub mod whitespace;

use crate::ast::{
    Attribute, AttributeKind, Document, HoistedScript, HoistedScriptKind, HydratedComponent,
    NodeId, NodeKind,
};
use crate::css_scoping;
use crate::diagnostic::{CompileError, Diagnostic, DiagnosticCode, DiagnosticLabel};
use crate::hash::hash_string;
use crate::options::TransformOptions;
use crate::printer::escape::{decode_html_entities, escape_single_quote};
use crate::scanner::{self, FrontmatterAnalysis};

/// Elements whose subtree keeps scripts and styles in place.
const NON_HOISTABLE_PARENTS: &[&str] = &["svg", "noscript", "template"];

/// Attributes a `<script>` may carry and still be hoisted.
fn is_hoistable_script_attribute(attr: &Attribute) -> bool {
    match attr.key.as_str() {
        "hoist" | "src" | "define:vars" => true,
        "type" => attr.kind == AttributeKind::Quoted && attr.value == "module",
        _ => false,
    }
}

/// State produced by the transform pass and consumed by the printer.
#[derive(Debug)]
pub struct TransformContext {
    /// The component scope hash.
    pub scope: String,
    /// Whether any retained style participates in scoping, which turns on
    /// scope marker injection for the markup.
    pub has_scoped_styles: bool,
    /// `define:vars` values collected from `<style>` elements, in order.
    /// The printer declares `$$definedVars` from these.
    pub define_vars_values: Vec<String>,
    /// Recoverable issues encountered during the walk.
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the transform pass over a parsed document.
///
/// `analysis` is the frontmatter statement partition; it supplies the import
/// table used to resolve hydrated component references.
pub fn apply(
    doc: &mut Document,
    source: &str,
    options: &TransformOptions,
    analysis: &FrontmatterAnalysis,
) -> Result<TransformContext, CompileError> {
    let mut ctx = TransformContext {
        scope: options.scope_for(source),
        has_scoped_styles: false,
        define_vars_values: Vec::new(),
        diagnostics: Vec::new(),
    };

    extract_head(doc);
    hoist_styles(doc, source, options, &mut ctx);
    hoist_scripts(doc, source, options, &mut ctx);
    collect_hydration(doc, source, options, analysis, &mut ctx)?;

    if ctx.has_scoped_styles {
        scope_html::inject_scope_markers(doc, options.scoped_style_strategy, &ctx.scope);
    }
    scope_html::merge_class_lists(doc);

    if !ctx.define_vars_values.is_empty() {
        propagate_define_vars(doc, source, &mut ctx);
    }
    if options.annotate_source_file {
        annotate_source(doc, options);
    }
    assign_transition_scopes(doc, &ctx.scope);
    normalize_set_directives(doc, source, &mut ctx);
    trim_trailing_whitespace(doc);
    if options.compact {
        whitespace::compact(doc);
    }
    ensure_nonempty(doc);

    Ok(ctx)
}

/// All element ids in the live tree plus the detached head subtree, in
/// pre-order. Collected up front so the walk survives detachments.
fn walk_targets(doc: &Document) -> Vec<NodeId> {
    let mut ids = doc.descendants(doc.root);
    if let Some(head) = doc.head {
        ids.extend(doc.descendants(head));
    }
    ids
}

/// A `<head>` that is not already under `<html>` is detached and stored on
/// the document, so documents without an `<html>` wrapper still get
/// head-injection behavior.
fn extract_head(doc: &mut Document) {
    let head = doc.descendants(doc.root).into_iter().find(|&id| {
        let node = doc.node(id);
        node.kind == NodeKind::Element && node.tag == "head" && node.is_plain_element()
    });
    let Some(head) = head else { return };

    let under_html = doc
        .closest_ancestor(head, |n| n.tag == "html")
        .is_some();
    if !under_html {
        doc.detach(head);
        doc.head = Some(head);
    }
}

fn in_non_hoistable_context(doc: &Document, id: NodeId) -> bool {
    doc.closest_ancestor(id, |n| NON_HOISTABLE_PARENTS.contains(&n.tag.as_str()))
        .is_some()
}

fn has_set_directive(doc: &Document, id: NodeId) -> bool {
    let node = doc.node(id);
    node.has_attribute("set:html") || node.has_attribute("set:text")
}

/// Concatenated text content of a node's children.
fn text_content(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(id) {
        let node = doc.node(child);
        if matches!(node.kind, NodeKind::Text | NodeKind::Raw) {
            out.push_str(&node.content);
        }
    }
    out
}

fn span_label(doc: &Document, id: NodeId, source: &str) -> DiagnosticLabel {
    let span = doc.node(id).span;
    DiagnosticLabel::new(None, span.start, span.end, source)
}

/// Extract `<style>` elements into the document's style aggregate, scoping
/// their CSS unless `is:global` is present.
fn hoist_styles(
    doc: &mut Document,
    source: &str,
    options: &TransformOptions,
    ctx: &mut TransformContext,
) {
    for id in walk_targets(doc) {
        let node = doc.node(id);
        if node.tag != "style" || !node.is_plain_element() {
            continue;
        }
        if node.has_attribute("is:inline") || has_set_directive(doc, id) {
            continue;
        }
        if in_non_hoistable_context(doc, id) {
            continue;
        }

        let is_global = doc.node(id).has_attribute("is:global");
        if let Some(vars) = doc.node(id).attribute("define:vars") {
            let value = match vars.kind {
                AttributeKind::Quoted => format!("'{}'", escape_single_quote(&vars.value)),
                _ => vars.value.clone(),
            };
            if !value.is_empty() {
                ctx.define_vars_values.push(value);
            }
        }

        let css = text_content(doc, id);
        let trimmed = css.trim();
        doc.detach(id);

        if trimmed.is_empty() {
            // Empty styles still turn on scoping unless global.
            if !is_global {
                ctx.has_scoped_styles = true;
            }
            continue;
        }

        let scoped = if is_global {
            trimmed.to_string()
        } else {
            ctx.has_scoped_styles = true;
            match css_scoping::scope_css(trimmed, &ctx.scope, options.scoped_style_strategy) {
                Some(scoped) => scoped,
                None => {
                    ctx.diagnostics.push(
                        Diagnostic::warning(
                            DiagnosticCode::CssParseError,
                            "unable to parse stylesheet; emitting it unscoped",
                        )
                        .with_label(span_label(doc, id, source)),
                    );
                    trimmed.to_string()
                }
            }
        };

        doc.node_mut(id).content = scoped;
        doc.styles.push(id);
    }
}

/// Extract hoistable `<script>` elements into the document's script
/// aggregate.
fn hoist_scripts(
    doc: &mut Document,
    source: &str,
    options: &TransformOptions,
    ctx: &mut TransformContext,
) {
    for id in walk_targets(doc) {
        let node = doc.node(id);
        if node.tag != "script" || !node.is_plain_element() || node.is_handled_script {
            continue;
        }
        if node.has_attribute("is:inline") || has_set_directive(doc, id) {
            continue;
        }
        if in_non_hoistable_context(doc, id) {
            continue;
        }
        let in_expression = doc
            .closest_ancestor(id, |n| n.is_expression)
            .is_some();
        if in_expression && !options.render_script {
            continue;
        }

        if let Some(bad) = doc
            .node(id)
            .attributes
            .iter()
            .find(|a| !is_hoistable_script_attribute(a))
        {
            ctx.diagnostics.push(
                Diagnostic::hint_level(
                    DiagnosticCode::ImplicitInlineScript,
                    format!(
                        "scripts with the \"{}\" attribute render inline without processing",
                        bad.key
                    ),
                )
                .with_label(span_label(doc, id, source)),
            );
            continue;
        }

        if doc.node(id).has_attribute("hoist") {
            ctx.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::DeprecatedHoistAttribute,
                    "the `hoist` attribute is deprecated; scripts are hoisted automatically",
                )
                .with_hint("remove the `hoist` attribute")
                .with_label(span_label(doc, id, source)),
            );
        }

        let script = if let Some(src) = doc.node(id).attribute("src") {
            if src.kind != AttributeKind::Quoted {
                ctx.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::ScriptSrcExpression,
                        "`src` must be a static string to be hoisted; rendering inline",
                    )
                    .with_label(span_label(doc, id, source)),
                );
                continue;
            }
            HoistedScript {
                kind: HoistedScriptKind::External,
                node: id,
                value: None,
                src: Some(src.value.clone()),
                keys: None,
            }
        } else if let Some(vars) = doc.node(id).attribute("define:vars") {
            let keys = scanner::extract_object_keys(&vars.value);
            if keys.is_empty() {
                ctx.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::EmptyDefineVars,
                        "`define:vars` has no resolvable variable names",
                    )
                    .with_label(span_label(doc, id, source)),
                );
            }
            HoistedScript {
                kind: HoistedScriptKind::DefineVars,
                node: id,
                value: Some(text_content(doc, id)),
                src: None,
                keys: Some(keys.join(",")),
            }
        } else {
            HoistedScript {
                kind: HoistedScriptKind::Inline,
                node: id,
                value: Some(text_content(doc, id)),
                src: None,
                keys: None,
            }
        };

        if options.render_script {
            // Stays in the markup; the printer emits the script runtime call.
            doc.node_mut(id).is_handled_script = true;
        } else {
            doc.detach(id);
        }
        doc.scripts.push(script);
    }
}

/// An import-table match for a component name.
struct ResolvedImport {
    specifier: String,
    export_name: String,
}

fn resolve_component_import(
    analysis: &FrontmatterAnalysis,
    name: &str,
) -> Option<ResolvedImport> {
    for import in &analysis.imports {
        if import.is_type_only {
            continue;
        }
        if let Some(export_name) = import.resolve(name) {
            return Some(ResolvedImport {
                specifier: import.specifier.clone(),
                export_name,
            });
        }
    }
    None
}

/// Collect `client:*` and `server:*` directives: register directive names,
/// resolve component imports, and append the synthetic `*:component-*`
/// attributes the runtime consumes.
fn collect_hydration(
    doc: &mut Document,
    source: &str,
    options: &TransformOptions,
    analysis: &FrontmatterAnalysis,
    ctx: &mut TransformContext,
) -> Result<(), CompileError> {
    for id in walk_targets(doc) {
        let node = doc.node(id);
        if node.kind != NodeKind::Element || node.is_expression || node.is_fragment {
            continue;
        }
        let is_island = node.is_component || node.is_custom_element;

        let client_directives: Vec<String> = node
            .attributes
            .iter()
            .filter(|a| {
                a.key.starts_with("client:") && !a.key.starts_with("client:component-")
            })
            .map(|a| a.key.clone())
            .collect();
        let server_directives: Vec<String> = node
            .attributes
            .iter()
            .filter(|a| {
                a.key.starts_with("server:") && !a.key.starts_with("server:component-")
            })
            .map(|a| a.key.clone())
            .collect();

        if client_directives.is_empty() && server_directives.is_empty() {
            continue;
        }

        if !is_island {
            ctx.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::ClientDirectiveOnElement,
                    format!(
                        "`{}` has no effect on plain HTML elements",
                        client_directives
                            .first()
                            .or(server_directives.first())
                            .map_or("client:*", String::as_str)
                    ),
                )
                .with_label(span_label(doc, id, source)),
            );
            continue;
        }

        if client_directives.len() > 1 {
            ctx.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::ConflictingClientDirectives,
                    format!(
                        "only one client directive is allowed; using `{}`",
                        client_directives[0]
                    ),
                )
                .with_label(span_label(doc, id, source)),
            );
        }

        let name = doc.node(id).tag.clone();
        let is_custom = doc.node(id).is_custom_element;
        let resolved = resolve_component_import(analysis, &name);

        if let Some(key) = client_directives.first() {
            let directive = key.trim_start_matches("client:").to_string();
            doc.record_hydration_directive(&directive);

            doc.node_mut(id)
                .attributes
                .push(Attribute::quoted("client:component-hydration", &directive));

            if directive == "only" {
                let Some(resolved) = resolved else {
                    return Err(CompileError::UnresolvedClientOnly { component: name });
                };
                let resolved_path = options.resolve_specifier(&resolved.specifier);
                append_reference_attributes(
                    doc,
                    id,
                    "client",
                    options,
                    &resolved,
                    &resolved_path,
                    true,
                );
                doc.client_only_components.push(HydratedComponent {
                    name,
                    specifier: resolved.specifier,
                    export_name: resolved.export_name,
                    resolved_path,
                    is_custom_element: is_custom,
                });
            } else if let Some(resolved) = resolved {
                let resolved_path = options.resolve_specifier(&resolved.specifier);
                append_reference_attributes(
                    doc,
                    id,
                    "client",
                    options,
                    &resolved,
                    &resolved_path,
                    false,
                );
                doc.hydrated_components.push(HydratedComponent {
                    name,
                    specifier: resolved.specifier,
                    export_name: resolved.export_name,
                    resolved_path,
                    is_custom_element: is_custom,
                });
            }
        } else if let Some(key) = server_directives.first() {
            let directive = key.trim_start_matches("server:").to_string();
            doc.node_mut(id)
                .attributes
                .push(Attribute::quoted("server:component-directive", &directive));
            // Server-deferred islands propagate head content like transitions.
            doc.uses_transitions = true;

            if let Some(resolved) = resolve_component_import(analysis, &name) {
                let resolved_path = options.resolve_specifier(&resolved.specifier);
                append_reference_attributes(
                    doc,
                    id,
                    "server",
                    options,
                    &resolved,
                    &resolved_path,
                    false,
                );
                doc.server_components.push(HydratedComponent {
                    name,
                    specifier: resolved.specifier,
                    export_name: resolved.export_name,
                    resolved_path,
                    is_custom_element: is_custom,
                });
            }
        }
    }
    Ok(())
}

/// Append the `*:component-path` / `*:component-export` attributes.
fn append_reference_attributes(
    doc: &mut Document,
    id: NodeId,
    prefix: &str,
    options: &TransformOptions,
    resolved: &ResolvedImport,
    resolved_path: &str,
    client_only: bool,
) {
    let path_value = if options.has_resolve_path() {
        format!("\"{}\"", escape_single_quote(resolved_path))
    } else {
        format!("$$metadata.resolvePath(\"{}\")", resolved.specifier)
    };
    let path_key = format!("{prefix}:component-path");
    let export_key = format!("{prefix}:component-export");

    doc.node_mut(id)
        .attributes
        .push(Attribute::expression(path_key, path_value));

    let export_attr = if client_only {
        Attribute::quoted(export_key, &resolved.export_name)
    } else {
        Attribute::expression(export_key, format!("\"{}\"", resolved.export_name))
    };
    doc.node_mut(id).attributes.push(export_attr);
}

/// Fold `$$definedVars` into the `style` attribute of every scopeable
/// element, following the quoted/expression/shorthand merge matrix.
fn propagate_define_vars(doc: &mut Document, source: &str, ctx: &mut TransformContext) {
    let mut applied = false;
    for id in walk_targets(doc) {
        let node = doc.node(id);
        let scopeable = node.kind == NodeKind::Element
            && !node.is_component
            && !node.is_expression
            && !node.is_fragment
            && css_scoping::should_scope_element(&node.tag);
        if !scopeable {
            continue;
        }
        applied = true;

        let node = doc.node_mut(id);
        if !node.has_attribute("style") {
            node.attributes
                .push(Attribute::expression("style", "$$definedVars"));
            continue;
        }
        if let Some(style) = node.attribute_mut("style") {
            match style.kind {
                AttributeKind::Quoted | AttributeKind::TemplateLiteral => {
                    style.kind = AttributeKind::TemplateLiteral;
                    style.value = format!("{}; ${{$$definedVars}}", style.value);
                }
                AttributeKind::Expression => {
                    style.value = format!("`${{{}}}; ${{$$definedVars}}`", style.value);
                }
                AttributeKind::Shorthand => {
                    style.kind = AttributeKind::Expression;
                    style.value = "`${style}; ${$$definedVars}`".to_string();
                }
                AttributeKind::Empty => {
                    style.kind = AttributeKind::Expression;
                    style.value = "$$definedVars".to_string();
                }
                AttributeKind::Spread => {}
            }
        }
    }

    if !applied {
        let label = DiagnosticLabel::new(None, 0, 0, source);
        ctx.diagnostics.push(
            Diagnostic::warning(
                DiagnosticCode::EmptyDefineVars,
                "`define:vars` found no element to attach style variables to",
            )
            .with_label(label),
        );
    }
}

/// Dev-tools source annotation: file path on every plain element; the
/// printer appends the location counterpart at print time.
fn annotate_source(doc: &mut Document, options: &TransformOptions) {
    let filename = options.filename.clone().unwrap_or_else(|| "<stdin>".into());
    for id in walk_targets(doc) {
        let node = doc.node(id);
        if node.is_plain_element() && !node.is_handled_script {
            doc.node_mut(id)
                .attributes
                .push(Attribute::quoted("data-astro-source-file", &filename));
        }
    }
}

/// Assign a deterministic per-node transition scope to every node carrying a
/// `transition:*` directive.
fn assign_transition_scopes(doc: &mut Document, scope: &str) {
    let mut counter = 0u32;
    for id in walk_targets(doc) {
        let node = doc.node(id);
        if node.kind != NodeKind::Element {
            continue;
        }
        let has_transition = node.attributes.iter().any(|a| {
            matches!(
                a.key.as_str(),
                "transition:persist" | "transition:name" | "transition:animate"
            )
        });
        if !has_transition {
            continue;
        }
        let transition_scope = hash_string(&format!("{scope}-{counter}"));
        counter += 1;
        let node = doc.node_mut(id);
        node.is_transition_target = true;
        node.transition_scope = Some(transition_scope);
        doc.uses_transitions = true;
    }
}

/// Replace the children of `set:html`/`set:text` elements with a synthesized
/// expression (or text) node. Components keep their directive: the printer
/// turns it into a default slot.
fn normalize_set_directives(doc: &mut Document, source: &str, ctx: &mut TransformContext) {
    for id in walk_targets(doc) {
        let node = doc.node(id);
        if node.kind != NodeKind::Element || node.is_component || node.is_fragment {
            continue;
        }
        if !has_set_directive(doc, id) {
            continue;
        }

        let had_content = doc
            .children(id)
            .iter()
            .any(|&c| jsx_child_has_content(doc, c));
        if had_content {
            ctx.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::SetDirectiveDiscardsChildren,
                    "`set:html`/`set:text` replaces existing children",
                )
                .with_label(span_label(doc, id, source)),
            );
        }
        // Detached for good; the arena keeps the old children alive but
        // nothing references them again.
        let _ = doc.take_children(id);

        if let Some(attr) = doc.node_mut(id).remove_attribute("set:text") {
            match attr.kind {
                AttributeKind::Quoted => {
                    let text = doc.new_text(attr.value);
                    doc.append_child(id, text);
                }
                _ => {
                    let expr = doc.new_expression();
                    let chunk = doc.new_text(attr.value);
                    doc.append_child(expr, chunk);
                    doc.append_child(id, expr);
                }
            }
        } else if let Some(attr) = doc.node_mut(id).remove_attribute("set:html") {
            match attr.kind {
                AttributeKind::Quoted => {
                    let raw = doc.new_node(NodeKind::Raw);
                    doc.node_mut(raw).content = decode_html_entities(&attr.value);
                    doc.append_child(id, raw);
                }
                AttributeKind::TemplateLiteral => {
                    let expr = doc.new_expression();
                    doc.node_mut(expr).needs_unescape = true;
                    let chunk = doc.new_text(format!("`{}`", attr.value));
                    doc.append_child(expr, chunk);
                    doc.append_child(id, expr);
                }
                _ => {
                    let expr = doc.new_expression();
                    doc.node_mut(expr).needs_unescape = true;
                    let chunk = doc.new_text(attr.value);
                    doc.append_child(expr, chunk);
                    doc.append_child(id, expr);
                }
            }
        }
    }
}

/// Whether a node contributes renderable content (non-whitespace text, an
/// element, or an expression).
pub(crate) fn jsx_child_has_content(doc: &Document, id: NodeId) -> bool {
    let node = doc.node(id);
    match node.kind {
        NodeKind::Text => !node.content.trim().is_empty(),
        NodeKind::Comment | NodeKind::Doctype => false,
        _ => true,
    }
}

/// Trim whitespace at the very end of the document.
fn trim_trailing_whitespace(doc: &mut Document) {
    loop {
        let Some(last) = doc.node(doc.root).last_child else {
            return;
        };
        let node = doc.node(last);
        if node.kind == NodeKind::Text && node.content.trim().is_empty() {
            doc.detach(last);
            continue;
        }
        if node.kind == NodeKind::Text {
            let trimmed = node.content.trim_end().to_string();
            doc.node_mut(last).content = trimmed;
        }
        return;
    }
}

/// A tree emptied by hoisting still needs a node for the printer to anchor
/// its prelude to.
fn ensure_nonempty(doc: &mut Document) {
    if doc.node(doc.root).first_child.is_none() {
        let frontmatter = doc.new_frontmatter("");
        doc.append_child(doc.root, frontmatter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::scanner::scan_frontmatter;

    fn options_with_scope() -> TransformOptions {
        TransformOptions::new().with_scope("xxxxxx")
    }

    fn style_with(doc: &mut Document, css: &str) -> NodeId {
        let style = doc.new_element("style");
        let text = doc.new_text(css);
        doc.append_child(style, text);
        style
    }

    #[test]
    fn styles_are_hoisted_and_scoped() {
        let mut doc = Document::new();
        let style = style_with(&mut doc, ".a { color: red; }");
        doc.append_child(doc.root, style);
        let div = doc.new_element("div");
        doc.append_child(doc.root, div);

        let analysis = scan_frontmatter("");
        let ctx = apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();

        assert!(ctx.has_scoped_styles);
        assert_eq!(doc.styles, vec![style]);
        assert!(doc.node(style).parent.is_none());
        assert!(
            doc.node(style)
                .content
                .contains(":where([data-astro-scope=\"xxxxxx\"])")
        );
        // Where strategy: the div carries the matching attribute.
        assert_eq!(
            doc.node(div).attribute("data-astro-scope").map(|a| a.value.as_str()),
            Some("xxxxxx")
        );
    }

    #[test]
    fn global_styles_pass_through() {
        let mut doc = Document::new();
        let style = style_with(&mut doc, "body { margin: 0; }");
        doc.node_mut(style).attributes.push(Attribute::empty("is:global"));
        doc.append_child(doc.root, style);

        let analysis = scan_frontmatter("");
        let ctx = apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();

        assert!(!ctx.has_scoped_styles);
        assert_eq!(doc.node(style).content, "body { margin: 0; }");
    }

    #[test]
    fn inline_styles_stay_in_tree() {
        let mut doc = Document::new();
        let style = style_with(&mut doc, ".a{}");
        doc.node_mut(style).attributes.push(Attribute::empty("is:inline"));
        doc.append_child(doc.root, style);

        let analysis = scan_frontmatter("");
        apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();

        assert!(doc.styles.is_empty());
        assert_eq!(doc.node(style).parent, Some(doc.root));
    }

    #[test]
    fn bare_script_is_hoisted_inline() {
        let mut doc = Document::new();
        let script = doc.new_element("script");
        let code = doc.new_text("console.log(1)");
        doc.append_child(script, code);
        doc.append_child(doc.root, script);

        let analysis = scan_frontmatter("");
        apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();

        assert_eq!(doc.scripts.len(), 1);
        assert_eq!(doc.scripts[0].kind, HoistedScriptKind::Inline);
        assert_eq!(doc.scripts[0].value.as_deref(), Some("console.log(1)"));
        assert!(doc.node(script).parent.is_none());
    }

    #[test]
    fn script_with_extra_attributes_stays_inline() {
        let mut doc = Document::new();
        let script = doc.new_element("script");
        doc.node_mut(script)
            .attributes
            .push(Attribute::quoted("type", "text/partytown"));
        doc.append_child(doc.root, script);

        let analysis = scan_frontmatter("");
        let ctx = apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();

        assert!(doc.scripts.is_empty());
        assert_eq!(doc.node(script).parent, Some(doc.root));
        assert!(ctx
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::ImplicitInlineScript));
    }

    #[test]
    fn expression_src_script_warns_and_stays() {
        let mut doc = Document::new();
        let script = doc.new_element("script");
        doc.node_mut(script)
            .attributes
            .push(Attribute::expression("src", "scriptUrl"));
        doc.append_child(doc.root, script);

        let analysis = scan_frontmatter("");
        let ctx = apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();

        assert!(doc.scripts.is_empty());
        assert!(ctx
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::ScriptSrcExpression));
    }

    #[test]
    fn unresolved_client_only_is_fatal() {
        let mut doc = Document::new();
        let comp = doc.new_element("Counter");
        doc.node_mut(comp)
            .attributes
            .push(Attribute::quoted("client:only", "preact"));
        doc.append_child(doc.root, comp);

        let analysis = scan_frontmatter("");
        let err = apply(&mut doc, "", &options_with_scope(), &analysis).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnresolvedClientOnly {
                component: "Counter".into()
            }
        );
    }

    #[test]
    fn client_load_resolves_through_imports() {
        let mut doc = Document::new();
        let comp = doc.new_element("Counter");
        doc.node_mut(comp)
            .attributes
            .push(Attribute::empty("client:load"));
        doc.append_child(doc.root, comp);

        let analysis = scan_frontmatter("import Counter from './Counter.jsx';");
        apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();

        assert_eq!(doc.hydrated_components.len(), 1);
        assert_eq!(doc.hydrated_components[0].specifier, "./Counter.jsx");
        assert_eq!(doc.hydrated_components[0].export_name, "default");
        assert_eq!(doc.hydration_directives, vec!["load"]);
        let node = doc.node(comp);
        assert_eq!(
            node.attribute("client:component-hydration").map(|a| a.value.as_str()),
            Some("load")
        );
        assert!(node
            .attribute("client:component-path")
            .is_some_and(|a| a.value.contains("resolvePath")));
    }

    #[test]
    fn client_directive_on_plain_element_warns() {
        let mut doc = Document::new();
        let div = doc.new_element("div");
        doc.node_mut(div)
            .attributes
            .push(Attribute::empty("client:load"));
        doc.append_child(doc.root, div);

        let analysis = scan_frontmatter("");
        let ctx = apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();
        assert!(ctx
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::ClientDirectiveOnElement));
        assert!(doc.hydrated_components.is_empty());
    }

    #[test]
    fn set_html_expression_becomes_unescaped_expression_child() {
        let mut doc = Document::new();
        let div = doc.new_element("div");
        doc.node_mut(div)
            .attributes
            .push(Attribute::expression("set:html", "content"));
        let old = doc.new_text("old");
        doc.append_child(div, old);
        doc.append_child(doc.root, div);

        let analysis = scan_frontmatter("");
        let ctx = apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();

        assert!(ctx
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::SetDirectiveDiscardsChildren));
        let children = doc.children(div);
        assert_eq!(children.len(), 1);
        let expr = doc.node(children[0]);
        assert!(expr.is_expression);
        assert!(expr.needs_unescape);
        assert!(!doc.node(div).has_attribute("set:html"));
    }

    #[test]
    fn head_outside_html_is_extracted() {
        let mut doc = Document::new();
        let head = doc.new_element("head");
        let title = doc.new_element("title");
        doc.append_child(head, title);
        doc.append_child(doc.root, head);
        let div = doc.new_element("div");
        doc.append_child(doc.root, div);

        let analysis = scan_frontmatter("");
        apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();

        assert_eq!(doc.head, Some(head));
        assert!(doc.node(head).parent.is_none());
        assert_eq!(doc.children(head), vec![title]);
    }

    #[test]
    fn transition_targets_get_stable_scopes() {
        let mut doc = Document::new();
        let div = doc.new_element("div");
        doc.node_mut(div)
            .attributes
            .push(Attribute::quoted("transition:name", "hero"));
        doc.append_child(doc.root, div);

        let analysis = scan_frontmatter("");
        apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();

        assert!(doc.uses_transitions);
        let scope = doc.node(div).transition_scope.clone().unwrap();
        assert_eq!(scope, hash_string("xxxxxx-0"));
    }

    #[test]
    fn emptied_tree_gets_synthetic_frontmatter() {
        let mut doc = Document::new();
        let style = style_with(&mut doc, ".a{color:red}");
        doc.append_child(doc.root, style);

        let analysis = scan_frontmatter("");
        apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();

        let children = doc.children(doc.root);
        assert_eq!(children.len(), 1);
        assert_eq!(doc.node(children[0]).kind, NodeKind::Frontmatter);
    }

    #[test]
    fn trailing_whitespace_is_trimmed() {
        let mut doc = Document::new();
        let div = doc.new_element("div");
        doc.append_child(doc.root, div);
        let ws = doc.new_text("\n  ");
        doc.node_mut(ws).span = Span::new(5, 8);
        doc.append_child(doc.root, ws);

        let analysis = scan_frontmatter("");
        apply(&mut doc, "", &options_with_scope(), &analysis).unwrap();
        assert_eq!(doc.children(doc.root), vec![div]);
    }
}

//! Multi-target printer.
//!
//! Renders the transformed tree into one of the textual targets: the
//! runnable JavaScript module (this module), the TSX type-check stub
//! ([`tsx`]), and the debug JSON AST ([`json`]). The extracted-CSS target is
//! carried on [`TransformResult::css`] without further processing.
//!
//! The module printer is a single recursive walk that appends to one output
//! buffer and drives the source-map builder as it writes; runtime glue with
//! no source counterpart gets nil mappings.

pub mod escape;
pub mod json;
pub mod result;
pub mod sourcemap_builder;
pub mod tsx;

mod components;
mod elements;
mod slots;

use rustc_hash::FxHashSet;

use crate::ast::{
    Document, HoistedScriptKind, HydratedComponent, NodeId, NodeKind, Span,
};
use crate::diagnostic::{byte_offset_to_line_column, CompileError, Diagnostic};
use crate::options::TransformOptions;
use crate::scanner::{self, FrontmatterAnalysis};
use crate::transform::TransformContext;
use escape::{escape_single_quote, escape_template_literal};
use result::{
    HoistedScriptType, TransformResult, TransformResultHoistedScript,
    TransformResultHydratedComponent,
};
use sourcemap_builder::SourcemapBuilder;

/// Runtime function names used in generated code.
pub(crate) mod runtime {
    pub const FRAGMENT: &str = "Fragment";
    pub const RENDER: &str = "$$render";
    pub const CREATE_ASTRO: &str = "$$createAstro";
    pub const CREATE_COMPONENT: &str = "$$createComponent";
    pub const RENDER_COMPONENT: &str = "$$renderComponent";
    pub const RENDER_HEAD: &str = "$$renderHead";
    pub const MAYBE_RENDER_HEAD: &str = "$$maybeRenderHead";
    pub const UNESCAPE_HTML: &str = "$$unescapeHTML";
    pub const RENDER_SLOT: &str = "$$renderSlot";
    pub const MERGE_SLOTS: &str = "$$mergeSlots";
    pub const ADD_ATTRIBUTE: &str = "$$addAttribute";
    pub const SPREAD_ATTRIBUTES: &str = "$$spreadAttributes";
    pub const DEFINE_STYLE_VARS: &str = "$$defineStyleVars";
    pub const DEFINE_SCRIPT_VARS: &str = "$$defineScriptVars";
    pub const RENDER_TRANSITION: &str = "$$renderTransition";
    pub const CREATE_TRANSITION_SCOPE: &str = "$$createTransitionScope";
    pub const RENDER_SCRIPT: &str = "$$renderScript";
    pub const CREATE_METADATA: &str = "$$createMetadata";
    pub const RESULT: &str = "$$result";
}

/// The flavor of a node, computed once per visit and matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeFlavor {
    Frontmatter,
    Text,
    Comment,
    Doctype,
    Raw,
    Expression,
    Fragment,
    Slot,
    Component,
    CustomElement,
    Element,
}

fn flavor(doc: &Document, id: NodeId) -> NodeFlavor {
    let node = doc.node(id);
    match node.kind {
        NodeKind::Frontmatter => NodeFlavor::Frontmatter,
        NodeKind::Text => NodeFlavor::Text,
        NodeKind::Comment => NodeFlavor::Comment,
        NodeKind::Doctype => NodeFlavor::Doctype,
        NodeKind::Raw => NodeFlavor::Raw,
        NodeKind::Document | NodeKind::Element => {
            if node.is_expression {
                NodeFlavor::Expression
            } else if node.is_fragment {
                NodeFlavor::Fragment
            } else if node.is_component {
                NodeFlavor::Component
            } else if node.is_custom_element {
                NodeFlavor::CustomElement
            } else if node.tag == "slot" {
                NodeFlavor::Slot
            } else {
                NodeFlavor::Element
            }
        }
    }
}

/// A user import tracked for `$$metadata` namespace re-exports.
struct ModuleImport {
    specifier: String,
    namespace_var: String,
    /// Import-attribute clause rendered as `{key:"value",…}`, `{}` if none.
    assertion: String,
}

/// Render the transformed document as a runnable JavaScript module.
pub fn print_module(
    doc: &Document,
    source: &str,
    options: &TransformOptions,
    analysis: &FrontmatterAnalysis,
    ctx: TransformContext,
) -> Result<TransformResult, CompileError> {
    if analysis.top_level_return.is_some() {
        return Err(CompileError::TopLevelReturn);
    }
    if analysis.export_after_body {
        return Err(CompileError::ExportAfterBody);
    }
    Printer::new(doc, source, options, analysis, ctx).build()
}

struct Printer<'a> {
    doc: &'a Document,
    source: &'a str,
    options: &'a TransformOptions,
    analysis: &'a FrontmatterAnalysis,
    ctx: TransformContext,

    code: String,
    sourcemap: Option<SourcemapBuilder<'a>>,
    diagnostics: Vec<Diagnostic>,
    module_imports: Vec<ModuleImport>,

    has_await: bool,
    has_explicit_head: bool,
    render_head_inserted: bool,
    in_head: bool,
    script_index: usize,
    /// Consumed by the next printed node: suppress its own `slot` attribute
    /// because it is being rendered into a named slot bucket.
    skip_slot_attribute: bool,
    /// Cursor into the source for locating frontmatter statement text.
    statement_cursor: usize,
}

impl<'a> Printer<'a> {
    fn new(
        doc: &'a Document,
        source: &'a str,
        options: &'a TransformOptions,
        analysis: &'a FrontmatterAnalysis,
        ctx: TransformContext,
    ) -> Self {
        let sourcemap = options.sourcemap.is_enabled().then(|| {
            SourcemapBuilder::new(options.filename.as_deref().unwrap_or("<stdin>"), source)
        });
        let has_explicit_head = doc.head.is_some()
            || doc
                .descendants(doc.root)
                .iter()
                .any(|&id| doc.node(id).is_plain_element() && doc.node(id).tag == "head");
        let has_await = analysis.has_await || markup_has_await(doc);

        Self {
            doc,
            source,
            options,
            analysis,
            ctx,
            code: String::new(),
            sourcemap,
            diagnostics: Vec::new(),
            module_imports: Vec::new(),
            has_await,
            has_explicit_head,
            render_head_inserted: false,
            in_head: false,
            script_index: 0,
            skip_slot_attribute: false,
            statement_cursor: 0,
        }
    }

    // --- Output helpers ---

    fn print(&mut self, s: &str) {
        self.code.push_str(s);
    }

    fn println(&mut self, s: &str) {
        self.code.push_str(s);
        self.code.push('\n');
    }

    fn map_span(&mut self, span: Span) {
        if let Some(sm) = &mut self.sourcemap {
            sm.add_source_mapping_for_span(self.code.as_bytes(), span);
        }
    }

    fn map_nil(&mut self) {
        if let Some(sm) = &mut self.sourcemap {
            sm.add_nil_mapping(self.code.as_bytes());
        }
    }

    fn get_async_prefix(&self) -> &'static str {
        if self.has_await { "async " } else { "" }
    }

    fn get_slot_params(&self) -> &'static str {
        if self.options.result_scoped_slot {
            "($$result) => "
        } else {
            "() => "
        }
    }

    /// Print a frontmatter statement, mapping each generated line to its
    /// position in the original source. The statement text is located by
    /// forward search from the previous statement, matching the scanner's
    /// left-to-right statement order.
    fn print_statement_text(&mut self, text: &str) {
        let trimmed = text.trim_end();
        let found = self.source[self.statement_cursor..]
            .find(trimmed)
            .map(|pos| self.statement_cursor + pos);

        match found {
            Some(start) => {
                self.statement_cursor = start + trimmed.len();
                self.map_start(start);
                let mut offset = start;
                let mut first = true;
                for line in trimmed.split('\n') {
                    if !first {
                        self.code.push('\n');
                        if let Some(sm) = &mut self.sourcemap {
                            sm.add_source_mapping_force(
                                self.code.as_bytes(),
                                u32::try_from(offset).unwrap_or(u32::MAX),
                            );
                        }
                    }
                    first = false;
                    self.print(line);
                    offset += line.len() + 1;
                }
                self.code.push('\n');
            }
            None => {
                self.map_nil();
                self.println(trimmed);
            }
        }
    }

    fn map_start(&mut self, offset: usize) {
        if let Some(sm) = &mut self.sourcemap {
            sm.add_source_mapping(self.code.as_bytes(), u32::try_from(offset).unwrap_or(u32::MAX));
        }
    }

    // --- Build ---

    fn build(mut self) -> Result<TransformResult, CompileError> {
        self.print_document();

        let scripts = self
            .doc
            .scripts
            .iter()
            .map(|s| match s.kind {
                HoistedScriptKind::External => TransformResultHoistedScript {
                    script_type: HoistedScriptType::External,
                    code: None,
                    src: s.src.clone(),
                },
                HoistedScriptKind::Inline | HoistedScriptKind::DefineVars => {
                    TransformResultHoistedScript {
                        script_type: HoistedScriptType::Inline,
                        code: s.value.clone(),
                        src: None,
                    }
                }
            })
            .collect();

        let to_result = |c: &HydratedComponent| TransformResultHydratedComponent {
            export_name: c.export_name.clone(),
            local_name: c.name.clone(),
            specifier: c.specifier.clone(),
            resolved_path: c.resolved_path.clone(),
        };
        let hydrated_components = self.doc.hydrated_components.iter().map(to_result).collect();
        let client_only_components =
            self.doc.client_only_components.iter().map(to_result).collect();
        let server_components = self.doc.server_components.iter().map(to_result).collect();

        let css = self
            .doc
            .styles
            .iter()
            .map(|&id| self.doc.node(id).content.clone())
            .collect();

        let mut code = self.code;
        let map = match self.sourcemap.map(SourcemapBuilder::into_sourcemap) {
            Some(map) => {
                let mut external = String::new();
                if self.options.sourcemap.wants_external() {
                    external = map.to_json_string();
                }
                if self.options.sourcemap.wants_inline() {
                    code.push_str("\n//# sourceMappingURL=");
                    code.push_str(&map.to_data_url());
                }
                external
            }
            None => String::new(),
        };

        let mut diagnostics = std::mem::take(&mut self.ctx.diagnostics);
        diagnostics.append(&mut self.diagnostics);

        Ok(TransformResult {
            code,
            map,
            scope: self.ctx.scope,
            diagnostics,
            css,
            scripts,
            hydrated_components,
            client_only_components,
            server_components,
            hydration_directives: self.doc.hydration_directives.clone(),
            contains_head: self.has_explicit_head,
            propagation: self.doc.uses_transitions,
        })
    }

    fn print_document(&mut self) {
        self.map_nil();
        self.print_internal_imports();
        self.print_css_imports();

        let client_only_roots = self.client_only_roots();
        let user_imports: Vec<(String, bool, String, bool)> = self
            .analysis
            .imports
            .iter()
            .filter(|import| {
                !import
                    .bindings
                    .iter()
                    .any(|b| client_only_roots.contains(b.local.as_str()))
            })
            .map(|import| {
                (
                    import.text.clone(),
                    import.is_type_only,
                    import.specifier.clone(),
                    import.bindings.is_empty(),
                )
            })
            .collect();

        let mut module_counter = 1;
        let mut printed_imports = false;
        for (text, is_type_only, specifier, is_bare) in &user_imports {
            self.print_statement_text(text);
            printed_imports = true;
            if *is_type_only || (*is_bare && is_css_specifier(specifier)) {
                continue;
            }
            self.module_imports.push(ModuleImport {
                specifier: specifier.clone(),
                namespace_var: format!("$$module{module_counter}"),
                assertion: extract_import_assertion(text),
            });
            module_counter += 1;
        }
        if printed_imports {
            self.println("");
        }

        self.map_nil();
        self.print_namespace_imports();
        if !printed_imports {
            self.println("");
        }
        self.print_metadata();

        if self.analysis.uses_astro_global {
            self.print_top_level_astro();
        }

        let exports: Vec<String> = self.analysis.exports.clone();
        for export in &exports {
            self.print_statement_text(export);
        }

        let component_name = get_component_name(self.options.filename.as_deref());
        self.print_component_wrapper(&component_name);
        self.println(&format!("export default {component_name};"));
    }

    fn client_only_roots(&self) -> FxHashSet<&str> {
        self.doc
            .client_only_components
            .iter()
            .map(|c| c.name.split('.').next().unwrap_or(c.name.as_str()))
            .collect()
    }

    fn print_internal_imports(&mut self) {
        let url = self.options.get_internal_url().to_string();

        self.println("import {");
        self.println(&format!("  {},", runtime::FRAGMENT));
        self.println(&format!("  render as {},", runtime::RENDER));
        self.println(&format!("  createAstro as {},", runtime::CREATE_ASTRO));
        self.println(&format!("  createComponent as {},", runtime::CREATE_COMPONENT));
        self.println(&format!("  renderComponent as {},", runtime::RENDER_COMPONENT));
        self.println(&format!("  renderHead as {},", runtime::RENDER_HEAD));
        self.println(&format!("  maybeRenderHead as {},", runtime::MAYBE_RENDER_HEAD));
        self.println(&format!("  unescapeHTML as {},", runtime::UNESCAPE_HTML));
        self.println(&format!("  renderSlot as {},", runtime::RENDER_SLOT));
        self.println(&format!("  mergeSlots as {},", runtime::MERGE_SLOTS));
        self.println(&format!("  addAttribute as {},", runtime::ADD_ATTRIBUTE));
        self.println(&format!("  spreadAttributes as {},", runtime::SPREAD_ATTRIBUTES));
        self.println(&format!("  defineStyleVars as {},", runtime::DEFINE_STYLE_VARS));
        self.println(&format!("  defineScriptVars as {},", runtime::DEFINE_SCRIPT_VARS));
        self.println(&format!("  renderTransition as {},", runtime::RENDER_TRANSITION));
        self.println(&format!(
            "  createTransitionScope as {},",
            runtime::CREATE_TRANSITION_SCOPE
        ));
        self.println(&format!("  renderScript as {},", runtime::RENDER_SCRIPT));
        if !self.options.has_resolve_path() {
            self.println(&format!("  createMetadata as {}", runtime::CREATE_METADATA));
        }
        self.println(&format!("}} from \"{url}\";"));

        if self.doc.uses_transitions {
            let url = self.options.get_transitions_animation_url().to_string();
            self.println(&format!("import \"{url}\";"));
        }
    }

    /// One CSS import per extracted style, addressed back into this file.
    fn print_css_imports(&mut self) {
        if self.doc.styles.is_empty() {
            return;
        }
        let filename = self
            .options
            .filename
            .clone()
            .unwrap_or_else(|| "<stdin>".to_string());
        for i in 0..self.doc.styles.len() {
            self.println(&format!(
                "import \"{filename}?astro&type=style&index={i}&lang.css\";"
            ));
        }
    }

    fn print_namespace_imports(&mut self) {
        if self.module_imports.is_empty() || self.options.has_resolve_path() {
            return;
        }
        for i in 0..self.module_imports.len() {
            let line = if self.module_imports[i].assertion == "{}" {
                format!(
                    "import * as {} from \"{}\";",
                    self.module_imports[i].namespace_var, self.module_imports[i].specifier
                )
            } else {
                format!(
                    "import * as {} from \"{}\" assert {};",
                    self.module_imports[i].namespace_var,
                    self.module_imports[i].specifier,
                    self.module_imports[i].assertion
                )
            };
            self.println(&line);
        }
        self.println("");
    }

    fn print_metadata(&mut self) {
        if self.options.has_resolve_path() {
            return;
        }

        let modules_str = if self.module_imports.is_empty() {
            "[]".to_string()
        } else {
            let items: Vec<String> = self
                .module_imports
                .iter()
                .map(|m| {
                    format!(
                        "{{ module: {}, specifier: \"{}\", assert: {} }}",
                        m.namespace_var, m.specifier, m.assertion
                    )
                })
                .collect();
            format!("[{}]", items.join(", "))
        };

        let hydrated_str = if self.doc.hydrated_components.is_empty() {
            "[]".to_string()
        } else {
            let custom_elements: Vec<String> = self
                .doc
                .hydrated_components
                .iter()
                .filter(|c| c.is_custom_element)
                .map(|c| format!("\"{}\"", c.name))
                .collect();
            let regular: Vec<String> = self
                .doc
                .hydrated_components
                .iter()
                .filter(|c| !c.is_custom_element)
                .rev()
                .map(|c| c.name.clone())
                .collect();
            let mut items = custom_elements;
            items.extend(regular);
            format!("[{}]", items.join(","))
        };

        let client_only_str = if self.doc.client_only_components.is_empty() {
            "[]".to_string()
        } else {
            let mut seen = FxHashSet::default();
            let mut items = Vec::new();
            for c in &self.doc.client_only_components {
                if seen.insert(c.specifier.as_str()) {
                    items.push(format!("\"{}\"", c.specifier));
                }
            }
            format!("[{}]", items.join(", "))
        };

        let directives_str = if self.doc.hydration_directives.is_empty() {
            "new Set([])".to_string()
        } else {
            let items: Vec<String> = self
                .doc
                .hydration_directives
                .iter()
                .map(|s| format!("\"{s}\""))
                .collect();
            format!("new Set([{}])", items.join(", "))
        };

        let hoisted_str = if self.doc.scripts.is_empty() {
            "[]".to_string()
        } else {
            let items: Vec<String> = self
                .doc
                .scripts
                .iter()
                .map(|script| match script.kind {
                    HoistedScriptKind::Inline => {
                        let value = script.value.as_deref().unwrap_or("");
                        format!(
                            "{{ type: \"inline\", value: `{}` }}",
                            escape_template_literal(value)
                        )
                    }
                    HoistedScriptKind::External => {
                        let src = script.src.as_deref().unwrap_or("");
                        format!("{{ type: \"external\", src: '{}' }}", escape_single_quote(src))
                    }
                    HoistedScriptKind::DefineVars => {
                        let value = script.value.as_deref().unwrap_or("");
                        let keys = script.keys.as_deref().unwrap_or("");
                        format!(
                            "{{ type: \"define:vars\", value: `{}`, keys: '{}' }}",
                            escape_template_literal(value),
                            escape_single_quote(keys)
                        )
                    }
                })
                .collect();
            format!("[{}]", items.join(", "))
        };

        let metadata_url = match &self.options.filename {
            Some(f) => format!("\"{}\"", escape_single_quote(f)),
            None => "import.meta.url".to_string(),
        };

        self.println(&format!(
            "export const $$metadata = {}({}, {{ modules: {}, hydratedComponents: {}, clientOnlyComponents: {}, hydrationDirectives: {}, hoisted: {} }});",
            runtime::CREATE_METADATA,
            metadata_url,
            modules_str,
            hydrated_str,
            client_only_str,
            directives_str,
            hoisted_str
        ));
        self.println("");
    }

    fn print_top_level_astro(&mut self) {
        let args = self
            .options
            .astro_global_args
            .as_deref()
            .unwrap_or("\"https://astro.build\"")
            .to_string();
        self.println(&format!("const $$Astro = {}({args});", runtime::CREATE_ASTRO));
        self.println("const Astro = $$Astro;");
    }

    fn print_component_wrapper(&mut self, component_name: &str) {
        let async_prefix = self.get_async_prefix();
        self.println(&format!(
            "const {} = {}({}({}, $$props, $$slots) => {{",
            component_name,
            runtime::CREATE_COMPONENT,
            async_prefix,
            runtime::RESULT
        ));

        if self.analysis.uses_astro_global {
            self.println(&format!(
                "const Astro = {}.createAstro($$props, $$slots);",
                runtime::RESULT
            ));
            self.println(&format!("Astro.self = {component_name};"));
        }

        self.println("");

        let body = self.analysis.body.clone();
        let has_body = !body.trim().is_empty();
        if has_body {
            for statement in body.split('\n') {
                self.print_statement_text(statement);
            }
            self.println("");
        }

        if !self.ctx.define_vars_values.is_empty() {
            let joined = self.ctx.define_vars_values.join(",");
            self.println(&format!(
                "const $$definedVars = {}([{}]);",
                runtime::DEFINE_STYLE_VARS,
                joined
            ));
        }

        self.print("return ");
        self.print(runtime::RENDER);
        self.print("`");

        if self.needs_maybe_render_head_at_start() {
            self.print(&format!(
                "${{{}({})}}",
                runtime::MAYBE_RENDER_HEAD,
                runtime::RESULT
            ));
            self.render_head_inserted = true;
        }

        if let Some(head) = self.doc.head {
            self.print_node(head);
        }
        self.print_body_children();

        self.println("`;");

        let filename_part = match &self.options.filename {
            Some(f) => format!("'{}'", escape_single_quote(f)),
            None => "undefined".to_string(),
        };
        let propagation = if self.doc.uses_transitions {
            "\"self\""
        } else {
            "undefined"
        };
        self.println(&format!("}}, {filename_part}, {propagation});"));
    }

    /// Print the document's top-level children, skipping the frontmatter
    /// node, leading whitespace and doctypes.
    fn print_body_children(&mut self) {
        let mut started = false;
        for child in self.doc.children(self.doc.root) {
            let node = self.doc.node(child);
            if node.kind == NodeKind::Frontmatter {
                continue;
            }
            if !started {
                if node.kind == NodeKind::Text && node.content.trim().is_empty() {
                    continue;
                }
                if node.kind == NodeKind::Doctype {
                    continue;
                }
                started = true;
            }
            self.print_node(child);
        }
    }

    fn needs_maybe_render_head_at_start(&self) -> bool {
        if self.render_head_inserted || self.has_explicit_head {
            return false;
        }
        for child in self.doc.children(self.doc.root) {
            match flavor(self.doc, child) {
                NodeFlavor::Frontmatter | NodeFlavor::Doctype | NodeFlavor::Comment => {}
                NodeFlavor::Text => {
                    if self.doc.node(child).content.trim().is_empty() {
                        continue;
                    }
                    return false;
                }
                NodeFlavor::Element => {
                    let node = self.doc.node(child);
                    if node.tag == "html" {
                        return false;
                    }
                    if node.is_handled_script {
                        continue;
                    }
                    return !elements::is_head_element(&node.tag);
                }
                NodeFlavor::Slot
                | NodeFlavor::Fragment
                | NodeFlavor::Expression
                | NodeFlavor::Component
                | NodeFlavor::CustomElement => return false,
                NodeFlavor::Raw => return true,
            }
        }
        false
    }

    fn needs_render_head(&self, name: &str) -> bool {
        if self.render_head_inserted || self.in_head {
            return false;
        }
        if elements::is_head_element(name) {
            return false;
        }
        if name == "body" && self.has_explicit_head {
            return false;
        }
        true
    }

    fn maybe_insert_render_head(&mut self, name: &str) {
        if self.needs_render_head(name) {
            self.print(&format!(
                "${{{}({})}}",
                runtime::MAYBE_RENDER_HEAD,
                runtime::RESULT
            ));
            self.render_head_inserted = true;
        }
    }

    // --- Node dispatch ---

    fn print_node(&mut self, id: NodeId) {
        match flavor(self.doc, id) {
            NodeFlavor::Frontmatter | NodeFlavor::Doctype => {}
            NodeFlavor::Text => self.print_text(id),
            NodeFlavor::Comment => self.print_comment(id),
            NodeFlavor::Raw => self.print_raw(id),
            NodeFlavor::Expression => self.print_expression(id),
            NodeFlavor::Slot => self.print_slot_element(id),
            NodeFlavor::Fragment => self.print_fragment(id),
            NodeFlavor::Component | NodeFlavor::CustomElement => self.print_component(id),
            NodeFlavor::Element => self.print_element(id),
        }
    }

    fn print_children(&mut self, id: NodeId) {
        for child in self.doc.children(id) {
            self.print_node(child);
        }
    }

    fn print_text(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        self.map_span(node.span);
        let escaped = escape_template_literal(&node.content);
        self.print(&escaped);
    }

    fn print_comment(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        self.map_span(node.span);
        let escaped = escape_template_literal(&node.content);
        self.print("<!--");
        self.print(&escaped);
        self.print("-->");
    }

    fn print_raw(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        self.map_span(node.span);
        let escaped = escape_template_literal(&node.content);
        self.print(&escaped);
    }

    /// Print an expression container: raw JavaScript chunks interleaved with
    /// embedded markup rendered through nested template literals.
    fn print_expression(&mut self, id: NodeId) {
        let children = self.doc.children(id);
        let has_content = children
            .iter()
            .any(|&c| crate::transform::jsx_child_has_content(self.doc, c));
        if !has_content {
            return;
        }

        let node = self.doc.node(id);
        let needs_unescape = node.needs_unescape;
        self.map_span(node.span);

        self.print("${");
        if needs_unescape {
            self.print(runtime::UNESCAPE_HTML);
            self.print("(");
        }
        for child in children {
            match flavor(self.doc, child) {
                NodeFlavor::Text => {
                    // Raw JavaScript between embedded elements.
                    let node = self.doc.node(child);
                    self.map_span(node.span);
                    let content = node.content.clone();
                    self.print(&content);
                }
                _ => {
                    self.print(runtime::RENDER);
                    self.print("`");
                    self.print_node(child);
                    self.print("`");
                }
            }
        }
        if needs_unescape {
            self.print(")");
        }
        self.print("}");
    }

    /// A bare fragment prints its children inline; a fragment carrying
    /// attributes (`slot`, `set:html`, …) goes through the component path.
    fn print_fragment(&mut self, id: NodeId) {
        let printable_attrs = {
            let skip_slot = self.skip_slot_attribute;
            self.doc
                .node(id)
                .attributes
                .iter()
                .any(|a| !(skip_slot && a.key == "slot"))
        };
        if printable_attrs {
            self.print_component(id);
        } else {
            self.skip_slot_attribute = false;
            self.print_children(id);
        }
    }

    /// `${$$renderScript(...)}` for scripts kept in place by `render_script`.
    fn print_handled_script(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        self.map_span(node.span);
        let filename = self
            .options
            .filename
            .clone()
            .unwrap_or_else(|| "<stdin>".to_string());
        let index = self.script_index;
        self.script_index += 1;
        self.print(&format!(
            "${{{}({},\"{filename}?astro&type=script&index={index}&lang.ts\")}}",
            runtime::RENDER_SCRIPT,
            runtime::RESULT
        ));
    }

    /// Location annotation printed next to `data-astro-source-file`.
    fn source_loc_for(&self, span: Span) -> String {
        let (line, column) = byte_offset_to_line_column(self.source, span.start as usize);
        format!("{line}:{column}")
    }
}

/// Whether any markup expression or expression attribute awaits.
fn markup_has_await(doc: &Document) -> bool {
    let mut ids = doc.descendants(doc.root);
    if let Some(head) = doc.head {
        ids.extend(doc.descendants(head));
    }
    ids.iter().any(|&id| {
        let node = doc.node(id);
        if node.kind == NodeKind::Text
            && node.parent.is_some_and(|p| doc.node(p).is_expression)
            && scanner::contains_await(&node.content)
        {
            return true;
        }
        node.attributes.iter().any(|a| {
            matches!(
                a.kind,
                crate::ast::AttributeKind::Expression | crate::ast::AttributeKind::Spread
            ) && scanner::contains_await(&a.value)
        })
    })
}

fn is_css_specifier(specifier: &str) -> bool {
    matches!(
        specifier.rsplit('.').next(),
        Some("css" | "pcss" | "postcss" | "sass" | "scss" | "styl" | "stylus" | "less")
    )
}

/// Pull the `assert { … }` clause out of an import statement, `{}` if none.
fn extract_import_assertion(text: &str) -> String {
    for keyword in [" assert ", " assert{", " with ", " with{"] {
        if let Some(pos) = text.find(keyword) {
            let rest = &text[pos..];
            if let Some(open) = rest.find('{') {
                let mut depth = 0usize;
                for (i, c) in rest[open..].char_indices() {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                let clause = &rest[open..=open + i];
                                return clause.split_whitespace().collect::<String>();
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }
    "{}".to_string()
}

/// Derive the component variable name from the filename.
fn get_component_name(filename: Option<&str>) -> String {
    let Some(filename) = filename else {
        return "$$Component".to_string();
    };
    let part = filename.rsplit('/').next().unwrap_or("");
    let stem = part.split('.').next().unwrap_or(part);

    let pascal = stem
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let upper: String = first.to_uppercase().collect();
                    format!("{upper}{}", chars.as_str())
                }
                None => String::new(),
            }
        })
        .collect::<String>();

    if pascal.is_empty() || pascal == "Astro" {
        return "$$Component".to_string();
    }
    format!("$${pascal}")
}

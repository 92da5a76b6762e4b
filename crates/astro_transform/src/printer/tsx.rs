//! TSX output for type-checking.
//!
//! Renders the authored document as a TypeScript-checkable module: the
//! frontmatter emitted verbatim (with a top-level `return` rewritten to
//! `throw` so the file stays parseable), the markup re-rendered as TSX, and
//! a synthesized component function stub so language tooling can resolve
//! `Props`.

use crate::ast::{AttributeKind, Document, NodeId, NodeKind, Span};
use crate::options::TransformOptions;
use crate::scanner::FrontmatterAnalysis;

use super::result::TransformResult;
use super::sourcemap_builder::SourcemapBuilder;

/// The name of the synthesized default export in TSX output.
const COMPONENT_STUB_NAME: &str = "__AstroComponent_";

/// Render a document as a TSX module for type-checking.
pub fn print_tsx(
    doc: &Document,
    source: &str,
    options: &TransformOptions,
    analysis: &FrontmatterAnalysis,
) -> TransformResult {
    let mut printer = TsxPrinter {
        doc,
        source,
        code: String::with_capacity(source.len() + 128),
        sourcemap: options.sourcemap.is_enabled().then(|| {
            SourcemapBuilder::new(options.filename.as_deref().unwrap_or("<stdin>"), source)
        }),
    };

    let frontmatter = doc.frontmatter();
    let mut props_type = "Record<string, any>";
    if let Some(fm) = frontmatter {
        let content = &doc.node(fm).content;
        if declares_props_type(content) {
            props_type = "Props";
        }
        printer.print_frontmatter(fm, analysis.top_level_return);
    }

    printer.print_markup();
    printer.code.push_str(&format!(
        "\nexport default function {COMPONENT_STUB_NAME}(_props: {props_type}): any {{}}\n"
    ));

    let mut code = printer.code;
    let map = match printer.sourcemap.map(SourcemapBuilder::into_sourcemap) {
        Some(map) => {
            let mut external = String::new();
            if options.sourcemap.wants_external() {
                external = map.to_json_string();
            }
            if options.sourcemap.wants_inline() {
                code.push_str("\n//# sourceMappingURL=");
                code.push_str(&map.to_data_url());
            }
            external
        }
        None => String::new(),
    };

    TransformResult {
        code,
        map,
        scope: String::new(),
        diagnostics: Vec::new(),
        css: Vec::new(),
        scripts: Vec::new(),
        hydrated_components: Vec::new(),
        client_only_components: Vec::new(),
        server_components: Vec::new(),
        hydration_directives: Vec::new(),
        contains_head: false,
        propagation: false,
    }
}

/// A `Props` declaration anywhere in the frontmatter makes the stub use it.
fn declares_props_type(frontmatter: &str) -> bool {
    frontmatter.contains("interface Props")
        || frontmatter.contains("type Props ")
        || frontmatter.contains("type Props=")
        || frontmatter.contains("type Props<")
}

/// Text that would be misparsed as JSX syntax must be wrapped in a template
/// literal expression.
fn is_ambiguous_text(text: &str) -> bool {
    text.contains(['{', '}', '<', '>', '`'])
}

fn escape_tsx_template(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}

struct TsxPrinter<'a> {
    doc: &'a Document,
    source: &'a str,
    code: String,
    sourcemap: Option<SourcemapBuilder<'a>>,
}

impl TsxPrinter<'_> {
    fn print(&mut self, s: &str) {
        self.code.push_str(s);
    }

    fn map_span(&mut self, span: Span) {
        if let Some(sm) = &mut self.sourcemap {
            sm.add_source_mapping_for_span(self.code.as_bytes(), span);
        }
    }

    /// Frontmatter is emitted verbatim, mapped line by line. A top-level
    /// `return` becomes `throw ` (same byte length) so TypeScript still
    /// parses the file.
    fn print_frontmatter(&mut self, id: NodeId, top_level_return: Option<u32>) {
        let node = self.doc.node(id);
        let mut content = node.content.clone();
        if let Some(offset) = top_level_return {
            let offset = offset as usize;
            if content[offset..].starts_with("return") {
                content.replace_range(offset..offset + "return".len(), "throw ");
            }
        }

        let mut source_offset = node.span.start as usize;
        // Skip the opening fence when the span covers it.
        if self.source[source_offset..].starts_with("---") {
            source_offset += 3;
        }
        for line in content.split_inclusive('\n') {
            if let Some(sm) = &mut self.sourcemap {
                sm.add_source_mapping_force(
                    self.code.as_bytes(),
                    u32::try_from(source_offset).unwrap_or(u32::MAX),
                );
            }
            self.print(line);
            source_offset += line.len();
        }
        if !self.code.ends_with('\n') {
            self.print("\n");
        }
        self.print("\n");
    }

    fn print_markup(&mut self) {
        let children: Vec<NodeId> = self
            .doc
            .children(self.doc.root)
            .into_iter()
            .filter(|&c| self.doc.node(c).kind != NodeKind::Frontmatter)
            .collect();
        if children.is_empty() {
            return;
        }

        self.print("<Fragment>\n");
        for child in children {
            self.print_node(child);
        }
        self.print("\n</Fragment>;\n");
    }

    fn print_node(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        match node.kind {
            NodeKind::Document | NodeKind::Frontmatter | NodeKind::Doctype => {}
            NodeKind::Text => self.print_text(id),
            NodeKind::Raw => {
                let content = self.doc.node(id).content.clone();
                self.map_span(node.span);
                self.print(&content);
            }
            NodeKind::Comment => {
                let content = self.doc.node(id).content.replace("*/", "* /");
                self.map_span(node.span);
                self.print("{/*");
                self.print(&content);
                self.print("*/}");
            }
            NodeKind::Element => {
                if node.is_expression {
                    self.print_expression(id);
                } else {
                    self.print_element(id);
                }
            }
        }
    }

    fn print_text(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        let content = node.content.clone();
        self.map_span(node.span);
        if is_ambiguous_text(&content) {
            self.print("{`");
            self.print(&escape_tsx_template(&content));
            self.print("`}");
        } else {
            self.print(&content);
        }
    }

    fn print_expression(&mut self, id: NodeId) {
        self.map_span(self.doc.node(id).span);
        self.print("{");
        for child in self.doc.children(id) {
            let node = self.doc.node(child);
            if node.kind == NodeKind::Text {
                // Raw JavaScript chunk.
                let content = node.content.clone();
                self.map_span(node.span);
                self.print(&content);
            } else {
                self.print_node(child);
            }
        }
        self.print("}");
    }

    fn print_element(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        let tag = node.tag.clone();
        self.map_span(node.span);

        if node.is_fragment && tag.is_empty() {
            self.print("<>");
            for child in self.doc.children(id) {
                self.print_node(child);
            }
            self.print("</>");
            return;
        }

        self.print("<");
        self.print(&tag);
        self.print_attributes(id);

        let children = self.doc.children(id);
        if children.is_empty() {
            self.print(" />");
            return;
        }
        self.print(">");
        for child in children {
            self.print_node(child);
        }
        if let Some(close) = self.doc.node(id).close_span {
            self.map_span(close);
        }
        self.print("</");
        self.print(&tag);
        self.print(">");
    }

    fn print_attributes(&mut self, id: NodeId) {
        let attrs = self.doc.node(id).attributes.clone();
        for attr in &attrs {
            self.map_span(attr.key_span);
            match attr.kind {
                AttributeKind::Quoted => {
                    let value = attr.value.replace('"', "&quot;");
                    self.print(&format!(" {}=\"{value}\"", attr.key));
                }
                AttributeKind::Empty => self.print(&format!(" {}", attr.key)),
                AttributeKind::Expression => {
                    self.print(&format!(" {}={{{}}}", attr.key, attr.value));
                }
                AttributeKind::Spread => self.print(&format!(" {{...({})}}", attr.value)),
                AttributeKind::Shorthand => {
                    self.print(&format!(" {}={{{}}}", attr.key, attr.key));
                }
                AttributeKind::TemplateLiteral => {
                    self.print(&format!(" {}={{`{}`}}", attr.key, attr.value));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Attribute;
    use crate::scanner::scan_frontmatter;

    fn options() -> TransformOptions {
        TransformOptions::new()
    }

    #[test]
    fn stub_uses_declared_props_interface() {
        let mut doc = Document::new();
        let fm = doc.new_frontmatter("interface Props { name: string }\n");
        doc.append_child(doc.root, fm);

        let analysis = scan_frontmatter("interface Props { name: string }\n");
        let result = print_tsx(&doc, "", &options(), &analysis);
        assert!(result
            .code
            .contains("export default function __AstroComponent_(_props: Props): any {}"));
    }

    #[test]
    fn stub_falls_back_to_record_type() {
        let doc = Document::new();
        let analysis = FrontmatterAnalysis::default();
        let result = print_tsx(&doc, "", &options(), &analysis);
        assert!(result.code.contains("_props: Record<string, any>"));
    }

    #[test]
    fn top_level_return_becomes_throw() {
        let body = "if (!ok) return Astro.redirect('/');\n";
        let mut doc = Document::new();
        let fm = doc.new_frontmatter(body);
        doc.append_child(doc.root, fm);

        let analysis = scan_frontmatter(body);
        let result = print_tsx(&doc, "", &options(), &analysis);
        assert!(result.code.contains("throw  Astro.redirect") || result.code.contains("throw "));
        assert!(!result.code.contains("return Astro.redirect"));
    }

    #[test]
    fn ambiguous_text_is_wrapped() {
        let mut doc = Document::new();
        let div = doc.new_element("div");
        let text = doc.new_text("a < b and { braces }");
        doc.append_child(doc.root, div);
        doc.append_child(div, text);

        let analysis = FrontmatterAnalysis::default();
        let result = print_tsx(&doc, "", &options(), &analysis);
        assert!(result.code.contains("{`a < b and { braces }`}"));
    }

    #[test]
    fn childless_elements_self_close() {
        let mut doc = Document::new();
        let br = doc.new_element("br");
        doc.append_child(doc.root, br);

        let analysis = FrontmatterAnalysis::default();
        let result = print_tsx(&doc, "", &options(), &analysis);
        assert!(result.code.contains("<br />"));
    }

    #[test]
    fn attributes_render_in_jsx_form() {
        let mut doc = Document::new();
        let div = doc.new_element("div");
        doc.node_mut(div).attributes = vec![
            Attribute::quoted("id", "x"),
            Attribute::expression("title", "t"),
            Attribute::spread("rest"),
        ];
        doc.append_child(doc.root, div);

        let analysis = FrontmatterAnalysis::default();
        let result = print_tsx(&doc, "", &options(), &analysis);
        assert!(result.code.contains("<div id=\"x\" title={t} {...(rest)} />"));
    }
}

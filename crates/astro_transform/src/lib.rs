//! Astro Transform
//!
//! Rewrites a parsed component tree (style scoping and hoisting, script
//! hoisting, hydration directives, `set:*` normalization, head extraction)
//! and prints it to one of four targets: a runnable JavaScript module, a
//! TSX stub for type-checking, a debug JSON AST, or the extracted CSS.
//!
//! ## Output Format
//!
//! The generated JavaScript follows the Astro compiler output format:
//!
//! ```js
//! import { Fragment, render as $$render, ... } from "astro/runtime/server/index.js";
//! // User imports from frontmatter
//!
//! const $$Component = $$createComponent(($$result, $$props, $$slots) => {
//!     // Non-import frontmatter code
//!     return $$render`...template...`;
//! }, 'filename', undefined);
//! export default $$Component;
//! ```

pub mod ast;
mod css_scoping;
mod diagnostic;
mod hash;
mod options;
mod printer;
pub(crate) mod scanner;
mod transform;

pub use ast::{Attribute, AttributeKind, Document, Node, NodeId, NodeKind, Span};
pub use css_scoping::scope_css;
pub use diagnostic::{
    CompileError, Diagnostic, DiagnosticCode, DiagnosticLabel, DiagnosticSeverity,
};
pub use options::{ScopedStyleStrategy, SourcemapOption, TransformOptions};
pub use printer::result::{
    HoistedScriptType, TransformResult, TransformResultHoistedScript,
    TransformResultHydratedComponent,
};

fn frontmatter_analysis(doc: &Document) -> scanner::FrontmatterAnalysis {
    let text = doc
        .frontmatter()
        .map(|id| doc.node(id).content.clone())
        .unwrap_or_default();
    scanner::scan_frontmatter(&text)
}

/// Transform a parsed document and print it as a runnable JavaScript module.
///
/// Mutates the tree in place (hoisting, scoping, directive normalization),
/// then renders it with an optional source map per
/// [`TransformOptions::sourcemap`].
///
/// # Errors
///
/// Returns a [`CompileError`] for unrecoverable inputs: an unresolvable
/// `client:only` component, a top-level `return`, or an `export` after body
/// statements. Everything recoverable lands in
/// [`TransformResult::diagnostics`].
pub fn transform(
    doc: &mut Document,
    source: &str,
    options: &TransformOptions,
) -> Result<TransformResult, CompileError> {
    let analysis = frontmatter_analysis(doc);
    let ctx = transform::apply(doc, source, options, &analysis)?;
    printer::print_module(doc, source, options, &analysis, ctx)
}

/// Render the authored document as a TSX module for type-checking.
///
/// Operates on the untransformed tree; only `code` and `map` are populated
/// on the result.
pub fn convert_to_tsx(doc: &Document, source: &str, options: &TransformOptions) -> TransformResult {
    let analysis = frontmatter_analysis(doc);
    printer::tsx::print_tsx(doc, source, options, &analysis)
}

/// Serialize the document tree as a debug JSON string. Positions (1-based
/// line/column plus byte offset) are included only when requested.
pub fn convert_to_json(doc: &Document, source: &str, include_positions: bool) -> String {
    printer::json::print_json(doc, source, include_positions)
}

/// Run the transform and return only the rewritten style texts, in authored
/// order.
///
/// # Errors
///
/// Same failure modes as [`transform`].
pub fn extract_css(
    doc: &mut Document,
    source: &str,
    options: &TransformOptions,
) -> Result<Vec<String>, CompileError> {
    let analysis = frontmatter_analysis(doc);
    transform::apply(doc, source, options, &analysis)?;
    Ok(doc
        .styles
        .iter()
        .map(|&id| doc.node(id).content.clone())
        .collect())
}

//! Public output types for component code generation.

use crate::diagnostic::Diagnostic;

/// The type of a hoisted script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoistedScriptType {
    /// An inline script with code content.
    Inline,
    /// An external script with a `src` URL.
    External,
}

/// A hoisted script extracted from the template.
#[derive(Debug, Clone)]
pub struct TransformResultHoistedScript {
    /// The script type: inline or external.
    pub script_type: HoistedScriptType,
    /// The inline script code (when `script_type` is `Inline`).
    pub code: Option<String>,
    /// The external script src URL (when `script_type` is `External`).
    pub src: Option<String>,
}

/// A hydrated component reference found in the template.
#[derive(Debug, Clone)]
pub struct TransformResultHydratedComponent {
    /// The export name from the module (e.g. `"default"` or a named export).
    pub export_name: String,
    /// The local variable name used in the component.
    pub local_name: String,
    /// The import specifier (e.g. `"../components/Counter.jsx"`).
    pub specifier: String,
    /// The resolved path (via the `resolve_path` callback or the path-join
    /// fallback; equals the specifier when neither applies).
    pub resolved_path: String,
}

/// Output from a component compilation.
#[derive(Debug)]
pub struct TransformResult {
    /// The generated JavaScript code.
    pub code: String,
    /// Source map JSON string.
    ///
    /// Populated when `TransformOptions::sourcemap` requests an external map;
    /// empty otherwise. Inline maps are appended to `code` as a data URL.
    pub map: String,
    /// Scope hash for the component.
    pub scope: String,
    /// Diagnostic messages from compilation.
    pub diagnostics: Vec<Diagnostic>,
    /// Rewritten CSS from extracted `<style>` tags, in authored order.
    pub css: Vec<String>,
    /// Hoisted scripts extracted from the template.
    pub scripts: Vec<TransformResultHoistedScript>,
    /// Components with `client:*` hydration directives (except `client:only`).
    pub hydrated_components: Vec<TransformResultHydratedComponent>,
    /// Components with the `client:only` directive.
    pub client_only_components: Vec<TransformResultHydratedComponent>,
    /// Components with a `server:*` directive.
    pub server_components: Vec<TransformResultHydratedComponent>,
    /// Hydration directive names seen, in first-seen order.
    pub hydration_directives: Vec<String>,
    /// Whether the template contains an explicit `<head>` element.
    pub contains_head: bool,
    /// Whether the component propagates head content (view transitions).
    pub propagation: bool,
}

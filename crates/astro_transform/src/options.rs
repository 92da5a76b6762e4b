//! Options controlling the transform and printer passes.

/// Scoped style strategy for CSS scoping.
///
/// Determines how scoped CSS selectors are bound to the component's markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopedStyleStrategy {
    /// Use a `:where([data-astro-scope="XXXX"])` selector (default); the
    /// markup side carries a matching quoted attribute.
    #[default]
    Where,
    /// Use a `.astro-XXXX` class selector; the markup side merges the class
    /// into each element's `class`/`class:list`.
    Class,
    /// Use a `[data-astro-cid-XXXX]` attribute selector; the markup side
    /// carries a matching boolean attribute.
    Attribute,
}

/// Source map emission mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourcemapOption {
    /// No source map.
    #[default]
    None,
    /// Emit the map as standalone JSON in the result.
    External,
    /// Append a `sourceMappingURL` data-URL comment to the generated code.
    Inline,
    /// Both of the above.
    Both,
}

impl SourcemapOption {
    pub fn is_enabled(self) -> bool {
        self != Self::None
    }

    pub fn wants_external(self) -> bool {
        matches!(self, Self::External | Self::Both)
    }

    pub fn wants_inline(self) -> bool {
        matches!(self, Self::Inline | Self::Both)
    }
}

/// Options for a single component compilation.
pub struct TransformOptions {
    /// The filename of the component being compiled.
    /// Used in `$$createComponent` for debugging and scope hash computation.
    pub filename: Option<String>,

    /// A normalized version of the filename used for scope hash generation.
    /// If not provided, falls back to `filename`.
    pub normalized_filename: Option<String>,

    /// The import specifier for the server runtime.
    /// Defaults to `"astro/runtime/server/index.js"`.
    pub internal_url: Option<String>,

    /// Source map emission mode.
    pub sourcemap: SourcemapOption,

    /// Arguments passed to `$$createAstro` when the `Astro` global is used.
    /// Defaults to `"https://astro.build"`.
    pub astro_global_args: Option<String>,

    /// Collapse inter-element whitespace in the HTML output.
    pub compact: bool,

    /// When `true`, slot callbacks receive the render context parameter:
    /// `($$result) => ...` instead of `() => ...`.
    pub result_scoped_slot: bool,

    /// Strategy for CSS scoping.
    pub scoped_style_strategy: ScopedStyleStrategy,

    /// URL for the view transitions animation CSS.
    /// Defaults to `"astro/components/viewtransitions.css"`.
    pub transitions_animation_url: Option<String>,

    /// Annotate rendered elements with their source file and location.
    pub annotate_source_file: bool,

    /// Render hoisted scripts in place through the script runtime helper
    /// instead of removing them from the markup.
    pub render_script: bool,

    /// Whether to strip HTML comments from component slot children.
    ///
    /// When `true` (default), HTML comments inside component children are not
    /// included in slot content. Comments in regular HTML elements are always
    /// preserved.
    pub strip_slot_comments: bool,

    /// Custom path resolver function.
    ///
    /// When provided, it is called for each import specifier to produce the
    /// `resolved_path` on component metadata. When `None`, relative
    /// specifiers are joined against the filename's directory and bare
    /// specifiers pass through unchanged.
    ///
    /// Note: `has_resolve_path()` (used to skip `$$metadata` emission) is true
    /// when either this field is `Some` or `resolve_path_provided` is `true`.
    #[expect(clippy::type_complexity)]
    pub resolve_path: Option<Box<dyn Fn(&str) -> String + Send + Sync>>,

    /// Signal that the caller resolves paths itself (e.g. through a callback
    /// handled after compilation). Skips `$$metadata` emission like
    /// `resolve_path`, while still using the path-join fallback for
    /// `resolved_path` values.
    pub resolve_path_provided: bool,

    /// Override the derived scope id. Intended for callers that precompute
    /// scopes (and for deterministic tests).
    pub scope: Option<String>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            filename: None,
            normalized_filename: None,
            internal_url: None,
            sourcemap: SourcemapOption::None,
            astro_global_args: None,
            compact: false,
            result_scoped_slot: false,
            scoped_style_strategy: ScopedStyleStrategy::default(),
            transitions_animation_url: None,
            annotate_source_file: false,
            render_script: false,
            strip_slot_comments: true,
            resolve_path: None,
            resolve_path_provided: false,
            scope: None,
        }
    }
}

impl std::fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformOptions")
            .field("filename", &self.filename)
            .field("normalized_filename", &self.normalized_filename)
            .field("internal_url", &self.internal_url)
            .field("sourcemap", &self.sourcemap)
            .field("astro_global_args", &self.astro_global_args)
            .field("compact", &self.compact)
            .field("result_scoped_slot", &self.result_scoped_slot)
            .field("scoped_style_strategy", &self.scoped_style_strategy)
            .field("transitions_animation_url", &self.transitions_animation_url)
            .field("annotate_source_file", &self.annotate_source_file)
            .field("render_script", &self.render_script)
            .field("strip_slot_comments", &self.strip_slot_comments)
            .field(
                "resolve_path",
                &self.resolve_path.as_ref().map(|_| "Some(<fn>)"),
            )
            .field("resolve_path_provided", &self.resolve_path_provided)
            .field("scope", &self.scope)
            .finish()
    }
}

impl TransformOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the normalized filename for scope hash generation.
    #[must_use]
    pub fn with_normalized_filename(mut self, filename: impl Into<String>) -> Self {
        self.normalized_filename = Some(filename.into());
        self
    }

    /// Set the import specifier for the server runtime.
    #[must_use]
    pub fn with_internal_url(mut self, url: impl Into<String>) -> Self {
        self.internal_url = Some(url.into());
        self
    }

    /// Set the source map emission mode.
    #[must_use]
    pub fn with_sourcemap(mut self, sourcemap: SourcemapOption) -> Self {
        self.sourcemap = sourcemap;
        self
    }

    /// Set the `$$createAstro` arguments.
    #[must_use]
    pub fn with_astro_global_args(mut self, args: impl Into<String>) -> Self {
        self.astro_global_args = Some(args.into());
        self
    }

    /// Enable or disable compact whitespace mode.
    #[must_use]
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Enable or disable scoped slot result handling.
    #[must_use]
    pub fn with_result_scoped_slot(mut self, enabled: bool) -> Self {
        self.result_scoped_slot = enabled;
        self
    }

    /// Set the scoped style strategy.
    #[must_use]
    pub fn with_scoped_style_strategy(mut self, strategy: ScopedStyleStrategy) -> Self {
        self.scoped_style_strategy = strategy;
        self
    }

    /// Set the view transitions animation URL.
    #[must_use]
    pub fn with_transitions_animation_url(mut self, url: impl Into<String>) -> Self {
        self.transitions_animation_url = Some(url.into());
        self
    }

    /// Enable or disable source location annotation.
    #[must_use]
    pub fn with_annotate_source_file(mut self, enabled: bool) -> Self {
        self.annotate_source_file = enabled;
        self
    }

    /// Enable or disable render-in-place mode for hoisted scripts.
    #[must_use]
    pub fn with_render_script(mut self, enabled: bool) -> Self {
        self.render_script = enabled;
        self
    }

    /// Set whether to strip HTML comments from component slot children.
    #[must_use]
    pub fn with_strip_slot_comments(mut self, strip: bool) -> Self {
        self.strip_slot_comments = strip;
        self
    }

    /// Set a custom path resolver function.
    ///
    /// When set, `$$metadata`/`$$createMetadata` emission is skipped and
    /// paths resolve at compile time instead of at runtime.
    #[must_use]
    pub fn with_resolve_path(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.resolve_path = Some(Box::new(f));
        self
    }

    /// Override the derived scope id.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Returns true if a `resolve_path` function is provided (directly or signaled).
    ///
    /// When true, `$$metadata`/`$$createMetadata` emission is skipped.
    pub fn has_resolve_path(&self) -> bool {
        self.resolve_path.is_some() || self.resolve_path_provided
    }

    /// Resolve an import specifier to a path.
    ///
    /// Uses the custom `resolve_path` function if provided, otherwise joins
    /// relative specifiers (starting with `.`) against the directory of the
    /// filename. Bare specifiers and `<stdin>` inputs pass through unchanged.
    pub fn resolve_specifier(&self, specifier: &str) -> String {
        if let Some(resolve_fn) = &self.resolve_path {
            resolve_fn(specifier)
        } else if let Some(filename) = &self.filename
            && filename != "<stdin>"
            && specifier.starts_with('.')
        {
            let dir = std::path::Path::new(filename)
                .parent()
                .unwrap_or(std::path::Path::new(""));
            let joined = dir.join(specifier);
            normalize_path(&joined)
        } else {
            specifier.to_string()
        }
    }

    /// Get the internal URL, with default fallback.
    pub fn get_internal_url(&self) -> &str {
        self.internal_url
            .as_deref()
            .unwrap_or("astro/runtime/server/index.js")
    }

    /// Get the view transitions animation CSS URL, with default fallback.
    pub fn get_transitions_animation_url(&self) -> &str {
        self.transitions_animation_url
            .as_deref()
            .unwrap_or("astro/components/viewtransitions.css")
    }

    /// The scope id for this compilation: the explicit override if set,
    /// otherwise a hash of the normalized filename (falling back to the
    /// filename, then the source text).
    pub fn scope_for(&self, source: &str) -> String {
        if let Some(scope) = &self.scope {
            return scope.clone();
        }
        let input = self
            .normalized_filename
            .as_deref()
            .or(self.filename.as_deref())
            .unwrap_or(source);
        crate::hash::hash_string(input)
    }
}

/// Normalize a path by resolving `.` and `..` segments (without touching the
/// filesystem).
fn normalize_path(path: &std::path::Path) -> String {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                if !components.is_empty()
                    && !matches!(components.last(), Some(std::path::Component::ParentDir))
                {
                    components.pop();
                } else {
                    components.push(component);
                }
            }
            _ => components.push(component),
        }
    }
    let result: std::path::PathBuf = components.iter().collect();
    let s = result.to_string_lossy().to_string();
    s.replace('\\', "/")
}

//! Unified diagnostic types.
//!
//! These types are the source of truth for everything the pipeline reports.
//! Recoverable conditions become [`Diagnostic`]s collected on the result;
//! unrecoverable ones become a typed [`CompileError`] and abort the
//! compilation.

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Information,
    Hint,
}

/// Stable machine-readable code identifying a diagnostic condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCode {
    /// The `hoist` script attribute is deprecated; hoisting is automatic.
    DeprecatedHoistAttribute,
    /// A hoistable `<script>` has an expression-valued `src`; it is dropped.
    ScriptSrcExpression,
    /// A stylesheet failed to parse and was passed through unscoped.
    CssParseError,
    /// An element carries more than one `client:*` directive.
    ConflictingClientDirectives,
    /// A `client:*` directive on a plain HTML element has no effect.
    ClientDirectiveOnElement,
    /// `define:vars` with no resolvable variable names or no element to
    /// carry the generated bindings.
    EmptyDefineVars,
    /// A `slot` attribute value could not be statically resolved.
    DynamicSlotName,
    /// A `<script>` with extra attributes is treated as inline.
    ImplicitInlineScript,
    /// `set:html`/`set:text` replaced existing element children.
    SetDirectiveDiscardsChildren,
}

/// A labeled source span within a diagnostic.
#[derive(Debug, Clone)]
pub struct DiagnosticLabel {
    /// Optional label text (e.g. "expected closing tag here").
    pub text: Option<String>,
    /// Byte offset of the span start.
    pub start: u32,
    /// Byte offset of the span end (exclusive).
    pub end: u32,
    /// 1-based line number.
    pub line: u32,
    /// 0-based column number.
    pub column: u32,
}

impl DiagnosticLabel {
    /// Create a label from byte offsets, computing line/column from source text.
    pub fn new(text: Option<String>, start: u32, end: u32, source_text: &str) -> Self {
        let (line, column) = byte_offset_to_line_column(source_text, start as usize);
        Self {
            text,
            start,
            end,
            line,
            column,
        }
    }
}

/// A single diagnostic message produced by the pipeline.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: DiagnosticSeverity,
    /// Human-readable message text.
    pub text: String,
    /// Optional hint/suggestion for fixing the issue.
    pub hint: String,
    /// Labeled source spans.
    pub labels: Vec<DiagnosticLabel>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, severity: DiagnosticSeverity, text: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            text: text.into(),
            hint: String::new(),
            labels: Vec::new(),
        }
    }

    pub fn warning(code: DiagnosticCode, text: impl Into<String>) -> Self {
        Self::new(code, DiagnosticSeverity::Warning, text)
    }

    pub fn hint_level(code: DiagnosticCode, text: impl Into<String>) -> Self {
        Self::new(code, DiagnosticSeverity::Hint, text)
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: DiagnosticLabel) -> Self {
        self.labels.push(label);
        self
    }
}

/// Unrecoverable compilation failures. Everything else is reported through
/// [`Diagnostic`]s with a defined fallback behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A `client:only` component whose name matches no frontmatter import.
    UnresolvedClientOnly { component: String },
    /// A top-level `return` in the frontmatter body (runnable-module target).
    TopLevelReturn,
    /// An `export` statement appearing after non-import body statements.
    ExportAfterBody,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedClientOnly { component } => write!(
                f,
                "unable to match client:only component \"{component}\" to an import"
            ),
            Self::TopLevelReturn => {
                write!(f, "top-level return is not allowed in the component script")
            }
            Self::ExportAfterBody => write!(
                f,
                "exports must come before any other statements in the component script"
            ),
        }
    }
}

impl std::error::Error for CompileError {}

/// Convert a UTF-8 byte offset to a 1-based line and 0-based column.
pub(crate) fn byte_offset_to_line_column(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 0u32;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (line, col)
}

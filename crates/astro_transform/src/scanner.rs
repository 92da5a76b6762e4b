//! Frontmatter statement scanner.
//!
//! Splits the component script into import statements, hoisted exports and
//! the remaining body without a full JavaScript parse: a small lexer tracks
//! strings, template literals, comments and bracket depth, and statements
//! are delimited at top-level `;` (with a newline heuristic for
//! semicolon-free code). The same lexer drives `await`/`Astro` detection in
//! markup expressions.

/// A single binding introduced by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// The local name the binding is usable under.
    pub local: String,
    /// The export it maps to: `"default"`, `"*"` for namespace imports, or
    /// the named export.
    pub imported: String,
}

/// One `import` statement from the frontmatter.
#[derive(Debug, Clone)]
pub struct ImportStatement {
    /// The statement text, verbatim.
    pub text: String,
    /// The module specifier.
    pub specifier: String,
    pub bindings: Vec<ImportBinding>,
    /// TypeScript `import type` — carried in output but never a component.
    pub is_type_only: bool,
}

impl ImportStatement {
    /// Find the export name a local name resolves to, if this statement
    /// introduces it. Dotted names resolve through their namespace root.
    pub fn resolve(&self, local: &str) -> Option<String> {
        let root = local.split('.').next().unwrap_or(local);
        for binding in &self.bindings {
            if binding.local == root {
                if binding.imported == "*" && local.contains('.') {
                    // `ns.Member` through a namespace import exports `Member`.
                    return local.split('.').nth(1).map(ToString::to_string);
                }
                return Some(binding.imported.clone());
            }
        }
        None
    }
}

/// The scanner's view of a frontmatter script.
#[derive(Debug, Default)]
pub struct FrontmatterAnalysis {
    pub imports: Vec<ImportStatement>,
    /// Hoisted `export` statement texts, in order.
    pub exports: Vec<String>,
    /// Remaining statements, joined in source order.
    pub body: String,
    /// Byte offset of a top-level `return`, if any.
    pub top_level_return: Option<u32>,
    /// An `export` appeared after non-import body code.
    pub export_after_body: bool,
    pub uses_astro_global: bool,
    pub has_await: bool,
}

/// Scan a frontmatter script into its statement partition.
pub fn scan_frontmatter(source: &str) -> FrontmatterAnalysis {
    let mut analysis = FrontmatterAnalysis::default();
    let mut lexer = Lexer::new(source);
    let mut body_parts: Vec<&str> = Vec::new();
    let mut body_started = false;

    loop {
        lexer.skip_trivia();
        if lexer.at_end() {
            break;
        }
        let start = lexer.pos;
        let word = lexer.peek_word();
        match word {
            "import" if lexer.is_import_statement() => {
                let text = lexer.read_statement();
                analysis.imports.push(parse_import(text));
            }
            "export" => {
                let text = lexer.read_statement();
                if body_started {
                    analysis.export_after_body = true;
                }
                analysis.exports.push(text.trim_end().to_string());
            }
            _ => {
                if word == "return" && analysis.top_level_return.is_none() {
                    analysis.top_level_return = Some(start as u32);
                }
                let text = lexer.read_statement();
                body_parts.push(text.trim_end());
                body_started = true;
            }
        }
    }

    analysis.body = body_parts.join("\n");
    analysis.uses_astro_global = uses_astro_global(source);
    analysis.has_await = contains_word(source, "await");
    analysis
}

/// Whether a code fragment references the `Astro` global.
pub fn uses_astro_global(code: &str) -> bool {
    contains_word(code, "Astro")
}

/// Whether a code fragment contains a top-level or nested `await`.
pub fn contains_await(code: &str) -> bool {
    contains_word(code, "await")
}

/// Extract the property names of an object-literal expression, in order.
/// Computed keys and spreads contribute nothing.
pub fn extract_object_keys(expression: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let trimmed = expression.trim();
    let Some(inner) = trimmed.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
        return keys;
    };

    let mut lexer = Lexer::new(inner);
    let mut at_property = true;
    while !lexer.at_end() {
        lexer.skip_trivia();
        if lexer.at_end() {
            break;
        }
        if at_property {
            at_property = false;
            let c = lexer.peek();
            match c {
                '\'' | '"' => {
                    let quoted = lexer.read_string_literal();
                    keys.push(quoted);
                    continue;
                }
                '[' | '.' => {}
                _ => {
                    let word = lexer.peek_word();
                    if !word.is_empty() {
                        keys.push(word.to_string());
                        lexer.pos += word.len();
                        continue;
                    }
                }
            }
        }
        // Skip to the comma separating this property from the next.
        match lexer.peek() {
            ',' => {
                lexer.pos += 1;
                at_property = true;
            }
            _ => lexer.advance_code_unit(),
        }
    }
    keys
}

/// Whether `word` occurs as a standalone identifier in code regions (outside
/// strings and comments; template interpolations count as code).
fn contains_word(code: &str, word: &str) -> bool {
    let mut found = false;
    walk_code_words(code, |w, preceded_by_dot| {
        if w == word && !preceded_by_dot {
            found = true;
        }
    });
    found
}

fn walk_code_words(code: &str, mut f: impl FnMut(&str, bool)) {
    let mut lexer = Lexer::new(code);
    let mut prev_sig = '\0';
    while !lexer.at_end() {
        lexer.skip_trivia();
        if lexer.at_end() {
            break;
        }
        let c = lexer.peek();
        if c == '_' || c == '$' || c.is_alphabetic() {
            let word = lexer.peek_word();
            f(word, prev_sig == '.');
            lexer.pos += word.len();
            prev_sig = 'a';
        } else {
            prev_sig = c;
            lexer.advance_code_unit();
        }
    }
}

fn parse_import(text: &str) -> ImportStatement {
    let mut lexer = Lexer::new(text);
    lexer.skip_trivia();
    lexer.expect_word("import");
    lexer.skip_trivia();

    let mut bindings = Vec::new();
    let mut is_type_only = false;
    let mut specifier = String::new();

    if matches!(lexer.peek(), '\'' | '"') {
        // Bare side-effect import.
        specifier = lexer.read_string_literal();
    } else {
        if lexer.peek_word() == "type" {
            // Distinguish `import type {A} from 'x'` from a default import
            // of a module member literally named `type`.
            let mut probe = lexer.clone();
            probe.pos += "type".len();
            probe.skip_trivia();
            if probe.peek_word() != "from" {
                is_type_only = true;
                lexer.pos += "type".len();
                lexer.skip_trivia();
            }
        }
        loop {
            lexer.skip_trivia();
            match lexer.peek() {
                '{' => {
                    lexer.pos += 1;
                    parse_named_imports(&mut lexer, &mut bindings);
                }
                '*' => {
                    lexer.pos += 1;
                    lexer.skip_trivia();
                    lexer.expect_word("as");
                    lexer.skip_trivia();
                    let local = lexer.take_word();
                    bindings.push(ImportBinding {
                        local,
                        imported: "*".to_string(),
                    });
                }
                ',' => {
                    lexer.pos += 1;
                    continue;
                }
                '\0' => break,
                _ => {
                    let word = lexer.take_word();
                    if word == "from" {
                        lexer.skip_trivia();
                        if matches!(lexer.peek(), '\'' | '"') {
                            specifier = lexer.read_string_literal();
                        }
                        break;
                    }
                    if word.is_empty() {
                        break;
                    }
                    bindings.push(ImportBinding {
                        local: word,
                        imported: "default".to_string(),
                    });
                }
            }
        }
    }

    ImportStatement {
        text: text.trim_end().to_string(),
        specifier,
        bindings,
        is_type_only,
    }
}

fn parse_named_imports(lexer: &mut Lexer<'_>, bindings: &mut Vec<ImportBinding>) {
    loop {
        lexer.skip_trivia();
        match lexer.peek() {
            '}' => {
                lexer.pos += 1;
                return;
            }
            ',' => {
                lexer.pos += 1;
            }
            '\0' => return,
            _ => {
                let mut imported = lexer.take_word();
                if imported == "type" {
                    // Type-only named import; parse but don't record.
                    lexer.skip_trivia();
                    let _ = lexer.take_word();
                    skip_as_clause(lexer);
                    continue;
                }
                if imported.is_empty() {
                    lexer.advance_code_unit();
                    continue;
                }
                let mut local = imported.clone();
                lexer.skip_trivia();
                if lexer.peek_word() == "as" {
                    lexer.pos += 2;
                    lexer.skip_trivia();
                    local = lexer.take_word();
                }
                if imported == "default" && local != "default" {
                    imported = "default".to_string();
                }
                bindings.push(ImportBinding { local, imported });
            }
        }
    }
}

fn skip_as_clause(lexer: &mut Lexer<'_>) {
    lexer.skip_trivia();
    if lexer.peek_word() == "as" {
        lexer.pos += 2;
        lexer.skip_trivia();
        let _ = lexer.take_word();
    }
}

/// Characters that continue an expression across a newline.
const CONTINUATION: &str = ".+-*/%=<>?:,&|([`";

#[derive(Clone)]
struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> char {
        self.src[self.pos..].chars().next().unwrap_or('\0')
    }

    fn peek_at(&self, offset: usize) -> char {
        self.src[self.pos..]
            .chars()
            .nth(offset)
            .unwrap_or('\0')
    }

    fn advance_code_unit(&mut self) {
        match self.peek() {
            '\'' | '"' => {
                let _ = self.read_string_literal();
            }
            '`' => self.skip_template(),
            '(' => self.skip_balanced('(', ')'),
            '[' => self.skip_balanced('[', ']'),
            '{' => self.skip_balanced('{', '}'),
            c => self.pos += c.len_utf8(),
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) {
        loop {
            let c = self.peek();
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else if c == '/' && self.peek_at(1) == '/' {
                while !self.at_end() && self.peek() != '\n' {
                    self.pos += self.peek().len_utf8();
                }
            } else if c == '/' && self.peek_at(1) == '*' {
                self.pos += 2;
                while !self.at_end() && !(self.peek() == '*' && self.peek_at(1) == '/') {
                    self.pos += self.peek().len_utf8();
                }
                self.pos = (self.pos + 2).min(self.src.len());
            } else {
                return;
            }
        }
    }

    /// The identifier word at the cursor, without consuming it.
    fn peek_word(&self) -> &'a str {
        let rest = &self.src[self.pos..];
        let end = rest
            .char_indices()
            .find(|&(_, c)| !(c == '_' || c == '$' || c.is_alphanumeric()))
            .map_or(rest.len(), |(i, _)| i);
        &rest[..end]
    }

    fn take_word(&mut self) -> String {
        let word = self.peek_word().to_string();
        self.pos += word.len();
        word
    }

    fn expect_word(&mut self, word: &str) {
        if self.peek_word() == word {
            self.pos += word.len();
        }
    }

    /// `import` begins an import statement unless it is a dynamic import
    /// call or `import.meta`.
    fn is_import_statement(&self) -> bool {
        let mut probe = self.clone();
        probe.pos += "import".len();
        probe.skip_trivia();
        !matches!(probe.peek(), '(' | '.')
    }

    /// Consume one top-level statement, ending at a top-level `;` or at a
    /// newline where the expression cannot continue.
    fn read_statement(&mut self) -> &'a str {
        let start = self.pos;
        let mut last_sig = '\0';
        while !self.at_end() {
            let c = self.peek();
            match c {
                ';' => {
                    self.pos += 1;
                    break;
                }
                '\n' => {
                    self.pos += 1;
                    if statement_can_end(last_sig) && !self.next_line_continues() {
                        break;
                    }
                }
                '/' if self.peek_at(1) == '/' => {
                    // Leave the newline in place so it still ends the statement.
                    while !self.at_end() && self.peek() != '\n' {
                        self.pos += self.peek().len_utf8();
                    }
                }
                '/' if self.peek_at(1) == '*' => {
                    self.pos += 2;
                    while !self.at_end() && !(self.peek() == '*' && self.peek_at(1) == '/') {
                        self.pos += self.peek().len_utf8();
                    }
                    self.pos = (self.pos + 2).min(self.src.len());
                }
                c if c.is_whitespace() => self.pos += c.len_utf8(),
                _ => {
                    last_sig = c;
                    self.advance_code_unit();
                    if matches!(c, '\'' | '"' | '`' | ')' | ']' | '}') {
                        last_sig = c;
                    }
                }
            }
        }
        &self.src[start..self.pos]
    }

    fn next_line_continues(&self) -> bool {
        let mut probe = self.clone();
        probe.skip_trivia();
        let c = probe.peek();
        c != '\0' && CONTINUATION.contains(c)
    }

    /// Consume a quoted string and return its contents (without quotes).
    fn read_string_literal(&mut self) -> String {
        let quote = self.peek();
        self.pos += 1;
        let start = self.pos;
        while !self.at_end() {
            let c = self.peek();
            if c == '\\' {
                self.pos += 1;
                if !self.at_end() {
                    self.pos += self.peek().len_utf8();
                }
                continue;
            }
            if c == quote || c == '\n' {
                break;
            }
            self.pos += c.len_utf8();
        }
        let value = self.src[start..self.pos].to_string();
        if self.peek() == quote {
            self.pos += 1;
        }
        value
    }

    fn skip_template(&mut self) {
        self.pos += 1;
        while !self.at_end() {
            let c = self.peek();
            match c {
                '\\' => {
                    self.pos += 1;
                    if !self.at_end() {
                        self.pos += self.peek().len_utf8();
                    }
                }
                '`' => {
                    self.pos += 1;
                    return;
                }
                '$' if self.peek_at(1) == '{' => {
                    self.pos += 1;
                    self.skip_balanced('{', '}');
                }
                _ => self.pos += c.len_utf8(),
            }
        }
    }

    /// Consume from an opening delimiter through its matching close,
    /// honoring strings, templates and comments.
    fn skip_balanced(&mut self, open: char, close: char) {
        debug_assert_eq!(self.peek(), open);
        self.pos += 1;
        let mut depth = 1u32;
        while !self.at_end() && depth > 0 {
            let c = self.peek();
            if c == open {
                depth += 1;
                self.pos += 1;
            } else if c == close {
                depth -= 1;
                self.pos += 1;
            } else {
                match c {
                    '\'' | '"' => {
                        let _ = self.read_string_literal();
                    }
                    '`' => self.skip_template(),
                    '/' if matches!(self.peek_at(1), '/' | '*') => self.skip_trivia(),
                    _ => self.pos += c.len_utf8(),
                }
            }
        }
    }
}

/// Whether a statement ending in this character may terminate at a newline.
fn statement_can_end(last_sig: char) -> bool {
    last_sig == '_'
        || last_sig == '$'
        || last_sig.is_alphanumeric()
        || matches!(last_sig, ')' | ']' | '}' | '\'' | '"' | '`')
}

//! String escaping and HTML entity decoding.
//!
//! Pure functions with no printer state. Used to embed content inside
//! JavaScript template literals, HTML attributes and quoted strings.

use cow_utils::CowUtils;

/// Escape a string for safe embedding inside a JavaScript template literal.
///
/// Escapes backticks, `${` sequences, and backslashes.
pub fn escape_template_literal(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '`' => result.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => {
                result.push_str("\\$");
            }
            '\\' => result.push_str("\\\\"),
            _ => result.push(c),
        }
    }

    result
}

/// Escape double quotes for embedding inside a `"..."` string.
///
/// Only escapes `"` — backslashes are left alone because the inputs are
/// attribute values or markup text, which carry no escape sequences.
pub fn escape_double_quotes(s: &str) -> String {
    s.cow_replace('"', "\\\"").into_owned()
}

/// Escape single quotes for embedding inside a `'...'` string.
pub fn escape_single_quote(s: &str) -> String {
    s.cow_replace('\'', "\\'").into_owned()
}

/// Escape a string for use as an HTML attribute value inside a template
/// literal.
///
/// Escapes template literal syntax (`` ` `` and `${`), HTML special
/// characters (`"`, `<`, `>`), and ampersands that don't open an entity.
pub fn escape_html_attribute(s: &str) -> String {
    let s = s.cow_replace('`', "\\`");
    let s = s.cow_replace("${", "\\${");
    let s = escape_ampersands(&s);
    let s = s.cow_replace('"', "&quot;");
    let s = s.cow_replace('<', "&lt;");
    s.cow_replace('>', "&gt;").into_owned()
}

/// Escape ampersands, preserving anything that reads as an entity start.
fn escape_ampersands(s: &str) -> std::borrow::Cow<'_, str> {
    if !s.contains('&') {
        return std::borrow::Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    let mut i = 0;
    let bytes = s.as_bytes();

    while i < bytes.len() {
        if bytes[i] == b'&' {
            if is_entity_start(&s[i..]) {
                result.push('&');
            } else {
                result.push_str("&amp;");
            }
            i += 1;
        } else {
            let c = s[i..].chars().next().unwrap_or('\0');
            result.push(c);
            i += c.len_utf8().max(1);
        }
    }

    std::borrow::Cow::Owned(result)
}

/// Decode HTML entities: numeric (`&#x3C;`, `&#60;`) and the named entities
/// in [`NAMED_ENTITIES`].
pub fn decode_html_entities(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '&' {
            let mut entity = String::new();
            entity.push(c);

            while let Some(&next) = chars.peek() {
                entity.push(next);
                chars.next();
                if next == ';' {
                    break;
                }
                if !next.is_ascii_alphanumeric() && next != '#' {
                    break;
                }
            }

            if let Some(decoded) = decode_entity(&entity) {
                result.push(decoded);
            } else {
                result.push_str(&entity);
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Named entities recognized by [`decode_html_entities`], sorted by name.
const NAMED_ENTITIES: &[(&str, char)] = &[
    ("AMP", '&'),
    ("GT", '>'),
    ("LT", '<'),
    ("QUOT", '"'),
    ("amp", '&'),
    ("apos", '\''),
    ("bull", '\u{2022}'),
    ("copy", '\u{a9}'),
    ("deg", '\u{b0}'),
    ("gt", '>'),
    ("hellip", '\u{2026}'),
    ("laquo", '\u{ab}'),
    ("ldquo", '\u{201c}'),
    ("lsquo", '\u{2018}'),
    ("lt", '<'),
    ("mdash", '\u{2014}'),
    ("middot", '\u{b7}'),
    ("nbsp", '\u{a0}'),
    ("ndash", '\u{2013}'),
    ("quot", '"'),
    ("raquo", '\u{bb}'),
    ("rdquo", '\u{201d}'),
    ("reg", '\u{ae}'),
    ("rsquo", '\u{2019}'),
    ("sect", '\u{a7}'),
    ("times", '\u{d7}'),
    ("trade", '\u{2122}'),
];

fn decode_entity(entity: &str) -> Option<char> {
    if !entity.starts_with('&') || !entity.ends_with(';') {
        return None;
    }

    let inner = &entity[1..entity.len() - 1];

    if let Some(hex) = inner
        .strip_prefix("#x")
        .or_else(|| inner.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = inner.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }

    NAMED_ENTITIES
        .binary_search_by_key(&inner, |&(name, _)| name)
        .ok()
        .map(|i| NAMED_ENTITIES[i].1)
}

/// Whether a string starting with `&` looks like an entity reference.
///
/// Intentionally permissive: `&word` without a trailing `;` is treated as a
/// potential entity so URL query strings like `&q=75` are not over-escaped.
fn is_entity_start(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('&') else {
        return false;
    };

    if rest.is_empty() {
        return false;
    }

    if let Some(after_hash) = rest.strip_prefix('#') {
        if let Some(hex_part) = after_hash
            .strip_prefix('x')
            .or_else(|| after_hash.strip_prefix('X'))
        {
            return hex_part
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_hexdigit());
        }
        return after_hash
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());
    }

    rest.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_literal_escaping() {
        assert_eq!(escape_template_literal("a`b"), "a\\`b");
        assert_eq!(escape_template_literal("${x}"), "\\${x}");
        assert_eq!(escape_template_literal("a\\b"), "a\\\\b");
        assert_eq!(escape_template_literal("$5 and $x"), "$5 and $x");
    }

    #[test]
    fn quote_escaping() {
        assert_eq!(escape_double_quotes("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_single_quote("it's"), "it\\'s");
    }

    #[test]
    fn attribute_escaping() {
        assert_eq!(escape_html_attribute("a<b>c"), "a&lt;b&gt;c");
        assert_eq!(escape_html_attribute("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape_html_attribute("`${x}`"), "\\`\\${x}\\`");
    }

    #[test]
    fn ampersands_preserve_entities() {
        assert_eq!(escape_html_attribute("a & b"), "a &amp; b");
        assert_eq!(escape_html_attribute("&quot;x"), "&quot;x");
        assert_eq!(escape_html_attribute("&#x22;"), "&#x22;");
        // Query strings are left alone.
        assert_eq!(escape_html_attribute("?w=100&q=75"), "?w=100&q=75");
    }

    #[test]
    fn entity_decoding() {
        assert_eq!(decode_html_entities("&lt;div&gt;"), "<div>");
        assert_eq!(decode_html_entities("&#x3C;"), "<");
        assert_eq!(decode_html_entities("&#60;"), "<");
        assert_eq!(decode_html_entities("&nope;"), "&nope;");
        assert_eq!(decode_html_entities("fish &amp; chips"), "fish & chips");
    }

    #[test]
    fn named_entities_are_sorted() {
        // binary_search_by_key requires strict ordering.
        for pair in NAMED_ENTITIES.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }
}

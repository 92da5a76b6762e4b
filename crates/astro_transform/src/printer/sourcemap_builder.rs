//! Source map accumulation for the printer.
//!
//! Maps generated output positions back to positions in the original
//! component source. The printer appends to a single output buffer and
//! registers a mapping whenever it starts emitting bytes that correspond to
//! a source span; generated positions are tracked incrementally by scanning
//! only the bytes added since the last mapping.

use crate::ast::Span;

pub struct SourcemapBuilder<'a> {
    /// The source id assigned by the inner builder.
    source_id: u32,
    /// The original component source text.
    original_source: &'a str,
    /// `line_starts[i]` is the byte offset of the first character on line
    /// `i` (0-indexed).
    line_starts: Vec<u32>,
    inner: oxc_sourcemap::SourceMapBuilder,

    /// Output length when the generated position was last updated.
    last_generated_update: usize,
    /// Current generated line (0-indexed).
    generated_line: u32,
    /// Current generated column (0-indexed, UTF-16 code units).
    generated_column: u32,
    /// Last original position mapped, for consecutive-position dedup.
    last_position: Option<u32>,
}

impl<'a> SourcemapBuilder<'a> {
    /// `source_path` is the filename recorded in the map's `sources` array.
    pub fn new(source_path: &str, source_text: &'a str) -> Self {
        let mut inner = oxc_sourcemap::SourceMapBuilder::default();
        let source_id = inner.set_source_and_content(source_path, source_text);
        let line_starts = compute_line_starts(source_text);
        Self {
            source_id,
            original_source: source_text,
            line_starts,
            inner,
            last_generated_update: 0,
            generated_line: 0,
            generated_column: 0,
            last_position: None,
        }
    }

    /// Consume the builder and produce the final map.
    pub fn into_sourcemap(self) -> oxc_sourcemap::SourceMap {
        self.inner.into_sourcemap()
    }

    /// Map the current generated position to `original_position` (a byte
    /// offset into the component source).
    ///
    /// `output` is the current contents of the generated code buffer.
    pub fn add_source_mapping(&mut self, output: &[u8], original_position: u32) {
        self.add_source_mapping_impl(output, original_position);
    }

    /// Like [`add_source_mapping`](Self::add_source_mapping), but bypasses
    /// the consecutive-position dedup. Used when several generated lines all
    /// originate from one source span.
    pub fn add_source_mapping_force(&mut self, output: &[u8], original_position: u32) {
        self.last_position = None;
        self.add_source_mapping_impl(output, original_position);
    }

    /// Record a mapping with no original position at all. Marks synthesized
    /// runtime glue so downstream tools don't attribute it to the nearest
    /// preceding source token.
    pub fn add_nil_mapping(&mut self, output: &[u8]) {
        self.update_generated_line_and_column(output);
        self.inner
            .add_token(self.generated_line, self.generated_column, 0, 0, None, None);
        self.last_position = None;
    }

    /// Map using a span's start position; empty spans are ignored.
    pub fn add_source_mapping_for_span(&mut self, output: &[u8], span: Span) {
        if !span.is_empty() {
            self.add_source_mapping(output, span.start);
        }
    }

    fn add_source_mapping_impl(&mut self, output: &[u8], original_position: u32) {
        if self.last_position == Some(original_position) {
            return;
        }

        let original_position =
            original_position.min(u32::try_from(self.original_source.len()).unwrap_or(u32::MAX));

        let (original_line, original_column) = self.byte_offset_to_line_column(original_position);
        self.update_generated_line_and_column(output);

        self.inner.add_token(
            self.generated_line,
            self.generated_column,
            original_line,
            original_column,
            Some(self.source_id),
            None,
        );

        self.last_position = Some(original_position);
    }

    /// Convert a byte offset in the original source to a 0-indexed
    /// (line, column) pair, with the column in UTF-16 code units.
    #[expect(clippy::cast_possible_truncation)]
    fn byte_offset_to_line_column(&self, byte_offset: u32) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&byte_offset) {
            Ok(exact) => exact,
            Err(insert_pos) => insert_pos.saturating_sub(1),
        };

        let line_start = self.line_starts[line] as usize;
        let end = (byte_offset as usize).min(self.original_source.len());
        let segment = &self.original_source.as_bytes()[line_start..end];

        let column = if segment.iter().all(u8::is_ascii) {
            segment.len() as u32
        } else {
            self.original_source[line_start..end].encode_utf16().count() as u32
        };

        (line as u32, column)
    }

    /// Advance the generated position over the bytes appended to `output`
    /// since the previous call.
    #[expect(clippy::cast_possible_truncation)]
    fn update_generated_line_and_column(&mut self, output: &[u8]) {
        let start = self.last_generated_update;
        if start >= output.len() {
            self.last_generated_update = output.len();
            return;
        }

        let new_bytes = &output[start..];
        let mut last_newline_pos = None;
        let mut newline_count: u32 = 0;

        let mut i = 0;
        while i < new_bytes.len() {
            let b = new_bytes[i];
            if b == b'\n' {
                newline_count += 1;
                last_newline_pos = Some(i);
            } else if b == b'\r' {
                newline_count += 1;
                // \r\n counts once; land on the \n.
                if new_bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                last_newline_pos = Some(i);
            }
            i += 1;
        }

        if let Some(last_nl) = last_newline_pos {
            self.generated_line += newline_count;
            let after = &new_bytes[last_nl + 1..];
            self.generated_column = if after.iter().all(u8::is_ascii) {
                after.len() as u32
            } else {
                std::str::from_utf8(after)
                    .map_or(0, |s| s.encode_utf16().count() as u32)
            };
        } else if new_bytes.iter().all(u8::is_ascii) {
            self.generated_column += new_bytes.len() as u32;
        } else {
            self.generated_column += std::str::from_utf8(new_bytes)
                .map_or(0, |s| s.encode_utf16().count() as u32);
        }

        self.last_generated_update = output.len();
    }
}

#[expect(clippy::cast_possible_truncation)]
fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            starts.push((i + 1) as u32);
        } else if b == b'\r' {
            if source.as_bytes().get(i + 1) == Some(&b'\n') {
                // The \n pushes the line start.
                continue;
            }
            starts.push((i + 1) as u32);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_starts_lf_and_crlf() {
        assert_eq!(compute_line_starts("line1\nline2\nline3"), vec![0, 6, 12]);
        assert_eq!(compute_line_starts("line1\r\nline2\r\nline3"), vec![0, 7, 14]);
    }

    #[test]
    fn offset_to_line_column() {
        let source = "abc\ndef\nghi";
        let builder = SourcemapBuilder::new("test.astro", source);

        assert_eq!(builder.byte_offset_to_line_column(0), (0, 0));
        assert_eq!(builder.byte_offset_to_line_column(2), (0, 2));
        assert_eq!(builder.byte_offset_to_line_column(4), (1, 0));
        assert_eq!(builder.byte_offset_to_line_column(8), (2, 0));
        assert_eq!(builder.byte_offset_to_line_column(10), (2, 2));
    }

    #[test]
    fn utf16_columns() {
        // '€' is 3 bytes but 1 UTF-16 unit.
        let source = "€x";
        let builder = SourcemapBuilder::new("test.astro", source);
        assert_eq!(builder.byte_offset_to_line_column(3), (0, 1));
    }

    #[test]
    fn basic_mapping() {
        let source = "hello\nworld";
        let mut builder = SourcemapBuilder::new("test.astro", source);

        builder.add_source_mapping(b"const x = 'hello';\n", 0);

        let map = builder.into_sourcemap();
        let tokens: Vec<_> = map.get_tokens().collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].get_src_line(), 0);
        assert_eq!(tokens[0].get_src_col(), 0);
    }

    #[test]
    fn consecutive_positions_dedup() {
        let source = "hello";
        let mut builder = SourcemapBuilder::new("test.astro", source);

        builder.add_source_mapping(b"a", 2);
        builder.add_source_mapping(b"ab", 2);
        builder.add_source_mapping_force(b"abc", 2);

        let map = builder.into_sourcemap();
        assert_eq!(map.get_tokens().count(), 2);
    }

    #[test]
    fn generated_position_tracks_output_growth() {
        let source = "one\ntwo";
        let mut builder = SourcemapBuilder::new("test.astro", source);

        builder.add_source_mapping(b"first line\n", 0);
        builder.add_source_mapping(b"first line\nsecond ", 4);

        let map = builder.into_sourcemap();
        let tokens: Vec<_> = map.get_tokens().collect();
        assert_eq!(tokens[1].get_dst_line(), 1);
        assert_eq!(tokens[1].get_dst_col(), 7);
        assert_eq!(tokens[1].get_src_line(), 1);
    }

    #[test]
    fn nil_mapping_has_no_source() {
        let mut builder = SourcemapBuilder::new("test.astro", "x");
        builder.add_nil_mapping(b"glue");
        let map = builder.into_sourcemap();
        let tokens: Vec<_> = map.get_tokens().collect();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].get_source_id().is_none());
    }
}

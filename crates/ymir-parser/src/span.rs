//! Line/column lookup for byte spans.
//!
//! The lexer and parser work in byte offsets; the comment dictionary and
//! rendered diagnostics need 1-based line and column numbers. A
//! [`LineIndex`] is built once per source file and converts between the
//! two.

use ymir_core::span::{LineColRange, SourcePosition, Span};

/// Precomputed line-start offsets for one source file.
#[derive(Debug)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build the index for `source`.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-based line number containing `offset`.
    pub fn line_of(&self, offset: usize) -> u32 {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        (line + 1) as u32
    }

    /// 1-based `(line, column)` of `offset`.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let line = self.line_of(offset);
        let line_start = self.line_starts[(line - 1) as usize];
        (line, (offset - line_start + 1) as u32)
    }

    /// Build a full [`SourcePosition`] for a span in `file`.
    pub fn position(&self, file: Option<&str>, span: Span) -> SourcePosition {
        let (start_line, start_col) = self.line_col(span.start());
        let end_offset = span.end().saturating_sub(1).max(span.start());
        let (end_line, end_col) = self.line_col(end_offset);

        SourcePosition::new(
            file.map(str::to_string),
            LineColRange::new(start_line, end_line),
            LineColRange::new(start_col, end_col),
            span,
        )
    }
}

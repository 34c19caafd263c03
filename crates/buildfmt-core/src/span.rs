//! Source positions and spans.
//!
//! Every token and tree node carries a [`Span`] made of two [`Position`]s.
//! A position records the byte offset together with the 1-based line and
//! column, so diagnostics can be reported without re-scanning the source.

use std::{fmt, ops::Range};

/// A location in the source text.
///
/// `line` and `column` are 1-based; `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    offset: usize,
    line: usize,
    column: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Byte offset from the start of the source.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 1-based line number.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column number, in characters.
    pub fn column(&self) -> usize {
        self.column
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(0, 1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open range of source text between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: Position,
    end: Position,
}

impl Span {
    /// Create a span from its two endpoints.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create an empty span at a single position.
    pub fn point(position: Position) -> Self {
        Self::new(position, position)
    }

    /// Get the start position of the span
    pub fn start(&self) -> Position {
        self.start
    }

    /// Get the end position of the span
    pub fn end(&self) -> Position {
        self.end
    }

    /// Get the length of the span in bytes
    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    /// The byte range covered by this span.
    pub fn range(&self) -> Range<usize> {
        self.start.offset..self.end.offset
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        let start = if other.start.offset < self.start.offset {
            other.start
        } else {
            self.start
        };
        let end = if other.end.offset > self.end.offset {
            other.end
        } else {
            self.end
        };
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Maps byte offsets of one source text to line/column [`Position`]s.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Build the index for `source`.
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Resolve a byte offset. Offsets past the end clamp to the end of input.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count())
            + 1;
        Position::new(offset, line, column)
    }

    /// Build a span from a byte range.
    pub fn span(&self, range: Range<usize>) -> Span {
        Span::new(self.position(range.start), self.position(range.end))
    }

    /// Position just past the last byte of the source.
    pub fn end(&self) -> Position {
        self.position(self.source.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_positions() {
        let index = LineIndex::new("ab\ncd\n\nef");

        assert_eq!(index.position(0), Position::new(0, 1, 1));
        assert_eq!(index.position(2), Position::new(2, 1, 3));
        assert_eq!(index.position(3), Position::new(3, 2, 1));
        assert_eq!(index.position(6), Position::new(6, 3, 1));
        assert_eq!(index.position(7), Position::new(7, 4, 1));
        assert_eq!(index.end(), Position::new(9, 4, 3));
    }

    #[test]
    fn test_line_index_counts_chars() {
        let index = LineIndex::new("é = 1");
        // `é` is two bytes but one column
        assert_eq!(index.position(2).column(), 2);
    }

    #[test]
    fn test_line_index_clamps() {
        let index = LineIndex::new("abc");
        assert_eq!(index.position(100), index.end());
    }

    #[test]
    fn test_span_union() {
        let index = LineIndex::new("hello world");
        let a = index.span(0..5);
        let b = index.span(6..11);

        let union = a.union(b);
        assert_eq!(union.range(), 0..11);
        assert_eq!(b.union(a), union);
        assert_eq!(union.len(), 11);
        assert!(!union.is_empty());
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(10, 3, 7).to_string(), "3:7");
    }
}

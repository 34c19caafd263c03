//! Comments and blank-line layout attached to tree nodes.

use crate::span::Span;

/// A single `#` comment, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    text: String,
    span: Span,
}

impl Comment {
    /// Create a comment. Trailing whitespace is trimmed from `text`.
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        let mut text = text.into();
        text.truncate(text.trim_end().len());
        Self { text, span }
    }

    /// The comment text, starting with `#`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the comment appeared in the source.
    pub fn span(&self) -> Span {
        self.span
    }
}

/// Layout information owned by a node.
///
/// * `before` holds own-line comments directly preceding the node.
/// * `suffix` holds comments on the node's last line, after the node.
/// * `after` holds comments that trail the node and belong to no later sibling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trivia {
    pub blank_lines_before: usize,
    pub before: Vec<Comment>,
    pub suffix: Vec<Comment>,
    pub after: Vec<Comment>,
}

impl Trivia {
    /// Returns `true` if any comment is attached.
    pub fn has_comments(&self) -> bool {
        !(self.before.is_empty() && self.suffix.is_empty() && self.after.is_empty())
    }

    /// Returns `true` if there are no comments and no recorded blank lines.
    pub fn is_empty(&self) -> bool {
        self.blank_lines_before == 0 && !self.has_comments()
    }

    /// Move every comment out of this trivia, in source order.
    ///
    /// The blank-line count is left untouched.
    pub fn take_comments(&mut self) -> Vec<Comment> {
        let mut comments = std::mem::take(&mut self.before);
        comments.append(&mut self.suffix);
        comments.append(&mut self.after);
        comments
    }

    /// Append the comments of `other` after the ones already held here.
    pub fn absorb(&mut self, mut other: Trivia) {
        self.before.append(&mut other.before);
        self.suffix.append(&mut other.suffix);
        self.after.append(&mut other.after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(text: &str) -> Comment {
        Comment::new(text, Span::default())
    }

    #[test]
    fn test_comment_trims_trailing_whitespace() {
        assert_eq!(comment("# hello  \t").text(), "# hello");
    }

    #[test]
    fn test_trivia_take_comments_keeps_order() {
        let mut trivia = Trivia {
            blank_lines_before: 1,
            before: vec![comment("# a")],
            suffix: vec![comment("# b")],
            after: vec![comment("# c")],
        };
        assert!(trivia.has_comments());

        let taken: Vec<_> = trivia
            .take_comments()
            .iter()
            .map(|c| c.text().to_string())
            .collect();
        assert_eq!(taken, ["# a", "# b", "# c"]);
        assert!(!trivia.has_comments());
        assert!(!trivia.is_empty());
        assert_eq!(trivia.blank_lines_before, 1);
    }

    #[test]
    fn test_trivia_absorb() {
        let mut first = Trivia {
            suffix: vec![comment("# one")],
            ..Trivia::default()
        };
        first.absorb(Trivia {
            suffix: vec![comment("# two")],
            ..Trivia::default()
        });
        assert_eq!(first.suffix.len(), 2);
        assert_eq!(first.suffix[1].text(), "# two");
    }
}

//! [`Diagnostic`] and its [`Label`]s.

use std::fmt;

use buildfmt_core::Span;

use crate::error::ErrorCode;

/// A source location a diagnostic points at.
///
/// The primary label marks the offending token; secondary labels mark
/// related places, such as the bracket a missing `)` would close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    span: Span,
    message: String,
    primary: bool,
}

impl Label {
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.primary
    }
}

/// A parse failure with a code, labelled spans and an optional hint.
///
/// Rendered by the CLI as:
///
/// ```text
/// error[E101]: unclosed `(`, expected expression
///   --> pkg/BUILD:1:17
///    |
///  1 | go_library(name=
///    |           -     ^ input ends here
///    |           |
///    |           unclosed `(` opened here
///    |
///    = help: add the missing `)`
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    message: String,
    code: Option<ErrorCode>,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            labels: Vec::new(),
            help: None,
        }
    }

    pub fn with_code(self, code: ErrorCode) -> Self {
        Self {
            code: Some(code),
            ..self
        }
    }

    pub fn with_label(self, span: Span, message: impl Into<String>) -> Self {
        self.labelled(span, message.into(), true)
    }

    pub fn with_secondary_label(self, span: Span, message: impl Into<String>) -> Self {
        self.labelled(span, message.into(), false)
    }

    pub fn with_help(self, help: impl Into<String>) -> Self {
        Self {
            help: Some(help.into()),
            ..self
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Span of the first primary label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.primary)
            .map(|label| label.span)
    }

    fn labelled(mut self, span: Span, message: String, primary: bool) -> Self {
        self.labels.push(Label {
            span,
            message,
            primary,
        });
        self
    }
}

/// `error[E101]: message (1:17)`
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "error[{code}]: {}", self.message)?,
            None => write!(f, "error: {}", self.message)?,
        }
        match self.primary_span() {
            Some(span) => write!(f, " ({})", span.start()),
            None => Ok(()),
        }
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use buildfmt_core::LineIndex;

    use super::*;

    #[test]
    fn test_bare_diagnostic() {
        let diag = Diagnostic::error("unexpected `)`");

        assert_eq!(diag.message(), "unexpected `)`");
        assert_eq!(diag.code(), None);
        assert!(diag.labels().is_empty());
        assert_eq!(diag.help(), None);
        assert_eq!(diag.primary_span(), None);
        assert_eq!(diag.to_string(), "error: unexpected `)`");
    }

    #[test]
    fn test_unclosed_bracket() {
        let index = LineIndex::new("go_library(name=");
        let diag = Diagnostic::error("unclosed `(`, expected expression")
            .with_code(ErrorCode::E101)
            .with_secondary_label(index.span(10..11), "unclosed `(` opened here")
            .with_label(index.span(16..16), "input ends here")
            .with_help("add the missing `)`");

        let [opened, end] = diag.labels() else {
            panic!("expected two labels");
        };
        assert!(opened.is_secondary());
        assert_eq!(opened.span().start().column(), 11);
        assert!(end.is_primary());
        assert_eq!(end.message(), "input ends here");

        assert_eq!(diag.primary_span().map(|s| s.start().offset()), Some(16));
        assert_eq!(diag.help(), Some("add the missing `)`"));
        assert_eq!(
            diag.to_string(),
            "error[E101]: unclosed `(`, expected expression (1:17)"
        );
    }
}

use thiserror::Error;

use crate::error::Diagnostic;

/// Returned when a BUILD file cannot be parsed. No partial tree accompanies
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summary(.diagnostics))]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

fn summary(diagnostics: &[Diagnostic]) -> String {
    let Some(first) = diagnostics.first() else {
        return "parse failed".to_string();
    };
    match diagnostics.len() - 1 {
        0 => first.to_string(),
        more => format!("{first} (+{more} more)"),
    }
}

impl ParseError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The diagnostic that stopped parsing.
    pub fn first(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }
}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        vec![diagnostic].into()
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_single_diagnostic() {
        let err = ParseError::from(Diagnostic::error("unexpected `)`").with_code(ErrorCode::E100));

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.first().and_then(Diagnostic::code), Some(ErrorCode::E100));
        assert_eq!(err.to_string(), "error[E100]: unexpected `)`");
    }

    #[test]
    fn test_summary_counts_the_rest() {
        let err = ParseError::from(vec![
            Diagnostic::error("first error"),
            Diagnostic::error("second error"),
        ]);
        assert_eq!(err.to_string(), "error: first error (+1 more)");
        assert_eq!(ParseError::from(Vec::new()).to_string(), "parse failed");
    }
}

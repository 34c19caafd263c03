//! Stable codes for parse diagnostics.
//!
//! `E0xx` codes come from the lexer, `E1xx` codes from the parser.

use std::fmt;

/// The kind of problem a [`Diagnostic`](super::Diagnostic) reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A string was never closed. Single-line strings must close on the line
    /// they start on.
    E001,
    /// A character that starts no token.
    E002,
    /// A malformed `\x`, `\u` or `\U` escape, or one that names no Unicode
    /// scalar value.
    E004,
    /// The input is not UTF-8.
    E007,
    /// A token the grammar does not allow here.
    E100,
    /// The input ended inside a construct, usually an unclosed bracket.
    E101,
    /// A `load` call whose arguments are not a module string followed by
    /// symbol strings or `alias = "symbol"` pairs.
    E102,
    /// Expressions nested deeper than the parser accepts.
    E103,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::E001,
        ErrorCode::E002,
        ErrorCode::E004,
        ErrorCode::E007,
        ErrorCode::E100,
        ErrorCode::E101,
        ErrorCode::E102,
        ErrorCode::E103,
    ];

    /// The code as printed, e.g. `"E101"`.
    pub fn as_str(self) -> &'static str {
        self.entry().0
    }

    /// A few words on what the code means.
    pub fn description(self) -> &'static str {
        self.entry().1
    }

    /// Whether the code is raised while tokenizing.
    pub fn is_lexical(self) -> bool {
        self.as_str().starts_with("E0")
    }

    fn entry(self) -> (&'static str, &'static str) {
        match self {
            ErrorCode::E001 => ("E001", "unterminated string literal"),
            ErrorCode::E002 => ("E002", "unexpected character"),
            ErrorCode::E004 => ("E004", "invalid escape sequence"),
            ErrorCode::E007 => ("E007", "invalid UTF-8"),
            ErrorCode::E100 => ("E100", "unexpected token"),
            ErrorCode::E101 => ("E101", "incomplete input"),
            ErrorCode::E102 => ("E102", "invalid load statement"),
            ErrorCode::E103 => ("E103", "nesting too deep"),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

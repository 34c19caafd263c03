//! # buildfmt parser
//!
//! Lexer and parser for BUILD files. This crate turns source text into the
//! [`buildfmt_core::File`] tree, keeping every comment attached to a node.
//!
//! ## Usage
//!
//! ```
//! # use buildfmt_parser::{parse, ParseError};
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//! go_library(
//!     name = "server",
//!     srcs = ["main.go"],
//! )
//! "#;
//!
//!     let file = parse("cmd/server/BUILD", source)?;
//!     assert_eq!(file.rules("go_library").count(), 1);
//!     Ok(())
//! }
//! ```

pub mod error;
mod lexer;
mod parser;
mod tokens;

pub use error::{Diagnostic, ErrorCode, ParseError};

use buildfmt_core::{File, LineIndex, Position, Span};
use log::{debug, trace};

/// Parse BUILD source text.
///
/// `path` is the logical location of the file; it is stored on the result and
/// used by path-sensitive rewrites.
///
/// The pipeline has two steps:
///
/// 1. **Tokenize** - Convert source text to tokens
/// 2. **Parse** - Build the statement tree and attach comments
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first malformed construct. No
/// partial tree is produced.
pub fn parse(path: &str, source: &str) -> Result<File, ParseError> {
    debug!(path, bytes = source.len(); "Parsing BUILD file");

    let tokens = lexer::tokenize(source)?;
    trace!(tokens = tokens.len(); "Tokenized");

    let file = parser::parse_tokens(path, source, tokens)?;
    Ok(file)
}

/// Parse raw bytes, rejecting input that is not UTF-8.
///
/// # Errors
///
/// Returns an [`ErrorCode::E007`] diagnostic pointing at the first invalid
/// byte, or any error [`parse`] reports.
pub fn parse_bytes(path: &str, bytes: &[u8]) -> Result<File, ParseError> {
    let source = std::str::from_utf8(bytes).map_err(|err| {
        let valid = &bytes[..err.valid_up_to()];
        let prefix = std::str::from_utf8(valid).unwrap_or_default();
        let start = LineIndex::new(prefix).end();
        let len = err.error_len().unwrap_or(bytes.len() - err.valid_up_to());
        let end = Position::new(start.offset() + len, start.line(), start.column() + 1);

        Diagnostic::error("input is not valid UTF-8")
            .with_code(ErrorCode::E007)
            .with_label(Span::new(start, end), "invalid byte sequence")
            .with_help("save the file with UTF-8 encoding")
    })?;
    parse(path, source)
}

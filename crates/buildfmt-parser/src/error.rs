//! Parse diagnostics.
//!
//! Parsing stops at the first malformed construct, so a [`ParseError`]
//! normally carries exactly one [`Diagnostic`].
//!
//! ```
//! # use buildfmt_parser::error::{Diagnostic, ErrorCode};
//! # use buildfmt_core::LineIndex;
//! let source = "go_library(name=";
//! let index = LineIndex::new(source);
//!
//! let diag = Diagnostic::error("unclosed `(`, expected expression")
//!     .with_code(ErrorCode::E101)
//!     .with_label(index.span(16..16), "input ends here")
//!     .with_secondary_label(index.span(10..11), "unclosed `(` opened here");
//! assert_eq!(diag.labels().len(), 2);
//! ```

mod diagnostic;
mod error_code;
mod parse_error;

pub use diagnostic::{Diagnostic, Label};
pub use error_code::ErrorCode;
pub use parse_error::ParseError;

pub(crate) type Result<T> = std::result::Result<T, Diagnostic>;

//! Error types for buildfmt operations.
//!
//! This module provides the main error type [`BuildfmtError`] which wraps
//! the error conditions of the format pipeline.

use std::io;

use thiserror::Error;

use buildfmt_parser::ParseError;

/// The main error type for buildfmt operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text and path next to the structured
/// diagnostics, so a caller can render the error with source snippets.
#[derive(Debug, Error)]
pub enum BuildfmtError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{path}: {err}")]
    Parse {
        err: ParseError,
        src: String,
        path: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BuildfmtError {
    /// Create a new `Parse` error with the associated source code and path.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
            path: path.into(),
        }
    }
}

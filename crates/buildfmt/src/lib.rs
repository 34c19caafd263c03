//! buildfmt - a canonical formatter for BUILD files
//!
//! This library ties the parser, the rewrite passes and the printer together.
//! It performs no I/O; reading and writing files is left to the caller.

pub mod config;
pub mod format;
pub mod rewrite;

mod error;

pub use buildfmt_core::{Expr, ExprKind, File, Position, Rule, RuleBuilder, Span, Stmt, StmtKind};
pub use buildfmt_parser::{Diagnostic, ErrorCode, ParseError};

pub use error::BuildfmtError;
pub use rewrite::{RewriteEntry, RewriteInfo};

use log::{debug, info, trace};

use config::AppConfig;

/// Result of running the whole pipeline on one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    /// Canonical text of the input before any rewrite.
    pub reformatted: String,
    /// Canonical text after all enabled rewrites.
    pub formatted: String,
    /// Changes made by the rewrite passes.
    pub info: RewriteInfo,
}

/// Builder for parsing, rewriting and printing BUILD files.
///
/// # Examples
///
/// ```rust
/// use buildfmt::{BuildFormatter, config::AppConfig};
///
/// let source = "go_library(name = 'x', srcs = ['b.go', 'a.go'])\n";
///
/// let formatter = BuildFormatter::new(AppConfig::default());
/// let processed = formatter.process("pkg/BUILD", source)
///     .expect("Failed to parse");
///
/// assert!(processed.formatted.contains("\"a.go\",\n        \"b.go\","));
/// assert_eq!(processed.info.to_string(), "quote listsort");
/// ```
#[derive(Debug, Default)]
pub struct BuildFormatter {
    config: AppConfig,
}

impl BuildFormatter {
    /// Create a new formatter with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including the rewrite settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse source text into a file tree.
    ///
    /// # Arguments
    ///
    /// * `path` - Logical location of the file, used by path-sensitive rewrites
    /// * `source` - BUILD source text
    ///
    /// # Errors
    ///
    /// Returns `BuildfmtError::Parse` with the source attached for rendering.
    pub fn parse(&self, path: &str, source: &str) -> Result<File, BuildfmtError> {
        debug!(path; "Parsing BUILD file");
        let file = buildfmt_parser::parse(path, source)
            .map_err(|err| BuildfmtError::new_parse_error(err, source, path))?;
        trace!(stmts = file.stmts.len(); "Parsed file");
        Ok(file)
    }

    /// Run every enabled rewrite pass over `file`.
    pub fn rewrite(&self, file: &mut File) -> RewriteInfo {
        rewrite::rewrite(file, &self.config.rewrite)
    }

    /// Print `file` in canonical form.
    pub fn format(&self, file: &File) -> String {
        format::format(file)
    }

    /// Parse, print, rewrite and print again.
    ///
    /// # Errors
    ///
    /// Returns `BuildfmtError::Parse` for malformed input.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use buildfmt::BuildFormatter;
    ///
    /// let processed = BuildFormatter::default()
    ///     .process("BUILD", "x  =  [ 1 ]\n")
    ///     .expect("Failed to parse");
    ///
    /// assert_eq!(processed.reformatted, "x = [1]\n");
    /// assert_eq!(processed.formatted, processed.reformatted);
    /// assert!(processed.info.is_empty());
    /// ```
    pub fn process(&self, path: &str, source: &str) -> Result<Processed, BuildfmtError> {
        let mut file = self.parse(path, source)?;
        Ok(self.finish(&mut file))
    }

    /// Like [`process`](Self::process), for input that may not be UTF-8.
    ///
    /// # Errors
    ///
    /// Returns `BuildfmtError::Parse` for malformed or non-UTF-8 input.
    pub fn process_bytes(&self, path: &str, bytes: &[u8]) -> Result<Processed, BuildfmtError> {
        let mut file = buildfmt_parser::parse_bytes(path, bytes).map_err(|err| {
            BuildfmtError::new_parse_error(err, String::from_utf8_lossy(bytes), path)
        })?;
        Ok(self.finish(&mut file))
    }

    fn finish(&self, file: &mut File) -> Processed {
        let reformatted = self.format(file);
        let info = self.rewrite(file);
        let formatted = self.format(file);
        info!(path = file.path(), changes = info.len(); "Processed BUILD file");
        Processed {
            reformatted,
            formatted,
            info,
        }
    }
}

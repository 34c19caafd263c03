//! Rendering of [`BuildfmtError`] through miette.
//!
//! A parse error becomes one [`Report`] per diagnostic, each with its source
//! snippet and labels. Other errors become a single report without a snippet.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, GraphicalReportHandler, LabeledSpan, SourceSpan};

use buildfmt::{BuildfmtError, Diagnostic, Span};

/// One renderable error.
pub enum Report<'a> {
    /// A parser diagnostic pointing into `src`.
    Syntax {
        diag: &'a Diagnostic,
        src: &'a str,
        /// Shown before the message; empty for unnamed input.
        path: &'a str,
    },
    Other(&'a BuildfmtError),
}

impl fmt::Debug for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Syntax { diag, path, .. } => f
                .debug_struct("Syntax")
                .field("diag", diag)
                .field("path", path)
                .finish(),
            Report::Other(err) => f.debug_tuple("Other").field(err).finish(),
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Syntax { diag, path: "", .. } => f.write_str(diag.message()),
            Report::Syntax { diag, path, .. } => write!(f, "{path}: {}", diag.message()),
            Report::Other(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Report<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Report::Syntax { .. } => None,
            Report::Other(err) => err.source(),
        }
    }
}

impl MietteDiagnostic for Report<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code: Box<dyn fmt::Display + 'a> = match self {
            Report::Syntax { diag, .. } => Box::new(diag.code()?),
            Report::Other(BuildfmtError::Io(_)) => Box::new("buildfmt::io"),
            Report::Other(BuildfmtError::Config(_)) => Box::new("buildfmt::config"),
            Report::Other(BuildfmtError::Parse { .. }) => return None,
        };
        Some(code)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Report::Syntax { diag, .. } => diag.help().map(|h| Box::new(h) as Box<dyn fmt::Display>),
            Report::Other(_) => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Report::Syntax { src, .. } => Some(src as &dyn miette::SourceCode),
            Report::Other(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let Report::Syntax { diag, .. } = self else {
            return None;
        };
        if diag.labels().is_empty() {
            return None;
        }

        Some(Box::new(diag.labels().iter().map(|label| {
            let message = Some(label.message().to_string());
            let span = source_span(label.span());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

fn source_span(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().offset().into(), span.len())
}

/// Split `err` into the reports it renders as.
pub fn reports(err: &BuildfmtError) -> Vec<Report<'_>> {
    match err {
        BuildfmtError::Parse { err, src, path } => err
            .diagnostics()
            .iter()
            .map(|diag| Report::Syntax { diag, src, path })
            .collect(),
        other => vec![Report::Other(other)],
    }
}

/// Render every report of `err` with miette's graphical handler, falling back
/// to the plain message.
pub fn render(err: &BuildfmtError) -> Vec<String> {
    let handler = GraphicalReportHandler::new();
    reports(err)
        .iter()
        .map(|report| {
            let mut out = String::new();
            match handler.render_report(&mut out, report) {
                Ok(()) => out,
                Err(_) => report.to_string(),
            }
        })
        .collect()
}

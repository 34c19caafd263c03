//! buildfmt CLI library
//!
//! This module contains the driver around the [`buildfmt`] library: it reads
//! files (or standard input), runs the format pipeline on them in parallel,
//! and reports the results in the selected mode.

pub mod differ;
pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Mode};

use std::{
    fs,
    io::{self, Read, Write},
    path::Path,
};

use log::{debug, error, info};
use rayon::prelude::*;
use tempfile::NamedTempFile;
use thiserror::Error;

use buildfmt::{BuildFormatter, BuildfmtError, Processed, config::AppConfig};

use differ::Differ;

/// Files whose presence marks the root of a workspace.
const WORKSPACE_MARKERS: &[&str] = &["WORKSPACE", "WORKSPACE.bazel", "MODULE.bazel"];

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExitStatus {
    Success,
    SyntaxError,
    UsageError,
    RuntimeError,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::SyntaxError => 1,
            ExitStatus::UsageError => 2,
            ExitStatus::RuntimeError => 3,
        }
    }

    /// Status for a file that failed with `err`.
    fn of(err: &BuildfmtError) -> Self {
        match err {
            BuildfmtError::Parse { .. } => ExitStatus::SyntaxError,
            BuildfmtError::Io(_) => ExitStatus::RuntimeError,
            BuildfmtError::Config(_) => ExitStatus::UsageError,
        }
    }
}

/// Errors that stop the run before any file is processed.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Buildfmt(#[from] BuildfmtError),
}

impl CliError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CliError::Usage(_) => ExitStatus::UsageError,
            CliError::Buildfmt(err) => ExitStatus::of(err),
        }
    }
}

/// What happens to each processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Check,
    Diff,
    Fix,
    /// Standard input to standard output.
    Pipe,
}

/// A file read and run through the pipeline.
struct Outcome {
    name: String,
    data: Vec<u8>,
    processed: Processed,
}

/// Run the buildfmt CLI on the real standard streams.
///
/// # Errors
///
/// See [`run_with`].
pub fn run(args: &Args) -> Result<ExitStatus, CliError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with(args, &mut stdin.lock(), &mut stdout.lock())
}

/// Run the buildfmt CLI, reading standard input from `input` and writing
/// standard output to `output`.
///
/// Problems with individual files are reported and folded into the returned
/// [`ExitStatus`]; the most severe one wins.
///
/// # Errors
///
/// Returns [`CliError`] for invalid flag combinations and configuration
/// errors, before any file is touched.
pub fn run_with(
    args: &Args,
    input: &mut dyn Read,
    output: &mut dyn Write,
) -> Result<ExitStatus, CliError> {
    if args.path.is_some() && args.files.len() > 1 {
        return Err(CliError::Usage(
            "can only format one file when using --path".to_string(),
        ));
    }

    let formatter = BuildFormatter::new(app_config(args)?);
    let mode = args.mode();
    info!(files = args.files.len(), mode:? = mode; "Formatting BUILD files");

    if args.files.is_empty() {
        let action = match mode {
            Mode::Check => Action::Check,
            Mode::Diff => Action::Diff,
            Mode::Fix => Action::Pipe,
        };
        let mut data = Vec::new();
        input.read_to_end(&mut data).map_err(BuildfmtError::from)?;
        let path = args.path.clone().unwrap_or_default();
        let result = formatter
            .process_bytes(&path, &data)
            .map(|processed| Outcome {
                name: "stdin".to_string(),
                data,
                processed,
            });
        return Ok(report(args, action, vec![result], output));
    }

    let action = match mode {
        Mode::Check => Action::Check,
        Mode::Diff => Action::Diff,
        Mode::Fix => Action::Fix,
    };
    let results: Vec<_> = args
        .files
        .par_iter()
        .map(|name| process_file(&formatter, name, args.path.as_deref()))
        .collect();
    Ok(report(args, action, results, output))
}

/// Load the configuration file and layer the command-line settings over it.
fn app_config(args: &Args) -> Result<AppConfig, BuildfmtError> {
    let mut config = config::load_config(args.config.as_ref())?;
    config.rewrite = config
        .rewrite
        .with_disabled(args.disable.iter().cloned())
        .with_allow_sort(args.allow_sort.iter().cloned());
    config.validate()?;
    debug!(config:? = config; "Effective configuration");
    Ok(config)
}

fn process_file(
    formatter: &BuildFormatter,
    name: &str,
    path: Option<&str>,
) -> Result<Outcome, BuildfmtError> {
    let data = fs::read(name)?;
    let logical = match path {
        Some(path) => path.to_string(),
        None => workspace_path(name),
    };
    debug!(file = name, path = logical.as_str(); "Processing file");

    let processed = formatter.process_bytes(&logical, &data).map_err(|err| match err {
        // Report the file as named on the command line
        BuildfmtError::Parse { err, src, .. } => BuildfmtError::new_parse_error(err, src, name),
        other => other,
    })?;
    Ok(Outcome {
        name: name.to_string(),
        data,
        processed,
    })
}

/// The path of `file` relative to the enclosing workspace root, with `/`
/// separators, or `file` itself outside any workspace.
fn workspace_path(file: &str) -> String {
    let Ok(absolute) = fs::canonicalize(file) else {
        return file.replace('\\', "/");
    };

    for dir in absolute.ancestors().skip(1) {
        if !WORKSPACE_MARKERS.iter().any(|marker| dir.join(marker).is_file()) {
            continue;
        }
        if let Ok(relative) = absolute.strip_prefix(dir) {
            return relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
        }
    }
    file.replace('\\', "/")
}

/// Report results in input order and compute the exit status.
fn report(
    args: &Args,
    action: Action,
    results: Vec<Result<Outcome, BuildfmtError>>,
    output: &mut dyn Write,
) -> ExitStatus {
    let differ = Differ::find();
    let mut status = ExitStatus::Success;

    for result in results {
        let applied = result.and_then(|outcome| apply(args, action, &differ, &outcome, output));
        if let Err(err) = applied {
            for rendered in error_adapter::render(&err) {
                error!("{rendered}");
            }
            status = status.max(ExitStatus::of(&err));
        }
    }
    status
}

fn apply(
    args: &Args,
    action: Action,
    differ: &Differ,
    outcome: &Outcome,
    output: &mut dyn Write,
) -> Result<(), BuildfmtError> {
    let Outcome {
        name,
        data,
        processed,
    } = outcome;
    let formatted = processed.formatted.as_bytes();

    match action {
        Action::Pipe => output.write_all(formatted)?,
        _ if data.as_slice() == formatted => {
            debug!(file = name.as_str(); "Already formatted");
        }
        Action::Check => writeln!(output, "{}", check_line(args, outcome))?,
        Action::Diff => {
            let new = write_temp(formatted)?;
            let old = match name.as_str() {
                "stdin" => Some(write_temp(data)?),
                _ => None,
            };
            let old_path = old.as_ref().map_or(Path::new(name), |file| file.path());
            output.write_all(&differ.show(old_path, new.path())?)?;
        }
        Action::Fix => {
            fs::write(name, formatted)?;
            info!(file = name.as_str(); "Fixed file");
            if args.verbose {
                eprintln!("fixed {name}");
            }
        }
    }
    Ok(())
}

/// `file # [reformat] <passes>[ <log>]`
fn check_line(args: &Args, outcome: &Outcome) -> String {
    let reformat = if outcome.data != outcome.processed.reformatted.as_bytes() {
        " reformat"
    } else {
        ""
    };

    let mut line = format!("{} #{reformat} {}", outcome.name, outcome.processed.info);
    if args.showlog && !outcome.processed.info.is_empty() {
        let mut log = outcome.processed.info.log();
        log.sort();
        log.dedup();
        line.push(' ');
        line.push_str(&log.join(" "));
    }
    line
}

fn write_temp(data: &[u8]) -> Result<NamedTempFile, BuildfmtError> {
    let mut file = tempfile::Builder::new().prefix("buildfmt-tmp-").tempfile()?;
    file.write_all(data)?;
    file.flush()?;
    Ok(file)
}

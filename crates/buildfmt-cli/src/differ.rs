//! External diff program used by `--mode diff`.

use std::{env, io, path::Path, process::Command};

use log::debug;

/// Environment variable naming the diff command, with arguments.
pub const DIFF_ENV: &str = "BUILDFMT_DIFF";

const DEFAULT_COMMAND: &[&str] = &["diff", "-u"];

/// A diff command line; the two file names are appended when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Differ {
    command: Vec<String>,
}

impl Differ {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
        }
    }

    /// The command from [`DIFF_ENV`], or `diff -u` when it is unset or blank.
    pub fn find() -> Self {
        match env::var(DIFF_ENV) {
            Ok(command) if !command.trim().is_empty() => {
                debug!(command = command.as_str(); "Using diff command from environment");
                Self::new(command.split_whitespace())
            }
            _ => Self::new(DEFAULT_COMMAND.iter().copied()),
        }
    }

    /// Run the command on `old` and `new` and return what it printed.
    ///
    /// A non-zero exit status is expected when the files differ and is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the command is empty or cannot be started.
    pub fn show(&self, old: &Path, new: &Path) -> io::Result<Vec<u8>> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty diff command"))?;

        let output = Command::new(program).args(args).arg(old).arg(new).output()?;
        debug!(program = program.as_str(), status:? = output.status; "Diff command finished");
        Ok(output.stdout)
    }
}

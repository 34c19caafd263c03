//! Command-line argument definitions for the buildfmt CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the processing mode, the files to format,
//! the rewrite settings layered over the configuration file, and logging
//! verbosity.

use clap::{Parser, ValueEnum};

/// What to do with each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Print the names of files that need reformatting
    Check,
    /// Show the changes that would be made
    Diff,
    /// Rewrite files in place
    Fix,
}

/// Command-line arguments for the buildfmt formatter
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// BUILD files to format; standard input is read when none are given
    pub files: Vec<String>,

    /// Alias for `--mode diff`
    #[arg(short = 'd', conflicts_with = "mode")]
    pub diff: bool,

    /// Formatting mode (default: fix)
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Report each fixed file on standard error
    #[arg(short, long)]
    pub verbose: bool,

    /// Logical path of the file, used by path-sensitive rewrites
    #[arg(long)]
    pub path: Option<String>,

    /// Extra sortable contexts: `attr` or `kind.attr`, comma separated
    #[arg(long = "allowsort", value_delimiter = ',')]
    pub allow_sort: Vec<String>,

    /// Rewrite passes to disable, comma separated
    #[arg(long, value_delimiter = ',')]
    pub disable: Vec<String>,

    /// Append the rewrite log to each line in check mode
    #[arg(long)]
    pub showlog: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// The effective mode: `-d` wins, then `--mode`, then fix.
    pub fn mode(&self) -> Mode {
        if self.diff {
            Mode::Diff
        } else {
            self.mode.unwrap_or(Mode::Fix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["buildfmt"]).unwrap();
        assert!(args.files.is_empty());
        assert_eq!(args.mode(), Mode::Fix);
        assert_eq!(args.log_level, "warn");
    }

    #[test]
    fn test_diff_alias_and_lists() {
        let args = Args::try_parse_from([
            "buildfmt",
            "-d",
            "--disable",
            "listsort,dedup",
            "--allowsort",
            "plugins",
            "a/BUILD",
        ])
        .unwrap();
        assert_eq!(args.mode(), Mode::Diff);
        assert_eq!(args.disable, ["listsort", "dedup"]);
        assert_eq!(args.allow_sort, ["plugins"]);
        assert_eq!(args.files, ["a/BUILD"]);
    }

    #[test]
    fn test_diff_conflicts_with_mode() {
        let err = Args::try_parse_from(["buildfmt", "-d", "--mode", "check"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Args::try_parse_from(["buildfmt", "--mode", "pipe"]).is_err());
    }
}

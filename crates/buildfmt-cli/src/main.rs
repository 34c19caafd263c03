//! buildfmt CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use buildfmt_cli::{Args, CliError, error_adapter::render};

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting buildfmt");
    debug!(args:?; "Parsed arguments");

    let status = match buildfmt_cli::run(&args) {
        Ok(status) => status,
        Err(err) => {
            match &err {
                CliError::Usage(message) => eprintln!("buildfmt: {message}"),
                CliError::Buildfmt(inner) => {
                    for rendered in render(inner) {
                        error!("{rendered}");
                    }
                }
            }
            err.exit_status()
        }
    };

    info!(code = status.code(); "Finished");
    process::exit(status.code());
}

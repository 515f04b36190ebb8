//! conch entry point: one-shot subcommands or the interactive shell.
//!
//! Known console errors print a one-line message and exit non-zero;
//! anything unanticipated (logger setup, terminal I/O) propagates through
//! anyhow and terminates the process.

mod cli;
mod shell;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use conch_console::{ConsoleService, HostConsole};

use crate::cli::Cli;

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("conch: {e}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut console = HostConsole::new().context("cannot determine working directory")?;
    match cli.command {
        Some(command) => match shell::dispatch(&mut console, command) {
            Ok(()) => Ok(ExitCode::SUCCESS),
            Err(e) => {
                eprintln!("conch: {e}");
                Ok(ExitCode::FAILURE)
            },
        },
        None => {
            log::info!("starting interactive shell in {}", console.cwd().display());
            shell::run(&mut console)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}

/// Initialize the logger from `RUST_LOG` (default `warn`). Setting
/// `CONCH_LOG_FILE` appends log output to a file instead of stderr.
fn init_logger() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Ok(path) = std::env::var("CONCH_LOG_FILE") {
        match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            },
            Err(e) => eprintln!("conch: could not open log file {path}: {e}"),
        }
    }
    builder.init();
}

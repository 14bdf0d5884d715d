//! `reqcap` command-line entry point.
//!
//! Exit status is 0 on success and 1 on any error, failed assertion or
//! snapshot difference. The response goes to stdout; logs and diagnostics
//! (dependency status, exports, assertion results) go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use reqcap::cli::Cli;
use reqcap::commands;
use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("ERROR: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let cwd = std::env::current_dir().context("cannot determine the working directory")?;
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    let succeeded = commands::execute(&cli, &cwd, &mut out, &mut err)?;
    out.flush().context("failed to flush stdout")?;
    Ok(succeeded)
}

// sqlshift/src/main.rs
//! sqlshift entry point.
//!
//! Loads `.env`, parses arguments, sets up logging and hands the parsed
//! command line to the command dispatcher. Any error ends the process with a non-zero status.

use clap::Parser;
use log::{debug, warn};
use std::process::ExitCode;

use sqlshift::cli::Cli;
use sqlshift::logger;
use sqlshift::ui::output_format::Console;

fn main() -> ExitCode {
    // `.env` must be in the environment before clap reads `env = ...` defaults.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    logger::init_logger(logger::level_from_flags(cli.quiet, cli.debug));

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }

    let console = Console::stderr(cli.quiet);
    match sqlshift::dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            console.error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

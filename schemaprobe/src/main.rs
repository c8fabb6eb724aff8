//! Single-table inspection tool.
//!
//! Connects to a MySQL database, describes one table, samples a few rows,
//! prints a report and exits with a status code that tells scripts what
//! happened.
//!
//! # Security Guarantees
//! - Read-only sessions
//! - No credentials stored or logged
//! - Exactly one connection, released on every path

use clap::Parser;
use clap::error::ErrorKind;
use schemaprobe::{Cli, run};
use schemaprobe_core::error::{EXIT_ARGUMENTS, EXIT_SUCCESS};
use schemaprobe_core::logging::init_logging;
use schemaprobe_core::mysql::MySqlConnector;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Loaded before parsing so `.env` can supply the SCHEMAPROBE_* variables
    let dotenv = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_SUCCESS,
                _ => EXIT_ARGUMENTS,
            };
            // Nothing useful can be done if stderr is gone
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("arguments: {e}");
        return ExitCode::from(EXIT_ARGUMENTS);
    }

    match dotenv {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }

    let code = run(&cli, MySqlConnector::new(), std::io::stdout(), std::io::stderr()).await;
    ExitCode::from(code)
}

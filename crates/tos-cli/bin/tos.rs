//! `tos` binary entry point.
//!
//! Parses arguments, initializes logging and runs one command. Any error is
//! printed to standard error and the process exits with status 1.

use std::process::ExitCode;
use tos_cli::Cli;
use tos_cli::commands;

fn main() -> ExitCode {
    let cli = Cli::from_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.default_log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    match commands::run(&cli, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("{e:?}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

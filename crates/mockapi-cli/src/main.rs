//! # mockapi CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, and
//! dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use mockapi_cli::check::{run_check, CheckArgs};
use mockapi_cli::logging::{self, LogFormat};
use mockapi_cli::mock::{run_mock, MockArgs};

/// Schema-driven mock API server.
///
/// Serves every operation of an OpenAPI 3.x description, validating each
/// request against it and answering from a file-backed resource store.
#[derive(Parser, Debug)]
#[command(name = "mockapi", version, about, long_about = None)]
struct Cli {
    /// Verbose output. Repeat for more (-vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Console log format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve a mock API from an OpenAPI description.
    Mock(MockArgs),

    /// Load a description and list its endpoints without serving.
    Check(CheckArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    tracing::debug!("mockapi v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Mock(args) => run_mock(&args),
        Commands::Check(args) => run_check(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

//! # Check Subcommand
//!
//! Loads a description exactly as `mock` would and prints what it serves.
//! Useful in CI to catch unresolvable or cyclic references before a server
//! is started.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

/// Arguments for the `mockapi check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// OpenAPI 3.x description (YAML or JSON).
    #[arg(value_name = "OPENAPI")]
    pub spec: PathBuf,
}

/// Execute the check subcommand. Returns the process exit code.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let document = crate::load_document(&args.spec)?;

    println!(
        "{} {}",
        document.title.as_deref().unwrap_or("untitled"),
        document.version.as_deref().unwrap_or("")
    );
    for endpoint in document.endpoints() {
        println!("  {endpoint}");
    }
    println!(
        "{} operation(s), {} security scheme(s)",
        document.operation_count(),
        document.security_schemes.len()
    );
    Ok(0)
}

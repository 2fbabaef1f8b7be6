//! # Mock Subcommand
//!
//! Loads the API description, opens the resource store, and serves until
//! Ctrl-C. Any failure before the listener is up is a startup error and
//! exits with status 1.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use mockapi_api::state::{AppState, ServerConfig, DEFAULT_DATA_FILE, DEFAULT_PORT};
use mockapi_store::IdPolicy;

/// Arguments for the `mockapi mock` subcommand.
#[derive(Args, Debug)]
pub struct MockArgs {
    /// OpenAPI 3.x description (YAML or JSON).
    #[arg(value_name = "OPENAPI")]
    pub spec: PathBuf,

    /// Port to listen on.
    #[arg(long, env = "MOCKAPI_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// File the mock resource store is persisted to.
    #[arg(long, env = "MOCKAPI_DATA", default_value = DEFAULT_DATA_FILE)]
    pub data: PathBuf,

    /// How ids of newly created records are chosen.
    #[arg(long, value_enum, default_value_t = IdPolicyArg::Count)]
    pub id_policy: IdPolicyArg,
}

/// Command-line spelling of [`IdPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IdPolicyArg {
    /// Record count plus one.
    Count,
    /// Largest existing id plus one.
    NextAfterMax,
}

impl From<IdPolicyArg> for IdPolicy {
    fn from(arg: IdPolicyArg) -> Self {
        match arg {
            IdPolicyArg::Count => Self::Count,
            IdPolicyArg::NextAfterMax => Self::NextAfterMax,
        }
    }
}

impl MockArgs {
    /// Server settings these arguments describe.
    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            port: self.port,
            data_file: self.data.clone(),
            id_policy: self.id_policy.into(),
        }
    }
}

/// Execute the mock subcommand. Returns the process exit code.
pub fn run_mock(args: &MockArgs) -> Result<u8> {
    let document = crate::load_document(&args.spec)?;
    tracing::info!(
        spec = %args.spec.display(),
        title = document.title.as_deref().unwrap_or("untitled"),
        operations = document.operation_count(),
        "loaded API description"
    );
    mockapi_api::log_endpoints(&document);

    let config = args.config();
    tracing::info!(
        data_file = %config.data_file.display(),
        id_policy = %config.id_policy,
        "server configuration"
    );
    let state = AppState::from_config(document, config);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime
        .block_on(mockapi_api::serve(state))
        .context("mock server failed")?;
    Ok(0)
}

//! # mockapi-cli — Command-Line Interface
//!
//! Provides the `mockapi` binary.
//!
//! ## Subcommands
//!
//! - `mockapi mock <openapi.yaml>` — serve the described API with request
//!   validation and a file-backed mock resource store.
//! - `mockapi check <openapi.yaml>` — load the description and list the
//!   endpoints it would serve, without starting a server.
//!
//! ```bash
//! mockapi mock petstore.yaml --port 8080 --data pets.json
//! mockapi -vv mock petstore.yaml --id-policy next-after-max
//! mockapi --log-format json mock petstore.yaml
//! mockapi check petstore.yaml
//! ```

pub mod check;
pub mod logging;
pub mod mock;

use std::path::Path;

use anyhow::{Context, Result};
use mockapi_core::ApiDocument;

/// Load the API description at `path`, with the path in the error context.
pub fn load_document(path: &Path) -> Result<ApiDocument> {
    ApiDocument::from_path(path)
        .with_context(|| format!("failed to load API description {}", path.display()))
}

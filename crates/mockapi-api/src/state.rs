//! # Application State
//!
//! Shared state for the Axum application, passed to the dispatch handler
//! via the `State` extractor.
//!
//! - **Document**: the loaded API description, built once at startup and
//!   read-only thereafter, behind an `Arc`.
//! - **Store**: the resource table. Cloning shares it.
//! - **Config**: server settings.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use mockapi_core::ApiDocument;
use mockapi_store::{IdPolicy, ResourceStore};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default backing file for the resource store.
pub const DEFAULT_DATA_FILE: &str = "data.json";

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port to listen on, on all interfaces.
    pub port: u16,
    /// Backing file for the resource store.
    pub data_file: PathBuf,
    /// How new record ids are chosen.
    pub id_policy: IdPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            id_policy: IdPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// `0.0.0.0:{port}`.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The loaded API description.
    pub document: Arc<ApiDocument>,
    /// The resource table.
    pub store: ResourceStore,
    /// Server settings.
    pub config: ServerConfig,
}

impl AppState {
    /// Build state around an existing store, pre-registering every
    /// resource the document's templates name statically.
    pub fn new(document: ApiDocument, store: ResourceStore, config: ServerConfig) -> Self {
        for resource in document.static_resources() {
            store.register(resource);
        }
        Self {
            document: Arc::new(document),
            store,
            config,
        }
    }

    /// Open the store configured by `config` and build state around it.
    pub fn from_config(document: ApiDocument, config: ServerConfig) -> Self {
        let store = ResourceStore::open(&config.data_file).with_id_policy(config.id_policy);
        Self::new(document, store, config)
    }

    /// In-memory state with default settings.
    pub fn in_memory(document: ApiDocument) -> Self {
        Self::new(document, ResourceStore::in_memory(), ServerConfig::default())
    }
}

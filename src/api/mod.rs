//! HTTP front end for the reader
//!
//! Serves rendered pages, chapter JSON and the raw data directory.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::library::Library;
use crate::state::ReaderState;

pub mod handlers;
pub mod models;
pub mod server;

/// API server owning the shared reader state
pub struct ApiServer {
    reader: Arc<RwLock<ReaderState>>,
    library: Library,
    config: Arc<Config>,
}

impl ApiServer {
    /// Load state and create the server
    pub async fn new(library: Library, config: Arc<Config>) -> Self {
        let state = handlers::load_state(&library, &config).await;
        Self {
            reader: Arc::new(RwLock::new(state)),
            library,
            config,
        }
    }

    pub fn reader(&self) -> Arc<RwLock<ReaderState>> {
        Arc::clone(&self.reader)
    }

    /// Start the API server in the background
    pub fn start_background(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.start().await })
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on port {}", self.config.server.port);
        server::start_http_server(self.reader, self.library, self.config).await
    }
}

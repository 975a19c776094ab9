//! API module for the vidscribe server
//!
//! Exposes the upload, transcription, prompt-catalog, and streaming
//! completion endpoints over HTTP.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::engine::Engines;
use crate::prompt::PromptCatalog;
use crate::store::VideoStore;

pub mod handlers;
pub mod models;
pub mod server;

pub use handlers::AppState;

/// API server for the streaming completion service and its supporting routes
pub struct ApiServer {
    state: AppState,
    bind_address: String,
    port: u16,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(store: VideoStore, engines: Engines, config: Arc<Config>) -> Self {
        let catalog = Arc::new(PromptCatalog::seeded(&config.prompt.placeholder));
        let bind_address = config.server.bind_address.clone();
        let port = config.server.port;

        Self {
            state: AppState {
                store,
                engines,
                catalog,
                config,
            },
            bind_address,
            port,
        }
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on port {}", self.port);

        server::start_http_server(self.state, &self.bind_address, self.port).await
    }
}

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

use std::sync::Arc;

use reqwest::Client;

use crate::config::{EnvOverrides, ServerConfig};
use crate::graphs::GraphRegistry;
use crate::llm::ModelProvider;

pub use routes::create_router;
pub use server::start_server;

/// Shared by every request. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<GraphRegistry>,
    pub models: Arc<dyn ModelProvider>,
    pub http: Client,
    pub env: Arc<EnvOverrides>,
    pub stream_buffer: usize,
}

impl AppState {
    pub fn new(
        registry: GraphRegistry,
        models: Arc<dyn ModelProvider>,
        http: Client,
        config: &ServerConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            models,
            http,
            env: Arc::new(config.env.clone()),
            stream_buffer: config.stream_buffer,
        }
    }
}

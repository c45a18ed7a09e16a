use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info};

use plebchat_engine::api::{self, AppState};
use plebchat_engine::config::ServerConfig;
use plebchat_engine::graphs::GraphRegistry;
use plebchat_engine::llm::OllamaProvider;
use plebchat_engine::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;
    telemetry::init_tracing(telemetry::DEFAULT_FILTER, config.log_json);

    info!(version = env!("CARGO_PKG_VERSION"), "starting plebchat");

    // Connect timeout only; model replies may take as long as they take.
    let http = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .build()?;
    let registry = GraphRegistry::builtin()?;
    let state = AppState::new(registry, Arc::new(OllamaProvider::new(http.clone())), http, &config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let bind_addr = config.bind_addr;
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::start_server(bind_addr, state, shutdown_rx).await {
            error!(error = %e, "API server crashed");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("received shutdown signal");

    let _ = shutdown_tx.send(true);
    let _ = api_handle.await;

    info!("plebchat shutdown complete");
    Ok(())
}

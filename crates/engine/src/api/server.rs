use std::net::SocketAddr;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use super::{routes::create_router, AppState};

pub async fn start_server(
    bind_addr: SocketAddr,
    state: AppState,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %listener.local_addr()?, "plebchat API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await?;

    Ok(())
}

async fn shutdown_signal(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    info!("shutting down API server");
}

use axum::{
    routing::{get, post},
    Router,
};

use super::{handlers, AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/graphs", get(handlers::list_graphs))
        // Older pipelines discover graphs here.
        .route("/models", get(handlers::list_graphs))
        .route("/graph/{graph_id}", post(handlers::run_graph))
        .with_state(state)
}

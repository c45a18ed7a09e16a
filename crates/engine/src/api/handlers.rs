use std::convert::Infallible;

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
};
use http::{header, HeaderName, HeaderValue};
use plebchat_shared::schemas::HealthResponse;
use plebchat_shared::{Frame, GraphInfo, GraphRequest};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::types::{is_valid_graph_id, ApiError};
use super::AppState;
use crate::config::GraphConfig;
use crate::graphs::{launch, GraphContext, GraphInput};
use crate::transcoder::Transcoder;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy".to_string() })
}

pub async fn list_graphs(State(state): State<AppState>) -> Json<Vec<GraphInfo>> {
    Json(state.registry.list())
}

/// `POST /graph/{graph_id}`: run a graph and stream its frames.
pub async fn run_graph(
    State(state): State<AppState>,
    Path(graph_id): Path<String>,
    body: Result<Json<GraphRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    if !is_valid_graph_id(&graph_id) {
        return Err(ApiError::InvalidGraphId(graph_id));
    }
    let graph = state
        .registry
        .get(&graph_id)
        .ok_or_else(|| ApiError::GraphNotFound(graph_id.clone()))?;
    let Json(request) = body.map_err(|e| ApiError::BadBody(e.body_text()))?;

    let input = GraphInput::new(request.query, request.messages);
    if input.latest_user_text().is_none() {
        return Err(ApiError::NoUserText);
    }
    let config = GraphConfig::resolve(&request.config, &state.env)?;

    let transcoder = Transcoder::new(config.transcoder_options());
    let ctx = GraphContext {
        model: state.models.model(&config),
        http: state.http.clone(),
        config,
    };

    let request_id = Uuid::new_v4();
    let span = info_span!("stream", %request_id, graph = %graph_id);
    let (tx, rx) = mpsc::channel::<Frame>(state.stream_buffer);

    let run = span.in_scope(|| {
        info!(messages = input.messages.len(), "starting graph run");
        launch(graph, input, ctx, state.stream_buffer)
    });
    tokio::spawn(
        async move {
            let mut sink = tx;
            transcoder.run(run, &mut sink).await;
        }
        .instrument(span),
    );

    let stream = ReceiverStream::new(rx)
        .map(|frame| Ok::<_, Infallible>(Event::default().data(frame.to_json())));

    Ok((
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform")),
            (HeaderName::from_static("x-accel-buffering"), HeaderValue::from_static("no")),
        ],
        Sse::new(stream),
    )
        .into_response())
}

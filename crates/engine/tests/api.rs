mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use plebchat_engine::api::{create_router, AppState};
use plebchat_engine::config::ServerConfig;
use plebchat_engine::graphs::GraphRegistry;
use plebchat_shared::{Channel, FinishReason, Frame};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{parse_body, terminal_count, CannedModel, CannedProvider};

fn app(model: Arc<CannedModel>) -> Router {
    let state = AppState::new(
        GraphRegistry::builtin().unwrap(),
        Arc::new(CannedProvider(model)),
        reqwest::Client::new(),
        &ServerConfig::default(),
    );
    create_router(state)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn content_of(frames: &[Frame]) -> String {
    frames
        .iter()
        .filter_map(Frame::as_chunk)
        .filter_map(|c| c.text_delta())
        .filter(|(channel, _)| *channel == Channel::Content)
        .map(|(_, text)| text)
        .collect()
}

#[tokio::test]
async fn health() {
    let response = app(CannedModel::replying(&[])).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn graphs_are_listed_on_both_routes() {
    let expected = json!([
        { "id": "echobot", "name": "EchoBot" },
        { "id": "fren", "name": "🐸 Fren" },
        { "id": "research", "name": "🔍 Research" },
    ]);
    for uri in ["/graphs", "/models"] {
        let response = app(CannedModel::replying(&[])).oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, expected);
    }
}

#[tokio::test]
async fn rejects_malformed_graph_id() {
    let response = app(CannedModel::replying(&[]))
        .oneshot(post("/graph/Fren!", json!({ "messages": [{ "role": "user", "content": "hi" }] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].as_str().unwrap().contains("invalid graph id"));
}

#[tokio::test]
async fn unknown_graph_is_404() {
    let response = app(CannedModel::replying(&[]))
        .oneshot(post("/graph/crab", json!({ "messages": [{ "role": "user", "content": "hi" }] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({ "error": "graph `crab` not found" }));
}

#[tokio::test]
async fn request_without_user_text_is_400() {
    let response = app(CannedModel::replying(&[]))
        .oneshot(post("/graph/echobot", json!({ "messages": [] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "request has no user message" }));
}

#[tokio::test]
async fn blank_query_without_messages_is_400() {
    let response = app(CannedModel::replying(&[]))
        .oneshot(post("/graph/echobot", json!({ "query": "   ", "messages": [] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "request has no user message" }));
}

#[tokio::test]
async fn invalid_config_is_400() {
    let response = app(CannedModel::replying(&[]))
        .oneshot(post("/graph/echobot", json!({ "query": "hi", "config": { "DEBUG": "maybe" } })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].as_str().unwrap().contains("DEBUG"));
}

#[tokio::test]
async fn echobot_streams_exact_frames() {
    let response = app(CannedModel::replying(&[]))
        .oneshot(post(
            "/graph/echobot",
            json!({ "messages": [{ "role": "user", "content": "hello there" }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache, no-transform");
    assert_eq!(response.headers()["x-accel-buffering"], "no");

    assert_eq!(
        body_text(response).await,
        concat!(
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":null}]}\n\n",
            "data: {\"event\":{\"type\":\"status\",\"data\":{\"description\":\"Running…\",\"done\":false}}}\n\n",
            "data: {\"event\":{\"type\":\"status\",\"data\":{\"description\":\"Running… echo\",\"done\":false}}}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"hello there\"},\"finish_reason\":null}]}\n\n",
            "data: {\"event\":{\"type\":\"status\",\"data\":{\"description\":\"\",\"done\":true}}}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        )
    );
}

#[tokio::test]
async fn echobot_debug_writes_config_as_reasoning() {
    let response = app(CannedModel::replying(&[]))
        .oneshot(post("/graph/echobot", json!({ "query": "ping", "config": { "DEBUG": true } })))
        .await
        .unwrap();
    let frames = parse_body(&body_text(response).await);

    let reasoning: String = frames
        .iter()
        .filter_map(Frame::as_chunk)
        .filter_map(|c| c.text_delta())
        .filter(|(channel, _)| *channel == Channel::Thought)
        .map(|(_, text)| text)
        .collect();
    assert!(reasoning.starts_with("```json\n"));
    assert!(reasoning.contains("\"LLM_MODEL\": \"llama3.1:8b\""));
    // Debug mode also writes the node header.
    assert_eq!(content_of(&frames), "\n\n## echo\n\nping");
}

#[tokio::test]
async fn fren_streams_model_reply() {
    let model = CannedModel::replying(&["Hi", " pleb"]);
    let response = app(model.clone())
        .oneshot(post("/graph/fren", json!({ "messages": [{ "role": "user", "content": "hello" }] })))
        .await
        .unwrap();
    let frames = parse_body(&body_text(response).await);

    assert_eq!(content_of(&frames), "Hi pleb");
    let statuses: Vec<&str> =
        frames.iter().filter_map(Frame::as_status).map(|s| s.description.as_str()).collect();
    // `_check_for_command` stays silent.
    assert_eq!(statuses, vec!["Running…", "Running… ollama", ""]);

    let prompts = model.prompts();
    assert_eq!(prompts[0][0].role, "system");
    assert_eq!(prompts[0][1].content, "hello");
}

#[tokio::test]
async fn fren_help_command_skips_the_model() {
    let model = CannedModel::replying(&["nope"]);
    let response = app(model.clone())
        .oneshot(post("/graph/fren", json!({ "query": "/help" })))
        .await
        .unwrap();
    let content = content_of(&parse_body(&body_text(response).await));

    assert!(content.starts_with("### Commands Available"));
    assert!(content.contains("- `/hi` - Tell the bot to say hello to you."));
    assert!(content.contains("- `/random` - "));
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn fren_unknown_command_lists_help() {
    let response = app(CannedModel::replying(&[]))
        .oneshot(post("/graph/fren", json!({ "query": "/bogus arg" })))
        .await
        .unwrap();
    let content = content_of(&parse_body(&body_text(response).await));
    assert!(content.starts_with("# ⛓️‍💥\n### Commands Available"));
}

#[tokio::test]
async fn disabled_commands_go_to_the_model() {
    let model = CannedModel::replying(&["ok"]);
    let response = app(model.clone())
        .oneshot(post(
            "/graph/fren",
            json!({ "query": "/help", "config": { "DISABLE_COMMANDS": true } }),
        ))
        .await
        .unwrap();
    assert_eq!(content_of(&parse_body(&body_text(response).await)), "ok");
    assert_eq!(model.prompts()[0].last().unwrap().content, "/help");
}

#[tokio::test]
async fn unreachable_model_fails_in_band() {
    let response = app(CannedModel::unreachable())
        .oneshot(post("/graph/fren", json!({ "query": "hello" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let frames = parse_body(&body_text(response).await);
    assert_eq!(terminal_count(&frames), 1);
    let terminal = frames.iter().rev().find_map(Frame::as_chunk).unwrap();
    assert_eq!(terminal.finish_reason(), Some(FinishReason::Error));
    let last = frames.last().unwrap().as_status().unwrap();
    assert_eq!(last.description, "Graph error!");
    assert!(content_of(&frames).contains("language model"));
}

#[tokio::test]
async fn research_answers_without_search_engine() {
    let model = CannedModel::replying(&["No sources, sorry."]);
    let response = app(model.clone())
        .oneshot(post(
            "/graph/research",
            json!({ "query": "what is rust", "config": { "SEARXNG_URL": "http://127.0.0.1:1" } }),
        ))
        .await
        .unwrap();
    let frames = parse_body(&body_text(response).await);

    let last_chunk = frames.iter().rev().find_map(Frame::as_chunk).unwrap();
    assert_eq!(last_chunk.finish_reason(), Some(FinishReason::Stop));
    assert!(content_of(&frames).ends_with("No sources, sorry."));

    let statuses: Vec<&str> =
        frames.iter().filter_map(Frame::as_status).map(|s| s.description.as_str()).collect();
    assert!(statuses.contains(&"Running… search_web"));
    assert!(statuses.contains(&"Running… generate_answer"));
    assert!(model.prompts()[0][1].content.contains("No search results are available."));
}

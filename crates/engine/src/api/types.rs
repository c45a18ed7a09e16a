use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use plebchat_shared::schemas::ErrorResponse;
use thiserror::Error;

use crate::config::ConfigError;

pub const MAX_GRAPH_ID_LEN: usize = 64;

/// Failures reported before the stream starts.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid graph id `{0}`: expected 1-64 characters of [a-z0-9_-]")]
    InvalidGraphId(String),
    #[error("graph `{0}` not found")]
    GraphNotFound(String),
    #[error("request has no user message")]
    NoUserText,
    #[error("invalid request body: {0}")]
    BadBody(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::GraphNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidGraphId(_)
            | ApiError::NoUserText
            | ApiError::BadBody(_)
            | ApiError::Config(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

pub fn is_valid_graph_id(id: &str) -> bool {
    (1..=MAX_GRAPH_ID_LEN).contains(&id.len())
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

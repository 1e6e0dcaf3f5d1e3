use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Everything that can stop a prediction request.
///
/// Missing upstream data (no competitor record, no knowledge-base match, no
/// encyclopedia article) is not represented here; those paths return `None`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("request to {url} failed after {attempts} attempts: {last_error}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("completion service error: {0}")]
    Completion(String),

    #[error("statistics endpoint metadata unavailable: {0}")]
    Metadata(String),

    #[error("cache I/O error: {0}")]
    CacheIo(#[from] std::io::Error),

    #[error("cache format error: {0}")]
    CacheFormat(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        match &self {
            Self::InvalidInput(msg) => warn!("Rejected match request: {}", msg),
            other => error!("Match request failed: {}", other),
        }

        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

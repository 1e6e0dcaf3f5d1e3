use crate::error::PipelineError;
use crate::metadata::MetadataCache;
use crate::models::{MatchRequest, MatchResponse};
use crate::pipeline::MatchService;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MatchService>,
    pub metadata: Arc<MetadataCache>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/match", post(match_handler))
        .route("/wa", get(metadata_handler))
        .route("/ping", get(ping_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Race prediction. The body is read as JSON whatever its content type.
async fn match_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MatchResponse>, PipelineError> {
    let span = info_span!("match", request_id = %Uuid::new_v4());
    async move {
        let request: MatchRequest = serde_json::from_slice(&body)
            .map_err(|e| PipelineError::invalid(format!("Malformed request body: {}", e)))?;
        info!(
            "Match request: {} athletes, discipline {:?}, gender {:?}",
            request.athletes.as_ref().map_or(0, Vec::len),
            request.discipline,
            request.gender
        );

        let response = state.service.predict(request).await?;
        info!("Prediction returned ({} chars)", response.chars().count());
        Ok::<_, PipelineError>(Json(MatchResponse { response }))
    }
    .instrument(span)
    .await
}

/// Current statistics endpoint metadata, refreshed when stale
async fn metadata_handler(State(state): State<AppState>) -> Response {
    match state.metadata.current().await {
        Ok(metadata) => Json(metadata).into_response(),
        Err(e) => {
            error!("Failed to fetch endpoint metadata: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response()
        }
    }
}

async fn ping_handler() -> &'static str {
    "pong"
}

use crate::models::PreloadResponse;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use tracing::info;
use vision::ports::AdminOperations;

/// DELETE /cache
pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    info!("DELETE /cache");
    state.recognition.clear_cache().await;
    StatusCode::NO_CONTENT
}

/// POST /admin/preload
///
/// Warm-up runs in the background; the response only says whether a remote
/// recognizer exists to warm up.
pub async fn preload_model(State(state): State<AppState>) -> (StatusCode, Json<PreloadResponse>) {
    let accepted = state.remote_enabled();
    let recognition = state.recognition.clone();
    tokio::spawn(async move { recognition.preload_remote_model().await });

    let message = if accepted {
        "Remote model preload started"
    } else {
        "Remote recognizer not configured"
    };

    (
        StatusCode::ACCEPTED,
        Json(PreloadResponse {
            accepted,
            message: message.to_string(),
        }),
    )
}

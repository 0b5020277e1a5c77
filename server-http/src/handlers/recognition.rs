use crate::models::{ErrorResponse, RecognizeResponse};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use bytes::Bytes;
use shared::Error;
use tracing::{info, warn};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// POST /recognize
///
/// The request body is the raw image. Recognition itself never fails: remote
/// problems resolve through the local fallback, so only undecodable input is
/// reported to the client.
pub async fn recognize_vehicle(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RecognizeResponse>, ApiError> {
    info!("POST /recognize: {} bytes", body.len());

    if body.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("request body must contain an image")),
        ));
    }

    match state.recognition.recognize(&body).await {
        Ok(served) => Ok(Json(RecognizeResponse {
            fingerprint: served.fingerprint.to_string(),
            served_from: served.served_from,
            result: served.result,
        })),
        Err(Error::ImageProcessing(reason)) => {
            warn!("Rejected upload: {}", reason);
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse::new(reason)),
            ))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}

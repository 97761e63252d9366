//! POST /analyze-image
//!
//! Accepts `{imageBase64?, imageMimeType?, imageUrl?}` and answers with either the
//! validated analysis result (200) or `{error}` with a 4xx/5xx status.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use deeptrust_common::api::{AnalyzeImageRequest, ANALYZE_IMAGE_PATH};
use deeptrust_common::AnalysisResult;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /analyze-image
pub async fn analyze_image(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeImageRequest>, JsonRejection>,
) -> ApiResult<Json<AnalysisResult>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected analyze request body");
        ApiError::BadRequest(rejection.body_text())
    })?;

    // Cancelled when the server begins shutting down
    let cancel = state.shutdown.child_token();

    match state.pipeline.analyze(request, &cancel).await {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            *state.last_error.write().await = Some(err.to_string());
            Err(err.into())
        }
    }
}

/// OPTIONS /analyze-image
///
/// Preflight answers are produced by the CORS layer; this keeps the route
/// answering 204 even for requests the layer does not treat as preflight.
pub async fn analyze_preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub fn analyze_routes() -> Router<AppState> {
    Router::new().route(
        ANALYZE_IMAGE_PATH,
        post(analyze_image).options(analyze_preflight),
    )
}

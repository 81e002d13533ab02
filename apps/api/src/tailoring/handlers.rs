//! Axum route handlers for the Tailoring API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::state::AppState;
use crate::tailoring::pipeline::{
    run_insights, run_tailoring, InsightsResponse, TailorRequest, TailorResponse,
};

/// POST /api/v1/quick-tailor
///
/// Scores, rewrites, and plans actions in one call. A failed rewrite is
/// reported as 503 with the full body so insights still reach the caller.
pub async fn handle_quick_tailor(
    State(state): State<AppState>,
    payload: Result<Json<TailorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TailorResponse>), AppError> {
    let Json(request) = payload?;
    let response = run_tailoring(
        state.generator.as_ref(),
        &state.pipeline_settings(),
        &request,
    )
    .await?;

    let status = if response.documents.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(response)))
}

/// POST /api/v1/insights
///
/// Heuristic match insights without a rewrite.
pub async fn handle_insights(
    State(state): State<AppState>,
    payload: Result<Json<TailorRequest>, JsonRejection>,
) -> Result<Json<InsightsResponse>, AppError> {
    let Json(request) = payload?;
    let response = run_insights(
        state.generator.as_ref(),
        &state.pipeline_settings(),
        &request,
    )
    .await?;

    Ok(Json(response))
}

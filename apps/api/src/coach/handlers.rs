//! Axum route handler for the how-to coach.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::coach::service::{run_coach, CoachRequest, CoachResponse};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/coach
///
/// Always 200 for a valid conversation; `source` says whether the reply was
/// generated or the fixed step plan.
pub async fn handle_coach(
    State(state): State<AppState>,
    payload: Result<Json<CoachRequest>, JsonRejection>,
) -> Result<Json<CoachResponse>, AppError> {
    let Json(request) = payload?;
    let response = run_coach(
        state.generator.as_ref(),
        state.config.llm_timeout,
        &request,
    )
    .await?;
    Ok(Json(response))
}

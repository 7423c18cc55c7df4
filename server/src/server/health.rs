//! Readiness endpoint.
//!
//! `GET /health` (liveness) comes from `eventhub-web`; `GET /ready` also
//! checks that storage answers.

use super::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use eventhub_web::AppError;
use serde::Serialize;

/// Body of a successful readiness check.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// `"ready"`
    pub status: &'static str,
}

/// Readiness check.
///
/// # Errors
///
/// Returns 503 when the store cannot be reached.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ReadinessResponse>), AppError> {
    state.repos.health.ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        AppError::unavailable("Storage is not reachable")
    })?;

    Ok((StatusCode::OK, Json(ReadinessResponse { status: "ready" })))
}

//! Event registration endpoints.
//!
//! - POST /events/register - Register the caller for an event; sends a
//!   confirmation email
//! - GET /events/registrations - The caller's registrations

use super::json_body;
use crate::auth::middleware::CurrentUser;
use crate::server::state::AppState;
use crate::services::{RegistrationInput, ServiceError};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use eventhub_core::Registration;
use eventhub_web::{AppError, CorrelationId};

/// Register the caller for an event.
///
/// # Errors
///
/// - 401 for anonymous callers
/// - 400 for a missing or unknown event, or a repeat registration
/// - 502 when the confirmation email cannot be sent (nothing is stored)
pub async fn register_for_event(
    State(state): State<AppState>,
    CorrelationId(correlation_id): CorrelationId,
    user: CurrentUser,
    payload: Result<Json<RegistrationInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Registration>), AppError> {
    let input = json_body(payload)?;
    let registration = state
        .registrations
        .register_for_event(user.principal(), &input)
        .await
        .inspect_err(|e| {
            if matches!(e, ServiceError::Notification(_)) {
                tracing::warn!(%correlation_id, "Registration rejected: confirmation undeliverable");
            }
        })?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// List the caller's registrations, oldest first.
///
/// # Errors
///
/// 401 for anonymous callers.
pub async fn list_my_registrations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Registration>>, AppError> {
    let registrations = state
        .registrations
        .list_my_registrations(user.principal())
        .await?;
    Ok(Json(registrations))
}

//! HTTP API handlers.
//!
//! Handlers are thin: extract, call one service method, shape the response.

pub mod accounts;
pub mod events;
pub mod registrations;

use crate::services::ServiceError;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use eventhub_web::AppError;

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Auth(e) => e.into(),
            ServiceError::Validation(errors) => Self::validation(errors),
            ServiceError::NotFound { resource, id } => Self::not_found(resource, id),
            ServiceError::Notification(message) => Self::bad_gateway(
                "The confirmation email could not be delivered.",
                "NOTIFICATION_FAILED",
            )
            .with_source(anyhow::anyhow!(message)),
            ServiceError::Store(e) => e.into(),
        }
    }
}

/// Unwrap a JSON body, turning a malformed one into a 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

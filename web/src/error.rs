//! Error types for web handlers.
//!
//! [`AppError`] bridges domain errors and HTTP responses. Every error renders
//! as
//!
//! ```json
//! { "code": "VALIDATION_ERROR", "message": "Invalid input.", "errors": { "title": ["..."] } }
//! ```
//!
//! where `errors` is present only for field validation failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use eventhub_auth::AuthError;
use eventhub_core::{StoreError, ValidationErrors};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Event>, AppError> {
///     let event = store.get_event(id).await?
///         .ok_or_else(|| AppError::not_found("Event", id))?;
///     Ok(Json(event))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Per-field messages for validation failures
    errors: Option<ValidationErrors>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            errors: None,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 400 error carrying per-field messages.
    #[must_use]
    pub fn validation(errors: ValidationErrors) -> Self {
        let mut err = Self::new(
            StatusCode::BAD_REQUEST,
            "Invalid input.".to_string(),
            "VALIDATION_ERROR".to_string(),
        );
        err.errors = Some(errors);
        err
    }

    /// Create a 502 Bad Gateway error for a failed downstream delivery.
    #[must_use]
    pub fn bad_gateway(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message.into(), code.into())
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }

    /// HTTP status this error renders with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Field messages, for validation failures.
    #[must_use]
    pub const fn errors(&self) -> Option<&ValidationErrors> {
        self.errors.as_ref()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
    /// Per-field messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<ValidationErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            errors: self.errors,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::NotAuthenticated => Self::unauthorized(err.to_string()),
            AuthError::PermissionDenied(_) => Self::forbidden(err.to_string()),
            AuthError::Validation(errors) => Self::validation(errors),
            AuthError::EmailDeliveryFailed(_) => Self::bad_gateway(
                "The confirmation email could not be delivered.",
                "NOTIFICATION_FAILED",
            )
            .with_source(err.into()),
            AuthError::DatabaseError(_) | AuthError::InternalError(_) => {
                Self::internal("An internal error occurred").with_source(err.into())
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::new(
                StatusCode::NOT_FOUND,
                "Not found.".to_string(),
                "NOT_FOUND".to_string(),
            ),
            other => Self::internal("An internal error occurred").with_source(other.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_not_found() {
        let err = AppError::not_found("Event", "123");
        assert_eq!(err.to_string(), "[NOT_FOUND] Event with id 123 not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validation_body_carries_field_map() {
        let err = AppError::validation(ValidationErrors::single(
            "title",
            "This field may not be blank.",
        ));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"]["title"][0], "This field may not be blank.");
    }

    #[tokio::test]
    async fn test_plain_errors_omit_field_map() {
        let (_, body) = body_json(AppError::forbidden("nope")).await;
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_auth_error_mapping() {
        let cases = [
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::NotAuthenticated, StatusCode::UNAUTHORIZED),
            (
                AuthError::PermissionDenied("organizer only".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                AuthError::Validation(ValidationErrors::single("email", "bad")),
                StatusCode::BAD_REQUEST,
            ),
            (
                AuthError::EmailDeliveryFailed("smtp down".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AuthError::DatabaseError("gone".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_details_not_exposed() {
        let err = AppError::from(StoreError::DatabaseError("password=hunter2".to_string()));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("hunter2"));
    }

    #[test]
    fn test_store_not_found() {
        assert_eq!(
            AppError::from(StoreError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
    }
}

//! Error types for authentication and authorization operations.

use eventhub_core::{StoreError, ValidationErrors};
use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for accounts, tokens, access decisions and notifications.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// Unknown handle or wrong password. Deliberately indistinguishable.
    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    /// Token is malformed, has a bad signature, or is of the wrong type.
    #[error("Token is invalid")]
    InvalidToken,

    /// Token signature is valid but the token has expired.
    #[error("Token has expired")]
    TokenExpired,

    /// No credentials were presented for an operation that needs them.
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════

    /// Authenticated caller is not allowed to perform the operation.
    #[error("You do not have permission to perform this action: {0}")]
    PermissionDenied(String),

    // ═══════════════════════════════════════════════════════════
    // Input Errors
    // ═══════════════════════════════════════════════════════════

    /// One or more input fields were rejected.
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Email delivery failed.
    #[error("Failed to send email: {0}")]
    EmailDeliveryFailed(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        Self::DatabaseError(error.to_string())
    }
}

impl From<ValidationErrors> for AuthError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

//! Account endpoints: sign-up, login and token refresh.
//!
//! - POST /register - Create an account
//! - POST /login, POST /token - Exchange credentials for tokens
//! - POST /token/refresh - Exchange a refresh token for an access token

use super::json_body;
use crate::metrics;
use crate::server::state::AppState;
use crate::services::{BLANK, REQUIRED};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use eventhub_auth::{AuthError, NewAccount, TokenPair};
use eventhub_core::ValidationErrors;
use eventhub_web::AppError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Credentials for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login handle
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
}

/// Refresh request.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh: Option<String>,
}

/// Plain confirmation body.
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    /// Human-readable outcome
    pub detail: &'static str,
}

/// Refresh response.
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    /// New access token
    pub access: String,
}

fn required<'a>(errors: &mut ValidationErrors, field: &str, value: Option<&'a str>) -> &'a str {
    match value {
        None => {
            errors.add(field, REQUIRED);
            ""
        }
        Some(v) if v.is_empty() => {
            errors.add(field, BLANK);
            ""
        }
        Some(v) => v,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an account.
///
/// # Errors
///
/// 400 with a field map for invalid or already-used values.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<NewAccount>, JsonRejection>,
) -> Result<(StatusCode, Json<DetailResponse>), AppError> {
    state.auth.register(json_body(payload)?).await?;

    Ok((
        StatusCode::CREATED,
        Json(DetailResponse {
            detail: "User registered successfully.",
        }),
    ))
}

/// Exchange credentials for an access/refresh pair.
///
/// # Errors
///
/// - 400 when a field is missing
/// - 401 for wrong credentials
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenPair>), AppError> {
    let request = json_body(payload)?;
    let mut errors = ValidationErrors::new();
    let username = required(&mut errors, "username", request.username.as_deref());
    let password = required(&mut errors, "password", request.password.as_deref());
    errors.into_result()?;

    match state.auth.login(username, password).await {
        Ok(pair) => {
            metrics::login("succeeded");
            Ok((StatusCode::OK, Json(pair)))
        }
        Err(e) => {
            if e == AuthError::InvalidCredentials {
                metrics::login("failed");
            }
            Err(e.into())
        }
    }
}

/// Exchange a refresh token for a new access token.
///
/// # Errors
///
/// - 400 when `refresh` is missing
/// - 401 for an invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccessResponse>), AppError> {
    let request = json_body(payload)?;
    let mut errors = ValidationErrors::new();
    let token = required(&mut errors, "refresh", request.refresh.as_deref());
    errors.into_result()?;

    let access = state.auth.refresh(token).await?;
    Ok((StatusCode::OK, Json(AccessResponse { access })))
}

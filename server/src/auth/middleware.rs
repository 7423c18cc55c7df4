//! Caller extraction.
//!
//! Handlers receive the caller as [`CurrentUser`], which is `None` for
//! anonymous requests. Whether an anonymous caller may proceed is decided by
//! the access policy inside the services, not here.

use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use eventhub_auth::Principal;
use eventhub_web::{AppError, BearerToken};

/// The authenticated caller, if any.
///
/// - no `Authorization` header: `CurrentUser(None)`
/// - valid access token: `CurrentUser(Some(principal))`
/// - malformed header, bad or expired token, refresh token: 401
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Principal>);

impl CurrentUser {
    /// Borrow the principal.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(BearerToken(token)) = BearerToken::from_headers(&parts.headers)? else {
            return Ok(Self(None));
        };

        let principal = state.auth.authenticate(&token)?;
        tracing::debug!(user_id = %principal.user_id, "Request authenticated");
        Ok(Self(Some(principal)))
    }
}

//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation id
//! - `BearerToken`: the raw token from `Authorization: Bearer <token>`
//!
//! # Examples
//!
//! ```ignore
//! use eventhub_web::extractors::{BearerToken, CorrelationId};
//!
//! async fn handler(
//!     correlation_id: CorrelationId,
//!     BearerToken(token): BearerToken,
//! ) -> Result<Json<Response>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, "Processing request");
//!     Ok(Json(response))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Uses the id stored by [`correlation_id_layer`](crate::correlation_id_layer)
/// when the layer is installed, so handler logs and the response header agree.
/// Otherwise reads the `X-Correlation-ID` header, or generates a new UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Bearer token from the `Authorization` header.
///
/// Rejects with 401 when the header is missing, is not a `Bearer` credential,
/// or carries an empty token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    /// Parse the `Authorization` header, if one is present.
    ///
    /// Returns `Ok(None)` when there is no header at all, which lets public
    /// endpoints accept anonymous callers while still rejecting malformed
    /// credentials.
    ///
    /// # Errors
    ///
    /// Returns a 401 [`AppError`] for a header that is present but malformed.
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, AppError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(None);
        };
        let value = value
            .to_str()
            .map_err(|_| AppError::unauthorized("Invalid authorization header"))?;

        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
        })?;
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Some(Self(token.to_string())))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)?
            .ok_or_else(|| AppError::unauthorized("Authentication credentials were not provided."))
    }
}

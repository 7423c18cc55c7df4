//! Liveness endpoint.
//!
//! Used by load balancers to verify the process is serving requests. It
//! does not touch the database.

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process answers
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Simple health check endpoint.
///
/// ```text
/// GET /health
/// 200 {"status": "ok", "version": "0.1.0"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

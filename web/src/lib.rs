//! Axum integration for eventhub.
//!
//! The HTTP shell around the services:
//!
//! - [`AppError`]: maps domain errors to status codes and a JSON body
//! - [`extractors`]: correlation id and bearer token extraction
//! - [`middleware`]: correlation id propagation with a request span
//! - [`handlers`]: framework-level handlers such as liveness
//!
//! # Example
//!
//! ```ignore
//! use eventhub_web::{AppError, correlation_id_layer};
//! use axum::{Router, routing::get, Json};
//!
//! async fn handler() -> Result<Json<Vec<Event>>, AppError> {
//!     let events = catalog.list(None, &query).await?;
//!     Ok(Json(events))
//! }
//!
//! let app = Router::new()
//!     .route("/events", get(handler))
//!     .layer(correlation_id_layer());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId};
pub use middleware::{correlation_id_layer, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

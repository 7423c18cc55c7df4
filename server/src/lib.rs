//! # Eventhub Server
//!
//! HTTP backend for publishing events and registering for them.
//!
//! - **Accounts**: sign-up, login, token refresh (`eventhub-auth`)
//! - **Catalog**: list/search/filter events, create, replace, delete
//! - **Registrations**: one registration per user and event, confirmed by email
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum) ──▶ api::* handlers ──▶ services::{CatalogService, RegistrationService}
//!                      │                         │            │
//!                CurrentUser ◀── AuthService     │      EmailProvider
//!                                               ▼
//!                        Repositories (PgStore in production, InMemoryStore in tests)
//! ```
//!
//! Every service call runs the access policy first; see
//! [`eventhub_auth::authorize`].

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod auth;
pub mod config;
pub mod metrics;
pub mod server;
pub mod services;

pub use config::Config;
pub use server::{build_router, AppState};
pub use services::{CatalogPolicy, Repositories, ServiceError};

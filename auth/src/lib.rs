//! # Eventhub Authentication & Authorization
//!
//! Accounts, bearer tokens, access decisions and outgoing notifications.
//!
//! ## Features
//!
//! - **Accounts**: handle/email/password validation, Argon2id hashing
//! - **Tokens**: signed access and refresh tokens (JWT, HS256)
//! - **Policy**: one [`policy::authorize`] call per operation
//! - **Notifications**: the [`providers::EmailProvider`] collaborator
//!
//! ## Example
//!
//! ```rust,ignore
//! use eventhub_auth::{AuthConfig, AuthService, NewAccount};
//!
//! let auth = AuthService::new(users, AuthConfig::new(secret), clock);
//! auth.register(NewAccount { username, password, email }).await?;
//!
//! let pair = auth.login("alice", "pw123").await?;
//! let principal = auth.authenticate(&pair.access)?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod error;
pub mod password;
pub mod policy;
pub mod providers;
pub mod service;
pub mod tokens;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use config::{AuthConfig, NotificationConfig, SmtpConfig};
pub use error::{AuthError, Result};
pub use policy::{authorize, AccessPolicy, Decision, DenyReason, Operation, Principal};
pub use providers::EmailProvider;
pub use service::{AuthService, NewAccount};
pub use tokens::{TokenPair, TokenType};

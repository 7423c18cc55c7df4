//! # Eventhub Core
//!
//! Domain types and storage abstractions for the eventhub backend.
//!
//! This crate has no I/O of its own. It defines:
//!
//! - **Identifiers**: [`UserId`], [`EventId`], [`RegistrationId`]
//! - **Records**: [`User`], [`Event`], [`Registration`]
//! - **List queries**: [`EventQuery`] (filters, search, ordering)
//! - **Validation**: [`ValidationErrors`], a per-field message map
//! - **Storage traits**: [`UserRepository`], [`EventRepository`], [`RegistrationRepository`]
//! - **Environment**: the [`environment::Clock`] dependency
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌────────────────────┐
//! │ eventhub-web │────▶│ eventhub-auth│────▶│   eventhub-core    │
//! │   (axum)     │     │ (tokens,     │     │ (types + traits)   │
//! └──────────────┘     │  passwords)  │     └─────────▲──────────┘
//!                      └──────────────┘               │
//!                                     ┌───────────────┴──────────────┐
//!                                     │                              │
//!                            ┌────────┴─────────┐         ┌──────────┴────────┐
//!                            │ eventhub-postgres│         │ eventhub-testing  │
//!                            │   (production)   │         │   (in-memory)     │
//!                            └──────────────────┘         └───────────────────┘
//! ```
//!
//! ## Registration uniqueness
//!
//! A user may register for an event at most once. The invariant is owned by the
//! storage implementation: [`RegistrationRepository::insert_registration`] must
//! check and insert atomically and report a duplicate as
//! [`StoreError::UniqueViolation`] with [`Conflict::Registration`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod query;
pub mod store;
pub mod types;
pub mod validation;

pub use query::{DateFilter, EventQuery, SortField, SortKey};
pub use store::{
    Conflict, EventRepository, RegistrationRepository, StoreError, StoreFuture, StoreHealth,
    UserRepository,
};
pub use types::{
    Event, EventDetails, EventId, Registration, RegistrationId, User, UserId, LOCATION_MAX_LENGTH,
    TITLE_MAX_LENGTH,
};
pub use validation::{ValidationErrors, NON_FIELD_ERRORS};

/// Environment module - dependency injection traits.
///
/// External dependencies that make behaviour non-deterministic are abstracted
/// behind traits so services can be tested with fixed values.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use eventhub_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = chrono::Utc::now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

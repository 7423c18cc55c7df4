//! Storage traits for users, events and registrations.
//!
//! # Implementations
//!
//! - `PgStore` (in `eventhub-postgres`): production storage
//! - `InMemoryStore` (in `eventhub-testing`): fast, deterministic tests
//!
//! # Integrity rules
//!
//! Every implementation must uphold the following, atomically:
//!
//! - usernames are unique; emails are unique ignoring ASCII case
//! - a `(user, event)` registration pair is unique
//! - a registration references an existing user and event
//! - deleting an event deletes its registrations
//! - deleting a user deletes its registrations, the events it organises and
//!   their registrations
//!
//! # Dyn Compatibility
//!
//! These traits return `Pin<Box<dyn Future>>` instead of using `async fn` so
//! they can be held as `Arc<dyn UserRepository>` in shared HTTP state.

use crate::query::EventQuery;
use crate::types::{Event, EventId, Registration, RegistrationId, User, UserId};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by storage operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// The uniqueness rule a write violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// Username already taken
    Username,
    /// Email already taken
    Email,
    /// User already registered for the event
    Registration,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username => write!(f, "username"),
            Self::Email => write!(f, "email"),
            Self::Registration => write!(f, "registration"),
        }
    }
}

/// Errors that can occur during storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("Record not found")]
    NotFound,

    /// A uniqueness rule rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(Conflict),

    /// A referenced record does not exist.
    #[error("Referenced record does not exist: {0}")]
    MissingReference(String),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Connectivity probe used by readiness checks.
pub trait StoreHealth: Send + Sync {
    /// Succeeds when the backing store can serve queries.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` when the store is unreachable.
    fn ping(&self) -> StoreFuture<'_, ()>;
}

/// Persistence for user accounts.
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// - `UniqueViolation(Username | Email)`: handle or address already taken
    /// - `DatabaseError`: storage failure
    fn create_user(&self, user: User) -> StoreFuture<'_, User>;

    /// Look a user up by id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure.
    fn find_user(&self, id: UserId) -> StoreFuture<'_, Option<User>>;

    /// Look a user up by exact handle.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure.
    fn find_user_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>>;

    /// Look a user up by email address, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure.
    fn find_user_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<User>>;

    /// Delete a user together with everything that depends on it.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such user
    /// - `DatabaseError`: storage failure (nothing is deleted)
    fn delete_user(&self, id: UserId) -> StoreFuture<'_, ()>;
}

/// Persistence for events.
pub trait EventRepository: Send + Sync {
    /// Insert a new event.
    ///
    /// # Errors
    ///
    /// - `MissingReference`: organizer does not exist
    /// - `DatabaseError`: storage failure
    fn insert_event(&self, event: Event) -> StoreFuture<'_, Event>;

    /// Fetch one event.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure.
    fn get_event(&self, id: EventId) -> StoreFuture<'_, Option<Event>>;

    /// List events matching `query`, in the query's order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure.
    fn list_events<'a>(&'a self, query: &'a EventQuery) -> StoreFuture<'a, Vec<Event>>;

    /// Overwrite the editable fields of an existing event.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such event
    /// - `DatabaseError`: storage failure
    fn update_event(&self, event: Event) -> StoreFuture<'_, Event>;

    /// Delete an event and its registrations.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such event
    /// - `DatabaseError`: storage failure (nothing is deleted)
    fn delete_event(&self, id: EventId) -> StoreFuture<'_, ()>;
}

/// Persistence for event registrations.
pub trait RegistrationRepository: Send + Sync {
    /// Insert a registration, enforcing `(user, event)` uniqueness atomically.
    ///
    /// # Errors
    ///
    /// - `UniqueViolation(Registration)`: the pair already exists
    /// - `MissingReference`: user or event does not exist
    /// - `DatabaseError`: storage failure
    fn insert_registration(&self, registration: Registration) -> StoreFuture<'_, Registration>;

    /// Delete one registration.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such registration
    /// - `DatabaseError`: storage failure
    fn delete_registration(&self, id: RegistrationId) -> StoreFuture<'_, ()>;

    /// All registrations of `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure.
    fn list_registrations_for_user(&self, user: UserId) -> StoreFuture<'_, Vec<Registration>>;
}

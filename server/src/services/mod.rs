//! Domain services: the event catalog and event registration.
//!
//! Services take the caller as `Option<&Principal>` and run the access
//! policy before doing anything else, so anonymous and authenticated calls
//! go through the same decision table.

pub mod catalog;
pub mod registration;

pub use catalog::{CatalogPolicy, CatalogService, EventInput};
pub use registration::{RegistrationInput, RegistrationService};

use eventhub_auth::AuthError;
use eventhub_core::{
    EventRepository, RegistrationRepository, StoreError, StoreHealth, UserRepository,
    ValidationErrors,
};
use std::sync::Arc;
use thiserror::Error;

/// Message for a required field that was not supplied.
pub const REQUIRED: &str = "This field is required.";

/// Message for a required field that was supplied empty.
pub const BLANK: &str = "This field may not be blank.";

/// Errors that can occur in catalog and registration services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Authentication or authorization refused the call
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// One or more input fields were rejected
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    /// The addressed record does not exist
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Kind of record
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The confirmation message could not be delivered
    #[error("Notification delivery failed: {0}")]
    Notification(String),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shared handles to the storage traits.
///
/// All fields usually point at the same store value.
#[derive(Clone)]
pub struct Repositories {
    /// User accounts
    pub users: Arc<dyn UserRepository>,
    /// Events
    pub events: Arc<dyn EventRepository>,
    /// Event registrations
    pub registrations: Arc<dyn RegistrationRepository>,
    /// Connectivity probe
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    /// Use one store for every repository.
    #[must_use]
    pub fn from_store<S>(store: S) -> Self
    where
        S: UserRepository + EventRepository + RegistrationRepository + StoreHealth + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            events: store.clone(),
            registrations: store.clone(),
            health: store,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

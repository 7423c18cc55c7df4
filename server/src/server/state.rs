//! Application state shared across HTTP handlers.

use crate::services::{CatalogPolicy, CatalogService, RegistrationService, Repositories};
use eventhub_auth::{AuthConfig, AuthService, EmailProvider};
use eventhub_core::environment::Clock;
use std::sync::Arc;

/// Shared application state.
///
/// Cheap to clone; every service holds its dependencies behind `Arc`.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Storage handles (also used by the readiness probe)
    pub repos: Repositories,
    /// Accounts and tokens
    pub auth: AuthService,
    /// Event catalog
    pub catalog: CatalogService,
    /// Event registrations
    pub registrations: RegistrationService,
}

impl AppState {
    /// Wire every service onto one set of repositories.
    #[must_use]
    pub fn new(
        repos: Repositories,
        email: Arc<dyn EmailProvider>,
        clock: Arc<dyn Clock>,
        auth_config: AuthConfig,
        catalog_policy: CatalogPolicy,
    ) -> Self {
        let auth = AuthService::new(repos.users.clone(), auth_config, clock.clone());
        let catalog = CatalogService::new(repos.events.clone(), catalog_policy);
        let registrations =
            RegistrationService::new(repos.clone(), email, clock, catalog_policy.into());

        Self {
            repos,
            auth,
            catalog,
            registrations,
        }
    }
}

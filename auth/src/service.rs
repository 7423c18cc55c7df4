//! Account registration, login and token handling.

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::password::{hash_password, verify_password_or_dummy};
use crate::policy::{authorize, AccessPolicy, Operation, Principal};
use crate::tokens::{TokenIssuer, TokenPair, TokenType};
use crate::utils::{is_valid_email, is_valid_username, MAX_USERNAME_LENGTH};
use eventhub_core::environment::Clock;
use eventhub_core::{Conflict, StoreError, User, UserId, UserRepository, ValidationErrors};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

const BLANK: &str = "This field may not be blank.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";
const EMAIL_TAKEN: &str = "A user with that email already exists.";

/// Input for [`AuthService::register`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAccount {
    /// Login handle
    #[serde(default)]
    pub username: String,
    /// Plaintext password
    #[serde(default)]
    pub password: String,
    /// Email address
    #[serde(default)]
    pub email: String,
}

/// Account and token operations over a user store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// Create a service.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            tokens: TokenIssuer::new(&config),
            config,
            clock,
        }
    }

    /// Create an account.
    ///
    /// Every field failure is collected before returning. The password is
    /// stored only as an Argon2id hash.
    ///
    /// # Errors
    ///
    /// - `Validation`: bad field values, or handle/email already in use
    /// - `DatabaseError`, `InternalError`: storage or hashing failure
    pub async fn register(&self, account: NewAccount) -> Result<User> {
        authorize(None, Operation::RegisterAccount, AccessPolicy::default()).into_result()?;
        let NewAccount {
            username,
            password,
            email,
        } = account;
        let email = email.trim().to_string();

        let mut errors = self.validate_account(&username, &password, &email);
        if !errors.contains("username")
            && self.users.find_user_by_username(&username).await?.is_some()
        {
            errors.add("username", USERNAME_TAKEN);
        }
        if !errors.contains("email") && self.users.find_user_by_email(&email).await?.is_some() {
            errors.add("email", EMAIL_TAKEN);
        }
        errors.into_result()?;

        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::InternalError(format!("hashing task failed: {e}")))??;

        let user = User {
            id: UserId::new(),
            username,
            email,
            password_hash,
            created_at: self.clock.now(),
        };

        match self.users.create_user(user).await {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, "Account registered");
                Ok(user)
            }
            // Lost a race with a concurrent sign-up.
            Err(StoreError::UniqueViolation(Conflict::Username)) => {
                Err(ValidationErrors::single("username", USERNAME_TAKEN).into())
            }
            Err(StoreError::UniqueViolation(Conflict::Email)) => {
                Err(ValidationErrors::single("email", EMAIL_TAKEN).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn validate_account(&self, username: &str, password: &str, email: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if username.is_empty() {
            errors.add("username", BLANK);
        } else if username.chars().count() > MAX_USERNAME_LENGTH {
            errors.add(
                "username",
                format!("Ensure this field has no more than {MAX_USERNAME_LENGTH} characters."),
            );
        } else if !is_valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        if email.is_empty() {
            errors.add("email", BLANK);
        } else if !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        let length = password.chars().count();
        if password.trim().is_empty() {
            errors.add("password", BLANK);
        } else if length < self.config.min_password_length {
            errors.add(
                "password",
                format!(
                    "Ensure this field has at least {} characters.",
                    self.config.min_password_length
                ),
            );
        } else if length > self.config.max_password_length {
            errors.add(
                "password",
                format!(
                    "Ensure this field has no more than {} characters.",
                    self.config.max_password_length
                ),
            );
        }

        errors
    }

    /// Verify credentials and issue an access/refresh pair.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials`: unknown handle or wrong password (same error for both)
    /// - `DatabaseError`, `InternalError`: storage, hashing or signing failure
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        authorize(None, Operation::Login, AccessPolicy::default()).into_result()?;
        let user = self.users.find_user_by_username(username).await?;

        // Unknown handles still pay for one verification.
        let password = password.to_string();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || {
            verify_password_or_dummy(&password, stored_hash.as_deref())
        })
        .await
        .map_err(|e| AuthError::InternalError(format!("verification task failed: {e}")))?;

        let user = match (user, matches) {
            (Some(user), true) => user,
            (Some(user), false) => {
                warn!(user_id = %user.id, "Login with wrong password");
                return Err(AuthError::InvalidCredentials);
            }
            (None, _) => {
                debug!(username = %username, "Login for unknown handle");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let pair = self.tokens.issue_pair(user.id, &user.username, self.clock.now())?;
        info!(user_id = %user.id, "Login succeeded");
        Ok(pair)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// - `InvalidToken`: bad signature, wrong token type, or the user no longer exists
    /// - `TokenExpired`: refresh token expired
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        authorize(None, Operation::RefreshToken, AccessPolicy::default()).into_result()?;
        let now = self.clock.now();
        let claims = self.tokens.verify(refresh_token, TokenType::Refresh, now)?;
        if self.users.find_user(claims.sub).await?.is_none() {
            return Err(AuthError::InvalidToken);
        }
        self.tokens
            .issue(claims.sub, &claims.username, TokenType::Access, now)
    }

    /// Validate an access token and return the caller.
    ///
    /// # Errors
    ///
    /// - `InvalidToken`: bad signature or wrong token type
    /// - `TokenExpired`: access token expired
    pub fn authenticate(&self, access_token: &str) -> Result<Principal> {
        let claims = self
            .tokens
            .verify(access_token, TokenType::Access, self.clock.now())?;
        Ok(Principal {
            user_id: claims.sub,
            username: claims.username,
        })
    }

    /// The configuration the service was built with.
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::password::verify_password;
    use chrono::Duration;
    use eventhub_testing::{test_clock, FixedClock, InMemoryStore};
    use std::time::{Duration as StdDuration, Instant};

    fn service_with_clock() -> (AuthService, Arc<FixedClock>) {
        let clock = Arc::new(test_clock());
        let service = AuthService::new(
            Arc::new(InMemoryStore::new()),
            AuthConfig::new("test-secret".to_string()),
            clock.clone(),
        );
        (service, clock)
    }

    fn service() -> AuthService {
        service_with_clock().0
    }

    fn alice() -> NewAccount {
        NewAccount {
            username: "alice".to_string(),
            password: "pw123".to_string(),
            email: "a@x.com".to_string(),
        }
    }

    fn validation(err: AuthError) -> ValidationErrors {
        match err {
            AuthError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let user = service().register(alice()).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "pw123");
        assert!(verify_password("pw123", &user.password_hash));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let service = service();
        service.register(alice()).await.unwrap();

        let mut again = alice();
        again.email = "other@x.com".to_string();
        let errors = validation(service.register(again).await.unwrap_err());
        assert!(errors.contains("username"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_ignores_case() {
        let service = service();
        service.register(alice()).await.unwrap();

        let bob = NewAccount {
            username: "bob".to_string(),
            password: "pw123".to_string(),
            email: "A@X.com".to_string(),
        };
        let errors = validation(service.register(bob).await.unwrap_err());
        assert!(errors.contains("email"));
    }

    #[tokio::test]
    async fn test_register_collects_every_field_error() {
        let errors = validation(
            service()
                .register(NewAccount {
                    username: "bad handle".to_string(),
                    password: "pw".to_string(),
                    email: "nope".to_string(),
                })
                .await
                .unwrap_err(),
        );
        assert!(errors.contains("username"));
        assert!(errors.contains("password"));
        assert!(errors.contains("email"));
    }

    #[tokio::test]
    async fn test_register_rejects_blank_fields() {
        let errors = validation(service().register(NewAccount::default()).await.unwrap_err());
        for field in ["username", "password", "email"] {
            assert_eq!(errors.get(field).unwrap(), [BLANK.to_string()]);
        }
    }

    #[tokio::test]
    async fn test_login_and_authenticate() {
        let service = service();
        let user = service.register(alice()).await.unwrap();

        let pair = service.login("alice", "pw123").await.unwrap();
        let principal = service.authenticate(&pair.access).unwrap();

        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.username, "alice");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.register(alice()).await.unwrap();

        let wrong_password = service.login("alice", "wrong").await.unwrap_err();
        let unknown_user = service.login("mallory", "pw123").await.unwrap_err();

        assert_eq!(wrong_password, AuthError::InvalidCredentials);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    async fn time_failed_logins(service: &AuthService, username: &str, rounds: u32) -> StdDuration {
        let started = Instant::now();
        for _ in 0..rounds {
            assert_eq!(
                service.login(username, "wrong").await,
                Err(AuthError::InvalidCredentials)
            );
        }
        started.elapsed()
    }

    #[tokio::test]
    async fn test_unknown_handle_costs_a_password_check() {
        let service = service();
        service.register(alice()).await.unwrap();
        // Warm up the dummy hash.
        let _ = service.login("mallory", "wrong").await;

        let unknown = time_failed_logins(&service, "mallory", 3).await;
        let wrong_password = time_failed_logins(&service, "alice", 3).await;

        // Both paths run one Argon2 verification; without it the unknown
        // handle answers orders of magnitude faster.
        assert!(
            unknown * 4 >= wrong_password,
            "unknown handle {unknown:?} vs wrong password {wrong_password:?}"
        );
    }

    #[tokio::test]
    async fn test_register_reports_taken_email_with_other_field_errors() {
        let service = service();
        service.register(alice()).await.unwrap();

        let errors = validation(
            service
                .register(NewAccount {
                    username: "bob".to_string(),
                    password: "pw".to_string(),
                    email: "A@x.com".to_string(),
                })
                .await
                .unwrap_err(),
        );
        assert_eq!(errors.get("email").unwrap(), [EMAIL_TAKEN.to_string()]);
        assert!(errors.contains("password"));
        assert!(!errors.contains("username"));
    }

    #[tokio::test]
    async fn test_refresh_issues_working_access_token() {
        let (service, clock) = service_with_clock();
        service.register(alice()).await.unwrap();
        let pair = service.login("alice", "pw123").await.unwrap();

        clock.advance(Duration::minutes(10));
        assert_eq!(
            service.authenticate(&pair.access),
            Err(AuthError::TokenExpired)
        );

        let access = service.refresh(&pair.refresh).await.unwrap();
        assert!(service.authenticate(&access).is_ok());
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let service = service();
        service.register(alice()).await.unwrap();
        let pair = service.login("alice", "pw123").await.unwrap();

        assert_eq!(
            service.authenticate(&pair.refresh),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            service.refresh(&pair.access).await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_expired_refresh_token() {
        let (service, clock) = service_with_clock();
        service.register(alice()).await.unwrap();
        let pair = service.login("alice", "pw123").await.unwrap();

        clock.advance(Duration::days(2));
        assert_eq!(
            service.refresh(&pair.refresh).await,
            Err(AuthError::TokenExpired)
        );
    }
}

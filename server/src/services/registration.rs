//! Event registration with email confirmation.
//!
//! A registration is written first, then the confirmation is sent. If the
//! email cannot be delivered the registration is deleted again and the
//! caller gets the delivery failure, so a stored registration always had its
//! confirmation sent.

use super::{Repositories, ServiceError, REQUIRED};
use crate::metrics;
use eventhub_auth::{authorize, AccessPolicy, AuthError, EmailProvider, Operation, Principal};
use eventhub_core::environment::Clock;
use eventhub_core::{
    Conflict, Event, EventId, Registration, StoreError, User, ValidationErrors, NON_FIELD_ERRORS,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const EVENT_DOES_NOT_EXIST: &str = "Event does not exist.";
const ALREADY_REGISTERED: &str = "You are already registered for this event.";

/// Registration request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    /// Id of the event to register for
    pub event: Option<String>,
}

/// Subject and body of the confirmation email.
#[must_use]
pub fn confirmation_message(event: &Event) -> (String, String) {
    let subject = format!("Registration confirmed: {}", event.title);
    let body = format!(
        "You have successfully registered for \"{}\", taking place on {} at {}.",
        event.title,
        event.date.format("%Y-%m-%d %H:%M:%S%:z"),
        event.location,
    );
    (subject, body)
}

/// Registers users for events and lists their registrations.
#[derive(Clone)]
pub struct RegistrationService {
    repos: Repositories,
    email: Arc<dyn EmailProvider>,
    clock: Arc<dyn Clock>,
    policy: AccessPolicy,
}

impl RegistrationService {
    /// Create a registration service.
    #[must_use]
    pub fn new(
        repos: Repositories,
        email: Arc<dyn EmailProvider>,
        clock: Arc<dyn Clock>,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            repos,
            email,
            clock,
            policy,
        }
    }

    /// Register the caller for an event and send the confirmation email.
    ///
    /// # Errors
    ///
    /// - `Auth`: anonymous caller, or the caller's account no longer exists
    /// - `Validation`: missing or unknown event, or already registered
    /// - `Notification`: the confirmation could not be sent; the registration
    ///   has been removed again
    pub async fn register_for_event(
        &self,
        principal: Option<&Principal>,
        input: &RegistrationInput,
    ) -> Result<Registration, ServiceError> {
        authorize(principal, Operation::RegisterForEvent, self.policy).into_result()?;
        let principal = principal.ok_or(AuthError::NotAuthenticated)?;

        let event = self.resolve_event(input.event.as_deref()).await?;
        let user = self.registrant(principal).await?;

        let registration = Registration::new(user.id, event.id, self.clock.now());
        let registration = match self.repos.registrations.insert_registration(registration).await {
            Ok(registration) => registration,
            Err(StoreError::UniqueViolation(Conflict::Registration)) => {
                metrics::registration("duplicate");
                return Err(ValidationErrors::single(NON_FIELD_ERRORS, ALREADY_REGISTERED).into());
            }
            Err(StoreError::MissingReference(_)) => {
                return Err(ValidationErrors::single("event", EVENT_DOES_NOT_EXIST).into());
            }
            Err(e) => return Err(e.into()),
        };

        let (subject, body) = confirmation_message(&event);
        if let Err(err) = self.email.send_email(&user.email, &subject, &body).await {
            metrics::notification("failed");
            warn!(
                registration_id = %registration.id,
                error = %err,
                "Confirmation email failed, removing registration"
            );
            if let Err(cleanup) = self.repos.registrations.delete_registration(registration.id).await {
                tracing::error!(
                    registration_id = %registration.id,
                    error = %cleanup,
                    "Could not remove unconfirmed registration"
                );
            }
            metrics::registration("rolled_back");
            return Err(ServiceError::Notification(err.to_string()));
        }

        metrics::notification("sent");
        metrics::registration("created");
        info!(
            registration_id = %registration.id,
            user_id = %user.id,
            event_id = %event.id,
            "Registered for event"
        );
        Ok(registration)
    }

    /// The caller's registrations, oldest first.
    ///
    /// # Errors
    ///
    /// - `Auth`: anonymous caller
    /// - `Store`: storage failure
    pub async fn list_my_registrations(
        &self,
        principal: Option<&Principal>,
    ) -> Result<Vec<Registration>, ServiceError> {
        authorize(principal, Operation::ListOwnRegistrations, self.policy).into_result()?;
        let principal = principal.ok_or(AuthError::NotAuthenticated)?;

        let mut registrations = self
            .repos
            .registrations
            .list_registrations_for_user(principal.user_id)
            .await?;
        registrations.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(registrations)
    }

    async fn resolve_event(&self, raw: Option<&str>) -> Result<Event, ServiceError> {
        let Some(raw) = raw else {
            return Err(ValidationErrors::single("event", REQUIRED).into());
        };
        let Ok(uuid) = Uuid::parse_str(raw.trim()) else {
            return Err(ValidationErrors::single("event", "Must be a valid UUID.").into());
        };
        self.repos
            .events
            .get_event(EventId::from_uuid(uuid))
            .await?
            .ok_or_else(|| ValidationErrors::single("event", EVENT_DOES_NOT_EXIST).into())
    }

    async fn registrant(&self, principal: &Principal) -> Result<User, ServiceError> {
        // A valid token can outlive its account.
        self.repos
            .users
            .find_user(principal.user_id)
            .await?
            .ok_or_else(|| AuthError::InvalidToken.into())
    }
}

impl std::fmt::Debug for RegistrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::Duration;
    use eventhub_auth::mocks::MockEmailProvider;
    use eventhub_core::{EventRepository, UserRepository};
    use eventhub_testing::helpers::{event_details, user};
    use eventhub_testing::{test_clock, FixedClock, InMemoryStore};

    struct Fixture {
        store: InMemoryStore,
        email: MockEmailProvider,
        clock: Arc<FixedClock>,
        service: RegistrationService,
        alice: Principal,
        event: Event,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let email = MockEmailProvider::new();
        let clock = Arc::new(test_clock());
        let service = RegistrationService::new(
            Repositories::from_store(store.clone()),
            Arc::new(email.clone()),
            clock.clone(),
            AccessPolicy::default(),
        );

        let account = store.create_user(user("alice", "a@x.com")).await.unwrap();
        let event = store
            .insert_event(Event::new(account.id, event_details("Meetup", "Hall A")))
            .await
            .unwrap();

        Fixture {
            store,
            email,
            clock,
            service,
            alice: Principal {
                user_id: account.id,
                username: account.username,
            },
            event,
        }
    }

    fn request(event: &Event) -> RegistrationInput {
        RegistrationInput {
            event: Some(event.id.to_string()),
        }
    }

    fn field_errors(err: ServiceError) -> ValidationErrors {
        match err {
            ServiceError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_sends_one_confirmation() {
        let f = fixture().await;

        let registration = f
            .service
            .register_for_event(Some(&f.alice), &request(&f.event))
            .await
            .unwrap();

        assert_eq!(registration.user, f.alice.user_id);
        assert_eq!(registration.event, f.event.id);
        assert_eq!(registration.registered_at, f.clock.now());

        let sent = f.email.sent_to("a@x.com");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Registration confirmed: Meetup");
        assert_eq!(
            sent[0].body,
            "You have successfully registered for \"Meetup\", taking place on \
             2025-01-01 10:00:00+00:00 at Hall A."
        );
    }

    #[tokio::test]
    async fn test_second_registration_is_rejected() {
        let f = fixture().await;
        f.service
            .register_for_event(Some(&f.alice), &request(&f.event))
            .await
            .unwrap();

        let errors = field_errors(
            f.service
                .register_for_event(Some(&f.alice), &request(&f.event))
                .await
                .unwrap_err(),
        );

        assert_eq!(
            errors.get(NON_FIELD_ERRORS).unwrap(),
            [ALREADY_REGISTERED.to_string()]
        );
        assert_eq!(
            f.store.registration_count(f.alice.user_id, f.event.id).unwrap(),
            1
        );
        assert_eq!(f.email.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_event_field_errors() {
        let f = fixture().await;

        for (input, message) in [
            (RegistrationInput { event: None }, REQUIRED),
            (
                RegistrationInput {
                    event: Some("42".to_string()),
                },
                "Must be a valid UUID.",
            ),
            (
                RegistrationInput {
                    event: Some(EventId::new().to_string()),
                },
                EVENT_DOES_NOT_EXIST,
            ),
        ] {
            let errors = field_errors(
                f.service
                    .register_for_event(Some(&f.alice), &input)
                    .await
                    .unwrap_err(),
            );
            assert_eq!(errors.get("event").unwrap(), [message.to_string()]);
        }
    }

    #[tokio::test]
    async fn test_failed_notification_removes_registration() {
        let f = fixture().await;
        f.email.set_failing(true);

        let err = f
            .service
            .register_for_event(Some(&f.alice), &request(&f.event))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Notification(_)));
        assert_eq!(f.store.total_registrations().unwrap(), 0);

        f.email.set_failing(false);
        f.service
            .register_for_event(Some(&f.alice), &request(&f.event))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_anonymous_caller_rejected() {
        let f = fixture().await;
        assert!(matches!(
            f.service.register_for_event(None, &request(&f.event)).await,
            Err(ServiceError::Auth(AuthError::NotAuthenticated))
        ));
        assert!(matches!(
            f.service.list_my_registrations(None).await,
            Err(ServiceError::Auth(AuthError::NotAuthenticated))
        ));
    }

    #[tokio::test]
    async fn test_list_is_own_registrations_in_order() {
        let f = fixture().await;
        let second = f
            .store
            .insert_event(Event::new(f.alice.user_id, event_details("Workshop", "Hall B")))
            .await
            .unwrap();

        f.service
            .register_for_event(Some(&f.alice), &request(&second))
            .await
            .unwrap();
        f.clock.advance(Duration::minutes(-5));
        f.service
            .register_for_event(Some(&f.alice), &request(&f.event))
            .await
            .unwrap();

        let bob = f.store.create_user(user("bob", "b@x.com")).await.unwrap();
        let bob = Principal {
            user_id: bob.id,
            username: bob.username,
        };
        assert!(f.service.list_my_registrations(Some(&bob)).await.unwrap().is_empty());

        let mine = f.service.list_my_registrations(Some(&f.alice)).await.unwrap();
        let events: Vec<_> = mine.iter().map(|r| r.event).collect();
        assert_eq!(events, vec![f.event.id, second.id]);
    }

    #[tokio::test]
    async fn test_deleted_event_drops_out_of_list() {
        let f = fixture().await;
        f.service
            .register_for_event(Some(&f.alice), &request(&f.event))
            .await
            .unwrap();

        f.store.delete_event(f.event.id).await.unwrap();

        assert!(f
            .service
            .list_my_registrations(Some(&f.alice))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_store_one_row() {
        let f = fixture().await;

        let attempts = (0..8).map(|_| {
            let service = f.service.clone();
            let alice = f.alice.clone();
            let input = request(&f.event);
            tokio::spawn(async move { service.register_for_event(Some(&alice), &input).await })
        });
        let mut created = 0;
        for attempt in attempts.collect::<Vec<_>>() {
            if attempt.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(
            f.store.registration_count(f.alice.user_id, f.event.id).unwrap(),
            1
        );
    }
}

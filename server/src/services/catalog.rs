//! Event catalog: browse, search, create, update and delete events.

use super::{ServiceError, BLANK, REQUIRED};
use crate::metrics;
use eventhub_auth::{authorize, AccessPolicy, AuthError, Operation, Principal};
use eventhub_core::types::parse_datetime;
use eventhub_core::{
    Event, EventDetails, EventId, EventQuery, EventRepository, StoreError, ValidationErrors,
    LOCATION_MAX_LENGTH, NON_FIELD_ERRORS, TITLE_MAX_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const DATE_FORMAT: &str = "Datetime has wrong format. Use one of these formats instead: \
                           YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].";

/// Catalog access switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPolicy {
    /// Only the organizer may update or delete an event.
    pub enforce_event_ownership: bool,
}

impl From<CatalogPolicy> for AccessPolicy {
    fn from(policy: CatalogPolicy) -> Self {
        Self {
            enforce_event_ownership: policy.enforce_event_ownership,
        }
    }
}

/// Event fields as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventInput {
    /// Title
    pub title: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Date-time, RFC 3339 or naive ISO 8601 (taken as UTC)
    pub date: Option<String>,
    /// Location
    pub location: Option<String>,
}

impl EventInput {
    /// Validate every field and collect all failures.
    ///
    /// Text fields are trimmed before the blank and length checks.
    ///
    /// # Errors
    ///
    /// Returns the field map when any field is missing, blank, too long or,
    /// for `date`, unparseable.
    pub fn validate(&self) -> Result<EventDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = text_field(&mut errors, "title", self.title.as_deref(), Some(TITLE_MAX_LENGTH));
        let description = text_field(&mut errors, "description", self.description.as_deref(), None);
        let location = text_field(
            &mut errors,
            "location",
            self.location.as_deref(),
            Some(LOCATION_MAX_LENGTH),
        );
        let date = match self.date.as_deref() {
            None => {
                errors.add("date", REQUIRED);
                None
            }
            Some(raw) => {
                let parsed = parse_datetime(raw);
                if parsed.is_none() {
                    errors.add("date", DATE_FORMAT);
                }
                parsed
            }
        };

        errors.into_result()?;
        match (title, description, date, location) {
            (Some(title), Some(description), Some(date), Some(location)) => Ok(EventDetails {
                title,
                description,
                date,
                location,
            }),
            _ => Err(ValidationErrors::single(NON_FIELD_ERRORS, "Invalid data.")),
        }
    }
}

fn text_field(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max_length: Option<usize>,
) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if let Some(max) = max_length {
        if value.chars().count() > max {
            errors.add(
                field,
                format!("Ensure this field has no more than {max} characters."),
            );
            return None;
        }
    }
    Some(value.to_string())
}

/// Event catalog operations.
#[derive(Clone)]
pub struct CatalogService {
    events: Arc<dyn EventRepository>,
    policy: AccessPolicy,
}

impl CatalogService {
    /// Create a catalog over an event store.
    #[must_use]
    pub fn new(events: Arc<dyn EventRepository>, policy: CatalogPolicy) -> Self {
        Self {
            events,
            policy: policy.into(),
        }
    }

    fn authorize(&self, principal: Option<&Principal>, operation: Operation) -> Result<(), AuthError> {
        authorize(principal, operation, self.policy).into_result()
    }

    /// Filter, search and order events. Open to anonymous callers.
    ///
    /// # Errors
    ///
    /// Returns `Store` on storage failure.
    pub async fn list(
        &self,
        principal: Option<&Principal>,
        query: &EventQuery,
    ) -> Result<Vec<Event>, ServiceError> {
        self.authorize(principal, Operation::ListEvents)?;
        Ok(self.events.list_events(query).await?)
    }

    /// Fetch one event.
    ///
    /// # Errors
    ///
    /// - `Auth`: anonymous caller
    /// - `NotFound`: no such event
    pub async fn get(&self, principal: Option<&Principal>, id: EventId) -> Result<Event, ServiceError> {
        self.authorize(principal, Operation::ViewEvent)?;
        self.load(id).await
    }

    /// Create an event organised by the caller.
    ///
    /// # Errors
    ///
    /// - `Auth`: anonymous caller, or the caller's account no longer exists
    /// - `Validation`: bad input
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        input: &EventInput,
    ) -> Result<Event, ServiceError> {
        self.authorize(principal, Operation::CreateEvent)?;
        let organizer = principal.ok_or(AuthError::NotAuthenticated)?.user_id;
        let details = input.validate()?;

        // A token can outlive its account; treat it like any other stale token.
        let event = match self.events.insert_event(Event::new(organizer, details)).await {
            Ok(event) => event,
            Err(StoreError::MissingReference(_)) => return Err(AuthError::InvalidToken.into()),
            Err(e) => return Err(e.into()),
        };
        metrics::event_created();
        info!(event_id = %event.id, organizer = %organizer, "Event created");
        Ok(event)
    }

    /// Replace every editable field of an event. The organizer is kept.
    ///
    /// # Errors
    ///
    /// - `Auth`: anonymous caller, or not the organizer when ownership is enforced
    /// - `NotFound`: no such event
    /// - `Validation`: bad input
    pub async fn update(
        &self,
        principal: Option<&Principal>,
        id: EventId,
        input: &EventInput,
    ) -> Result<Event, ServiceError> {
        self.authorize(principal, Operation::UpdateEvent { organizer: None })?;
        let mut event = self.load(id).await?;
        self.authorize(
            principal,
            Operation::UpdateEvent {
                organizer: Some(event.organizer),
            },
        )?;

        event.apply(input.validate()?);
        let event = self
            .events
            .update_event(event)
            .await
            .map_err(|e| not_found_or(e, id))?;
        info!(event_id = %event.id, "Event updated");
        Ok(event)
    }

    /// Delete an event and its registrations.
    ///
    /// # Errors
    ///
    /// - `Auth`: anonymous caller, or not the organizer when ownership is enforced
    /// - `NotFound`: no such event
    pub async fn delete(&self, principal: Option<&Principal>, id: EventId) -> Result<(), ServiceError> {
        self.authorize(principal, Operation::DeleteEvent { organizer: None })?;
        let event = self.load(id).await?;
        self.authorize(
            principal,
            Operation::DeleteEvent {
                organizer: Some(event.organizer),
            },
        )?;

        self.events
            .delete_event(id)
            .await
            .map_err(|e| not_found_or(e, id))?;
        info!(event_id = %id, "Event deleted");
        Ok(())
    }

    async fn load(&self, id: EventId) -> Result<Event, ServiceError> {
        self.events
            .get_event(id)
            .await?
            .ok_or_else(|| event_not_found(id))
    }
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn event_not_found(id: EventId) -> ServiceError {
    ServiceError::NotFound {
        resource: "Event",
        id: id.to_string(),
    }
}

// A concurrent delete between load and write surfaces as NotFound.
fn not_found_or(err: StoreError, id: EventId) -> ServiceError {
    match err {
        StoreError::NotFound => event_not_found(id),
        other => other.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use eventhub_core::{DateFilter, UserId, UserRepository};
    use eventhub_testing::helpers::user;
    use eventhub_testing::InMemoryStore;

    struct Fixture {
        store: InMemoryStore,
        catalog: CatalogService,
    }

    impl Fixture {
        fn new(policy: CatalogPolicy) -> Self {
            let store = InMemoryStore::new();
            let catalog = CatalogService::new(Arc::new(store.clone()), policy);
            Self { store, catalog }
        }

        async fn account(&self, username: &str) -> Principal {
            let account = self
                .store
                .create_user(user(username, &format!("{username}@x.com")))
                .await
                .unwrap();
            Principal {
                user_id: account.id,
                username: account.username,
            }
        }
    }

    fn input(title: &str, location: &str) -> EventInput {
        EventInput {
            title: Some(title.to_string()),
            description: Some("Monthly get-together".to_string()),
            date: Some("2025-01-01T10:00".to_string()),
            location: Some(location.to_string()),
        }
    }

    fn field_errors(err: ServiceError) -> ValidationErrors {
        match err {
            ServiceError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_echoes_fields() {
        let f = Fixture::new(CatalogPolicy::default());
        let alice = f.account("alice").await;

        let created = f
            .catalog
            .create(Some(&alice), &input("Meetup", "Hall A"))
            .await
            .unwrap();
        let fetched = f.catalog.get(Some(&alice), created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.title, "Meetup");
        assert_eq!(fetched.organizer, alice.user_id);
        assert_eq!(fetched.date.to_rfc3339(), "2025-01-01T10:00:00+00:00");
    }

    #[tokio::test]
    async fn test_create_with_deleted_account_is_invalid_token() {
        let f = Fixture::new(CatalogPolicy::default());
        let ghost = Principal {
            user_id: UserId::new(),
            username: "ghost".to_string(),
        };

        assert!(matches!(
            f.catalog.create(Some(&ghost), &input("Meetup", "Hall A")).await,
            Err(ServiceError::Auth(AuthError::InvalidToken))
        ));
        assert!(f.catalog.list(None, &EventQuery::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_may_list_but_not_create() {
        let f = Fixture::new(CatalogPolicy::default());

        assert!(f.catalog.list(None, &EventQuery::new()).await.unwrap().is_empty());
        assert!(matches!(
            f.catalog.create(None, &input("Meetup", "Hall A")).await,
            Err(ServiceError::Auth(AuthError::NotAuthenticated))
        ));
    }

    #[tokio::test]
    async fn test_create_collects_field_errors() {
        let f = Fixture::new(CatalogPolicy::default());
        let alice = f.account("alice").await;
        let bad = EventInput {
            title: Some("x".repeat(101)),
            description: Some("   ".to_string()),
            date: Some("next tuesday".to_string()),
            location: None,
        };

        let errors = field_errors(f.catalog.create(Some(&alice), &bad).await.unwrap_err());
        assert_eq!(
            errors.get("title").unwrap(),
            ["Ensure this field has no more than 100 characters.".to_string()]
        );
        assert_eq!(errors.get("description").unwrap(), [BLANK.to_string()]);
        assert_eq!(errors.get("location").unwrap(), [REQUIRED.to_string()]);
        assert!(errors.contains("date"));
    }

    #[tokio::test]
    async fn test_title_filter_is_case_sensitive_and_search_is_not() {
        let f = Fixture::new(CatalogPolicy::default());
        let alice = f.account("alice").await;
        f.catalog.create(Some(&alice), &input("Meetup", "Hall A")).await.unwrap();
        f.catalog.create(Some(&alice), &input("meetup", "Hall B")).await.unwrap();

        let exact = f
            .catalog
            .list(None, &EventQuery::new().with_title("Meetup"))
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].location, "Hall A");

        let lower = f
            .catalog
            .list(None, &EventQuery::new().with_title("meetup"))
            .await
            .unwrap();
        assert_eq!(lower.len(), 1);
        assert_eq!(lower[0].location, "Hall B");

        for term in ["MEETUP", "meetup"] {
            let searched = f
                .catalog
                .list(None, &EventQuery::new().with_search(term))
                .await
                .unwrap();
            assert_eq!(searched.len(), 2, "search {term}");
        }
    }

    #[tokio::test]
    async fn test_date_filter_by_day() {
        let f = Fixture::new(CatalogPolicy::default());
        let alice = f.account("alice").await;
        f.catalog.create(Some(&alice), &input("Meetup", "Hall A")).await.unwrap();

        let query = EventQuery::new().with_date(DateFilter::parse("2025-01-01").unwrap());
        assert_eq!(f.catalog.list(None, &query).await.unwrap().len(), 1);

        let query = EventQuery::new().with_date(DateFilter::parse("2025-01-02").unwrap());
        assert!(f.catalog.list(None, &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_keeps_organizer() {
        let f = Fixture::new(CatalogPolicy::default());
        let alice = f.account("alice").await;
        let bob = f.account("bob").await;
        let event = f
            .catalog
            .create(Some(&alice), &input("Meetup", "Hall A"))
            .await
            .unwrap();

        let updated = f
            .catalog
            .update(Some(&bob), event.id, &input("Workshop", "Hall B"))
            .await
            .unwrap();

        assert_eq!(updated.id, event.id);
        assert_eq!(updated.title, "Workshop");
        assert_eq!(updated.organizer, alice.user_id);
    }

    #[tokio::test]
    async fn test_missing_event_is_not_found() {
        let f = Fixture::new(CatalogPolicy::default());
        let caller = f.account("alice").await;

        assert!(matches!(
            f.catalog.get(Some(&caller), EventId::new()).await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches!(
            f.catalog.delete(Some(&caller), EventId::new()).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_ownership_enforced_when_enabled() {
        let f = Fixture::new(CatalogPolicy {
            enforce_event_ownership: true,
        });
        let alice = f.account("alice").await;
        let bob = f.account("bob").await;
        let event = f
            .catalog
            .create(Some(&alice), &input("Meetup", "Hall A"))
            .await
            .unwrap();

        assert!(matches!(
            f.catalog.delete(Some(&bob), event.id).await,
            Err(ServiceError::Auth(AuthError::PermissionDenied(_)))
        ));
        f.catalog.delete(Some(&alice), event.id).await.unwrap();
    }
}

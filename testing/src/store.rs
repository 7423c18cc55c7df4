//! In-memory implementation of the storage traits.
//!
//! All three tables live behind one mutex, so every trait method is a single
//! critical section. That gives the same atomicity the `PostgreSQL` store gets
//! from constraints and transactions: a duplicate registration check and its
//! insert cannot interleave with another writer, and cascades are all-or-nothing.

use eventhub_core::{
    Conflict, Event, EventId, EventQuery, EventRepository, Registration, RegistrationId,
    RegistrationRepository, StoreError, StoreFuture, StoreHealth, User, UserId, UserRepository,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    events: HashMap<EventId, Event>,
    registrations: HashMap<RegistrationId, Registration>,
}

impl Tables {
    fn remove_event_cascade(&mut self, id: EventId) -> bool {
        if self.events.remove(&id).is_none() {
            return false;
        }
        self.registrations.retain(|_, r| r.event != id);
        true
    }
}

/// In-memory store.
///
/// Cloning is cheap and clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::DatabaseError("in-memory store lock poisoned".to_string()))
    }

    /// Number of stored registrations for a `(user, event)` pair.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the lock is poisoned.
    pub fn registration_count(&self, user: UserId, event: EventId) -> Result<usize, StoreError> {
        Ok(self
            .lock()?
            .registrations
            .values()
            .filter(|r| r.user == user && r.event == event)
            .count())
    }

    /// Total number of stored registrations.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the lock is poisoned.
    pub fn total_registrations(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.registrations.len())
    }
}

impl StoreHealth for InMemoryStore {
    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.lock().map(|_| ()) })
    }
}

impl UserRepository for InMemoryStore {
    fn create_user(&self, user: User) -> StoreFuture<'_, User> {
        Box::pin(async move {
            let mut tables = self.lock()?;
            if tables.users.values().any(|u| u.username == user.username) {
                return Err(StoreError::UniqueViolation(Conflict::Username));
            }
            if tables
                .users
                .values()
                .any(|u| u.email.eq_ignore_ascii_case(&user.email))
            {
                return Err(StoreError::UniqueViolation(Conflict::Email));
            }
            tables.users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    fn find_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move { Ok(self.lock()?.users.get(&id).cloned()) })
    }

    fn find_user_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            Ok(self
                .lock()?
                .users
                .values()
                .find(|u| u.username == username)
                .cloned())
        })
    }

    fn find_user_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            Ok(self
                .lock()?
                .users
                .values()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned())
        })
    }

    fn delete_user(&self, id: UserId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tables = self.lock()?;
            if tables.users.remove(&id).is_none() {
                return Err(StoreError::NotFound);
            }
            let organized: Vec<EventId> = tables
                .events
                .values()
                .filter(|e| e.organizer == id)
                .map(|e| e.id)
                .collect();
            for event in organized {
                tables.remove_event_cascade(event);
            }
            tables.registrations.retain(|_, r| r.user != id);
            Ok(())
        })
    }
}

impl EventRepository for InMemoryStore {
    fn insert_event(&self, event: Event) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            let mut tables = self.lock()?;
            if !tables.users.contains_key(&event.organizer) {
                return Err(StoreError::MissingReference(format!(
                    "organizer {}",
                    event.organizer
                )));
            }
            tables.events.insert(event.id, event.clone());
            Ok(event)
        })
    }

    fn get_event(&self, id: EventId) -> StoreFuture<'_, Option<Event>> {
        Box::pin(async move { Ok(self.lock()?.events.get(&id).cloned()) })
    }

    fn list_events<'a>(&'a self, query: &'a EventQuery) -> StoreFuture<'a, Vec<Event>> {
        Box::pin(async move {
            let tables = self.lock()?;
            Ok(query.apply(tables.events.values().cloned()))
        })
    }

    fn update_event(&self, event: Event) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            let mut tables = self.lock()?;
            let stored = tables.events.get_mut(&event.id).ok_or(StoreError::NotFound)?;
            stored.apply(event.details());
            Ok(stored.clone())
        })
    }

    fn delete_event(&self, id: EventId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if self.lock()?.remove_event_cascade(id) {
                Ok(())
            } else {
                Err(StoreError::NotFound)
            }
        })
    }
}

impl RegistrationRepository for InMemoryStore {
    fn insert_registration(&self, registration: Registration) -> StoreFuture<'_, Registration> {
        Box::pin(async move {
            let mut tables = self.lock()?;
            if !tables.users.contains_key(&registration.user) {
                return Err(StoreError::MissingReference(format!(
                    "user {}",
                    registration.user
                )));
            }
            if !tables.events.contains_key(&registration.event) {
                return Err(StoreError::MissingReference(format!(
                    "event {}",
                    registration.event
                )));
            }
            if tables
                .registrations
                .values()
                .any(|r| r.user == registration.user && r.event == registration.event)
            {
                return Err(StoreError::UniqueViolation(Conflict::Registration));
            }
            tables
                .registrations
                .insert(registration.id, registration.clone());
            Ok(registration)
        })
    }

    fn delete_registration(&self, id: RegistrationId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.lock()?
                .registrations
                .remove(&id)
                .map(|_| ())
                .ok_or(StoreError::NotFound)
        })
    }

    fn list_registrations_for_user(&self, user: UserId) -> StoreFuture<'_, Vec<Registration>> {
        Box::pin(async move {
            let tables = self.lock()?;
            let mut registrations: Vec<Registration> = tables
                .registrations
                .values()
                .filter(|r| r.user == user)
                .cloned()
                .collect();
            registrations.sort_by(|a, b| {
                a.registered_at
                    .cmp(&b.registered_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            Ok(registrations)
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::helpers::{event_details, user};
    use chrono::Utc;

    async fn seeded() -> (InMemoryStore, User, Event) {
        let store = InMemoryStore::new();
        let alice = store
            .create_user(user("alice", "a@x.com"))
            .await
            .expect("create user");
        let event = store
            .insert_event(Event::new(alice.id, event_details("Meetup", "Hall A")))
            .await
            .expect("insert event");
        (store, alice, event)
    }

    #[tokio::test]
    async fn test_find_user_by_email_ignores_case() {
        let (store, alice, _) = seeded().await;

        let found = store.find_user_by_email("A@X.COM").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));
        assert!(store.find_user_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (store, _, _) = seeded().await;
        let err = store
            .create_user(user("alice", "other@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(Conflict::Username)));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_ignoring_case() {
        let (store, _, _) = seeded().await;
        let err = store.create_user(user("bob", "A@X.COM")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(Conflict::Email)));
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let (store, alice, event) = seeded().await;
        store
            .insert_registration(Registration::new(alice.id, event.id, Utc::now()))
            .await
            .expect("first registration");

        let err = store
            .insert_registration(Registration::new(alice.id, event.id, Utc::now()))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::UniqueViolation(Conflict::Registration)));
        assert_eq!(store.registration_count(alice.id, event.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_registration_requires_existing_event() {
        let (store, alice, _) = seeded().await;
        let err = store
            .insert_registration(Registration::new(alice.id, EventId::new(), Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registrations_store_one_row() {
        let (store, alice, event) = seeded().await;

        let attempts = (0..16).map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .insert_registration(Registration::new(alice.id, event.id, Utc::now()))
                    .await
            })
        });
        let results = futures::future::join_all(attempts).await;

        let successes = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(_))))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(store.registration_count(alice.id, event.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_event_cascades_registrations() {
        let (store, alice, event) = seeded().await;
        store
            .insert_registration(Registration::new(alice.id, event.id, Utc::now()))
            .await
            .unwrap();

        store.delete_event(event.id).await.unwrap();

        assert!(store.get_event(event.id).await.unwrap().is_none());
        assert!(store.list_registrations_for_user(alice.id).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_event(event.id).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_delete_user_cascades_everything() {
        let (store, alice, event) = seeded().await;
        let bob = store.create_user(user("bob", "b@x.com")).await.unwrap();
        store
            .insert_registration(Registration::new(bob.id, event.id, Utc::now()))
            .await
            .unwrap();

        store.delete_user(alice.id).await.unwrap();

        assert!(store.find_user(alice.id).await.unwrap().is_none());
        assert!(store.get_event(event.id).await.unwrap().is_none());
        assert!(store.list_registrations_for_user(bob.id).await.unwrap().is_empty());
        assert_eq!(store.total_registrations().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_event() {
        let (store, alice, _) = seeded().await;
        let ghost = Event::new(alice.id, event_details("Ghost", "Nowhere"));
        assert!(matches!(
            store.update_event(ghost).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_one_registration_per_user_and_event(
                attempts in proptest::collection::vec((0_usize..3, 0_usize..3), 1..30)
            ) {
                futures::executor::block_on(async {
                    let store = InMemoryStore::new();
                    let mut users = Vec::new();
                    let mut events = Vec::new();
                    for i in 0..3 {
                        let u = store
                            .create_user(user(&format!("user{i}"), &format!("u{i}@x.com")))
                            .await
                            .unwrap();
                        let e = store
                            .insert_event(Event::new(u.id, event_details("Meetup", "Hall A")))
                            .await
                            .unwrap();
                        users.push(u);
                        events.push(e);
                    }

                    let mut accepted = std::collections::HashSet::new();
                    for (u, e) in attempts {
                        let result = store
                            .insert_registration(Registration::new(users[u].id, events[e].id, Utc::now()))
                            .await;
                        if accepted.insert((u, e)) {
                            prop_assert!(result.is_ok());
                        } else {
                            prop_assert!(matches!(result, Err(StoreError::UniqueViolation(Conflict::Registration))));
                        }
                    }
                    prop_assert_eq!(store.total_registrations().unwrap(), accepted.len());
                    Ok(())
                })?;
            }
        }
    }
}

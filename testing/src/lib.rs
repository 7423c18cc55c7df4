//! # Eventhub Testing
//!
//! Testing utilities and helpers for eventhub.
//!
//! This crate provides:
//! - [`InMemoryStore`]: all storage traits over one in-memory state
//! - [`FixedClock`]: deterministic time
//! - Fixtures for users and event details
//!
//! ## Example
//!
//! ```
//! use eventhub_core::{EventRepository, EventQuery};
//! use eventhub_testing::InMemoryStore;
//!
//! # futures::executor::block_on(async {
//! let store = InMemoryStore::new();
//! let query = EventQuery::new();
//! let events = store.list_events(&query).await.unwrap();
//! assert!(events.is_empty());
//! # });
//! ```

pub mod store;

pub use mocks::{test_clock, FixedClock};
pub use store::InMemoryStore;

/// Mock implementations for testing.
pub mod mocks {
    use chrono::{DateTime, Duration, Utc};
    use eventhub_core::environment::Clock;
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until explicitly advanced.
    ///
    /// # Example
    ///
    /// ```
    /// use eventhub_testing::mocks::FixedClock;
    /// use eventhub_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug)]
    pub struct FixedClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            if let Ok(mut time) = self.time.lock() {
                *time += by;
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
                .lock()
                .map_or_else(|poisoned| *poisoned.into_inner(), |time| *time)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and fixtures.
pub mod helpers {
    use chrono::{DateTime, Utc};
    use eventhub_core::{EventDetails, User, UserId};

    /// Install a test-friendly tracing subscriber (idempotent).
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }

    /// A user record with a placeholder hash.
    #[must_use]
    pub fn user(username: &str, email: &str) -> User {
        User {
            id: UserId::new(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Event details at a fixed date.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn event_details(title: &str, location: &str) -> EventDetails {
        EventDetails {
            title: title.to_string(),
            description: format!("{title} description"),
            date: DateTime::parse_from_rfc3339("2025-01-01T10:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
            location: location.to_string(),
        }
    }
}

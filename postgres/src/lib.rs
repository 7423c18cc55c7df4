//! `PostgreSQL` storage for eventhub.
//!
//! [`PgStore`] implements [`UserRepository`], [`EventRepository`] and
//! [`RegistrationRepository`] from `eventhub-core` over one connection pool.
//!
//! - Uniqueness (handle, email, registration pair) is enforced by database
//!   constraints; violations are mapped to [`StoreError::UniqueViolation`]
//! - Deletes remove dependent rows explicitly, in one transaction
//! - List queries are translated to SQL by [`list_query`]
//!
//! # Example
//!
//! ```no_run
//! use eventhub_postgres::PgStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PgStore::connect("postgres://localhost/eventhub", 10).await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod list_query;

pub use list_query::list_query;

use chrono::{DateTime, Utc};
use eventhub_core::{
    Conflict, Event, EventId, EventQuery, EventRepository, Registration, RegistrationId,
    RegistrationRepository, StoreError, StoreFuture, StoreHealth, User, UserId, UserRepository,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

/// `PostgreSQL`-backed store.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DatabaseError`] if the connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::DatabaseError(format!("Failed to connect: {e}")))?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DatabaseError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations complete");
        Ok(())
    }

    /// Liveness probe.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DatabaseError`] if the database is unreachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(db_error)
    }
}

fn db_error(error: sqlx::Error) -> StoreError {
    StoreError::DatabaseError(error.to_string())
}

/// Map constraint violations to domain errors; everything else is a database error.
fn map_write_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some("users_username_key") => StoreError::UniqueViolation(Conflict::Username),
                Some("users_email_lower_key") => StoreError::UniqueViolation(Conflict::Email),
                Some("event_registrations_user_event_key") => {
                    StoreError::UniqueViolation(Conflict::Registration)
                }
                other => StoreError::DatabaseError(format!(
                    "unexpected unique violation on {}",
                    other.unwrap_or("<unknown>")
                )),
            };
        }
        if db.is_foreign_key_violation() {
            return StoreError::MissingReference(
                db.constraint().unwrap_or("foreign key").to_string(),
            );
        }
    }
    db_error(error)
}

fn row_to_user(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(db_error)?),
        username: row.try_get("username").map_err(db_error)?,
        email: row.try_get("email").map_err(db_error)?,
        password_hash: row.try_get("password_hash").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}

pub(crate) fn row_to_event(row: &PgRow) -> Result<Event, StoreError> {
    Ok(Event {
        id: EventId::from_uuid(row.try_get("id").map_err(db_error)?),
        title: row.try_get("title").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        date: row.try_get("event_date").map_err(db_error)?,
        location: row.try_get("location").map_err(db_error)?,
        organizer: UserId::from_uuid(row.try_get("organizer_id").map_err(db_error)?),
    })
}

fn row_to_registration(row: &PgRow) -> Result<Registration, StoreError> {
    let registered_at: DateTime<Utc> = row.try_get("registered_at").map_err(db_error)?;
    Ok(Registration {
        id: RegistrationId::from_uuid(row.try_get("id").map_err(db_error)?),
        user: UserId::from_uuid(row.try_get("user_id").map_err(db_error)?),
        event: EventId::from_uuid(row.try_get("event_id").map_err(db_error)?),
        registered_at,
    })
}

impl StoreHealth for PgStore {
    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(PgStore::ping(self))
    }
}

impl UserRepository for PgStore {
    fn create_user(&self, user: User) -> StoreFuture<'_, User> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO users (id, username, email, password_hash, created_at)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(user.id.as_uuid())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

            tracing::debug!(user_id = %user.id, "User inserted");
            Ok(user)
        })
    }

    fn find_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move {
            sqlx::query(
                "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(row_to_user)
            .transpose()
        })
    }

    fn find_user_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            sqlx::query(
                "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
            )
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(row_to_user)
            .transpose()
        })
    }

    fn find_user_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            sqlx::query(
                "SELECT id, username, email, password_hash, created_at FROM users WHERE lower(email) = lower($1)",
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(row_to_user)
            .transpose()
        })
    }

    fn delete_user(&self, id: UserId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(db_error)?;

            sqlx::query(
                r"
                DELETE FROM event_registrations
                WHERE user_id = $1
                   OR event_id IN (SELECT id FROM events WHERE organizer_id = $1)
                ",
            )
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            let events = sqlx::query("DELETE FROM events WHERE organizer_id = $1")
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?
                .rows_affected();

            let users = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?
                .rows_affected();
            if users == 0 {
                // Dropping the transaction rolls it back.
                return Err(StoreError::NotFound);
            }

            tx.commit().await.map_err(db_error)?;
            tracing::info!(user_id = %id, events_deleted = events, "User deleted");
            Ok(())
        })
    }
}

impl EventRepository for PgStore {
    fn insert_event(&self, event: Event) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO events (id, title, description, event_date, location, organizer_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(event.id.as_uuid())
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(&event.location)
            .bind(event.organizer.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
            Ok(event)
        })
    }

    fn get_event(&self, id: EventId) -> StoreFuture<'_, Option<Event>> {
        Box::pin(async move {
            sqlx::query(
                "SELECT id, title, description, event_date, location, organizer_id FROM events WHERE id = $1",
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(row_to_event)
            .transpose()
        })
    }

    fn list_events<'a>(&'a self, query: &'a EventQuery) -> StoreFuture<'a, Vec<Event>> {
        Box::pin(async move {
            let rows = list_query(query)
                .build()
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
            rows.iter().map(row_to_event).collect()
        })
    }

    fn update_event(&self, event: Event) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            sqlx::query(
                r"
                UPDATE events
                SET title = $2, description = $3, event_date = $4, location = $5
                WHERE id = $1
                RETURNING id, title, description, event_date, location, organizer_id
                ",
            )
            .bind(event.id.as_uuid())
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(&event.location)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .as_ref()
            .map(row_to_event)
            .transpose()?
            .ok_or(StoreError::NotFound)
        })
    }

    fn delete_event(&self, id: EventId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(db_error)?;

            let registrations = sqlx::query("DELETE FROM event_registrations WHERE event_id = $1")
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?
                .rows_affected();

            let events = sqlx::query("DELETE FROM events WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?
                .rows_affected();
            if events == 0 {
                return Err(StoreError::NotFound);
            }

            tx.commit().await.map_err(db_error)?;
            tracing::info!(event_id = %id, registrations_deleted = registrations, "Event deleted");
            Ok(())
        })
    }
}

impl RegistrationRepository for PgStore {
    fn insert_registration(&self, registration: Registration) -> StoreFuture<'_, Registration> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO event_registrations (id, user_id, event_id, registered_at)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(registration.id.as_uuid())
            .bind(registration.user.as_uuid())
            .bind(registration.event.as_uuid())
            .bind(registration.registered_at)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
            Ok(registration)
        })
    }

    fn delete_registration(&self, id: RegistrationId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let deleted = sqlx::query("DELETE FROM event_registrations WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error)?
                .rows_affected();
            if deleted == 0 {
                Err(StoreError::NotFound)
            } else {
                Ok(())
            }
        })
    }

    fn list_registrations_for_user(&self, user: UserId) -> StoreFuture<'_, Vec<Registration>> {
        Box::pin(async move {
            let rows = sqlx::query(
                r"
                SELECT id, user_id, event_id, registered_at
                FROM event_registrations
                WHERE user_id = $1
                ORDER BY registered_at ASC, id ASC
                ",
            )
            .bind(user.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
            rows.iter().map(row_to_registration).collect()
        })
    }
}

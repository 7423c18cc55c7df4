//! Domain records and their identifiers.
//!
//! Records are plain data. Construction of validated inputs happens in the
//! services; storage implementations persist these types as-is.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a user account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an event registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Creates a new random `RegistrationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `RegistrationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RegistrationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Records
// ============================================================================

/// A registered account.
///
/// `password_hash` holds a PHC-format hash string; the plaintext password is
/// never stored. This type is deliberately not `Serialize`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Account identifier
    pub id: UserId,
    /// Unique login handle
    pub username: String,
    /// Contact address, unique case-insensitively
    pub email: String,
    /// Salted password hash
    pub password_hash: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Maximum length of an event title, in characters.
pub const TITLE_MAX_LENGTH: usize = 100;

/// Maximum length of an event location, in characters.
pub const LOCATION_MAX_LENGTH: usize = 255;

/// The caller-editable fields of an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Short title (at most 100 characters)
    pub title: String,
    /// Free-form description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Where the event takes place (at most 255 characters)
    pub location: String,
}

/// A schedulable activity organised by one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Short title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Where the event takes place
    pub location: String,
    /// The user who created the event
    pub organizer: UserId,
}

impl Event {
    /// Build a new event with a fresh identifier.
    #[must_use]
    pub fn new(organizer: UserId, details: EventDetails) -> Self {
        Self {
            id: EventId::new(),
            title: details.title,
            description: details.description,
            date: details.date,
            location: details.location,
            organizer,
        }
    }

    /// Replace every editable field. Identifier and organizer are kept.
    pub fn apply(&mut self, details: EventDetails) {
        self.title = details.title;
        self.description = details.description;
        self.date = details.date;
        self.location = details.location;
    }

    /// The editable fields of this event.
    #[must_use]
    pub fn details(&self) -> EventDetails {
        EventDetails {
            title: self.title.clone(),
            description: self.description.clone(),
            date: self.date,
            location: self.location.clone(),
        }
    }
}

/// A user's registration for an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Registration identifier
    pub id: RegistrationId,
    /// The registered user
    pub user: UserId,
    /// The event registered for
    pub event: EventId,
    /// Server-assigned creation time
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    /// Build a new registration with a fresh identifier.
    #[must_use]
    pub fn new(user: UserId, event: EventId, registered_at: DateTime<Utc>) -> Self {
        Self {
            id: RegistrationId::new(),
            user,
            event,
            registered_at,
        }
    }
}

// ============================================================================
// Date parsing
// ============================================================================

/// Naive formats accepted for event dates, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an event date-time.
///
/// Accepts RFC 3339 (any offset, normalised to UTC) and naive ISO 8601
/// date-times with or without seconds, which are taken to be UTC.
///
/// # Examples
///
/// ```
/// use eventhub_core::types::parse_datetime;
///
/// let naive = parse_datetime("2025-01-01T10:00").unwrap();
/// let zoned = parse_datetime("2025-01-01T11:00:00+01:00").unwrap();
/// assert_eq!(naive, zoned);
/// assert!(parse_datetime("next tuesday").is_none());
/// ```
#[must_use]
pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .map(|naive| naive.and_utc())
}

/// Parse a calendar date (`YYYY-MM-DD`).
#[must_use]
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

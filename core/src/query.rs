//! Event list queries: exact filters, free-text search and ordering.
//!
//! [`EventQuery`] is the storage-independent description of a list request.
//! The in-memory store evaluates it with [`EventQuery::matches`] and
//! [`EventQuery::compare`]; the `PostgreSQL` store translates the same fields
//! into SQL and must agree with these semantics:
//!
//! - `title` / `location`: exact, case-sensitive equality
//! - `date`: exact instant, or any time on a UTC calendar day
//! - `search`: every term must occur case-insensitively in title,
//!   description or location
//! - ordering: the given keys, then `date` ascending, then id

use crate::types::{parse_date, parse_datetime, Event};
use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;

/// Filter on the event date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Match one exact instant.
    Exact(DateTime<Utc>),
    /// Match any time on this UTC calendar day.
    Day(NaiveDate),
}

impl DateFilter {
    /// Parse a `date` query value. Date-only input yields [`DateFilter::Day`].
    ///
    /// # Examples
    ///
    /// ```
    /// use eventhub_core::DateFilter;
    ///
    /// assert!(matches!(DateFilter::parse("2025-01-01"), Some(DateFilter::Day(_))));
    /// assert!(matches!(DateFilter::parse("2025-01-01T10:00"), Some(DateFilter::Exact(_))));
    /// assert!(DateFilter::parse("soon").is_none());
    /// ```
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        parse_date(input)
            .map(Self::Day)
            .or_else(|| parse_datetime(input).map(Self::Exact))
    }

    /// Returns `true` if `date` satisfies the filter.
    #[must_use]
    pub fn matches(&self, date: DateTime<Utc>) -> bool {
        match self {
            Self::Exact(instant) => date == *instant,
            Self::Day(day) => date.date_naive() == *day,
        }
    }
}

/// Sortable event fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Event date-time
    Date,
    /// Event title
    Title,
}

/// One ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    /// Field to sort by
    pub field: SortField,
    /// Sort descending instead of ascending
    pub descending: bool,
}

impl SortKey {
    /// Ascending key on `field`.
    #[must_use]
    pub const fn asc(field: SortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    /// Descending key on `field`.
    #[must_use]
    pub const fn desc(field: SortField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    fn compare(self, a: &Event, b: &Event) -> Ordering {
        let ordering = match self.field {
            SortField::Date => a.date.cmp(&b.date),
            SortField::Title => a.title.cmp(&b.title),
        };
        if self.descending { ordering.reverse() } else { ordering }
    }
}

/// A list request over events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Exact title
    pub title: Option<String>,
    /// Date filter
    pub date: Option<DateFilter>,
    /// Exact location
    pub location: Option<String>,
    /// Lower-cased search terms; all must match
    pub search: Vec<String>,
    /// Requested ordering keys (empty means default)
    pub ordering: Vec<SortKey>,
}

impl EventQuery {
    /// An unfiltered query in default order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to an exact title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Restrict to an exact location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Restrict by date.
    #[must_use]
    pub const fn with_date(mut self, date: DateFilter) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the search terms from a raw `search` value.
    #[must_use]
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Self::search_terms(search);
        self
    }

    /// Set the ordering from a raw `ordering` value.
    #[must_use]
    pub fn with_ordering(mut self, ordering: &str) -> Self {
        self.ordering = Self::parse_ordering(ordering);
        self
    }

    /// Split a raw search string into lower-cased terms.
    ///
    /// ```
    /// use eventhub_core::EventQuery;
    ///
    /// assert_eq!(EventQuery::search_terms("  Rust  MEETUP "), vec!["rust", "meetup"]);
    /// assert!(EventQuery::search_terms("   ").is_empty());
    /// ```
    #[must_use]
    pub fn search_terms(search: &str) -> Vec<String> {
        search.split_whitespace().map(str::to_lowercase).collect()
    }

    /// Parse a comma-separated ordering such as `-date,title`.
    ///
    /// Unknown field names are ignored.
    ///
    /// ```
    /// use eventhub_core::{EventQuery, SortField, SortKey};
    ///
    /// assert_eq!(
    ///     EventQuery::parse_ordering("-date, title, price"),
    ///     vec![SortKey::desc(SortField::Date), SortKey::asc(SortField::Title)],
    /// );
    /// ```
    #[must_use]
    pub fn parse_ordering(ordering: &str) -> Vec<SortKey> {
        ordering
            .split(',')
            .filter_map(|raw| {
                let raw = raw.trim();
                let (descending, name) = raw
                    .strip_prefix('-')
                    .map_or((false, raw), |name| (true, name));
                let field = match name {
                    "date" => SortField::Date,
                    "title" => SortField::Title,
                    _ => return None,
                };
                Some(SortKey { field, descending })
            })
            .collect()
    }

    /// The ordering actually applied: requested keys, or `date` ascending.
    #[must_use]
    pub fn effective_ordering(&self) -> Vec<SortKey> {
        if self.ordering.is_empty() {
            vec![SortKey::asc(SortField::Date)]
        } else {
            self.ordering.clone()
        }
    }

    /// Returns `true` if `event` passes every filter and search term.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if self.title.as_ref().is_some_and(|title| *title != event.title) {
            return false;
        }
        if self
            .location
            .as_ref()
            .is_some_and(|location| *location != event.location)
        {
            return false;
        }
        if self.date.is_some_and(|date| !date.matches(event.date)) {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }

        let haystacks = [
            event.title.to_lowercase(),
            event.description.to_lowercase(),
            event.location.to_lowercase(),
        ];
        self.search
            .iter()
            .all(|term| haystacks.iter().any(|field| field.contains(term.as_str())))
    }

    /// Total order used to sort results.
    #[must_use]
    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        self.effective_ordering()
            .into_iter()
            .chain(std::iter::once(SortKey::asc(SortField::Date)))
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }

    /// Filter and sort `events`.
    #[must_use]
    pub fn apply(&self, events: impl IntoIterator<Item = Event>) -> Vec<Event> {
        let mut selected: Vec<Event> = events.into_iter().filter(|e| self.matches(e)).collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }
}

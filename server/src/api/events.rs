//! Event catalog endpoints.
//!
//! - GET /events - List events; filters `title`, `date`, `location`, free-text
//!   `search`, `ordering` (open to anonymous callers)
//! - POST /events - Create an event
//! - GET /events/:id - Event details
//! - PUT /events/:id - Replace an event
//! - DELETE /events/:id - Delete an event and its registrations

use super::json_body;
use crate::auth::middleware::CurrentUser;
use crate::server::state::AppState;
use crate::services::EventInput;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use eventhub_core::{DateFilter, Event, EventId, EventQuery, ValidationErrors};
use eventhub_web::AppError;
use serde::Deserialize;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing events.
#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    /// Whitespace-separated terms matched against title, description and location
    pub search: Option<String>,
    /// Exact title
    pub title: Option<String>,
    /// Exact date-time, or a `YYYY-MM-DD` day
    pub date: Option<String>,
    /// Exact location
    pub location: Option<String>,
    /// Comma-separated `date` / `title`, `-` prefix for descending
    pub ordering: Option<String>,
}

impl ListEventsQuery {
    /// Build the storage query.
    ///
    /// Empty parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns a field error on `date` when it cannot be parsed.
    pub fn to_query(&self) -> Result<EventQuery, ValidationErrors> {
        let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        let mut query = EventQuery::new();
        if let Some(title) = present(&self.title) {
            query = query.with_title(title);
        }
        if let Some(location) = present(&self.location) {
            query = query.with_location(location);
        }
        if let Some(date) = present(&self.date) {
            let filter = DateFilter::parse(&date)
                .ok_or_else(|| ValidationErrors::single("date", "Enter a valid date/time."))?;
            query = query.with_date(filter);
        }
        if let Some(search) = &self.search {
            query = query.with_search(search);
        }
        if let Some(ordering) = &self.ordering {
            query = query.with_ordering(ordering);
        }
        Ok(query)
    }
}

// Ids that are not UUIDs cannot name an event.
fn parse_event_id(raw: &str) -> Result<EventId, AppError> {
    Uuid::parse_str(raw)
        .map(EventId::from_uuid)
        .map_err(|_| AppError::not_found("Event", raw))
}

// ============================================================================
// Handlers
// ============================================================================

/// List events.
///
/// # Errors
///
/// 400 for an unparseable `date` filter.
pub async fn list_events(
    State(state): State<AppState>,
    user: CurrentUser,
    params: Result<Query<ListEventsQuery>, QueryRejection>,
) -> Result<Json<Vec<Event>>, AppError> {
    let Query(params) = params.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let query = params.to_query()?;

    let events = state.catalog.list(user.principal(), &query).await?;
    Ok(Json(events))
}

/// Create an event organised by the caller.
///
/// # Errors
///
/// - 401 for anonymous callers
/// - 400 with a field map for invalid input
pub async fn create_event(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<EventInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let input = json_body(payload)?;
    let event = state.catalog.create(user.principal(), &input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Event details.
///
/// # Errors
///
/// - 401 for anonymous callers
/// - 404 for unknown ids
pub async fn get_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Event>, AppError> {
    let event = state.catalog.get(user.principal(), parse_event_id(&id)?).await?;
    Ok(Json(event))
}

/// Replace an event's fields.
///
/// # Errors
///
/// - 401 for anonymous callers, 403 when ownership is enforced and the
///   caller is not the organizer
/// - 404 for unknown ids
/// - 400 with a field map for invalid input
pub async fn update_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<EventInput>, JsonRejection>,
) -> Result<Json<Event>, AppError> {
    let id = parse_event_id(&id)?;
    let input = json_body(payload)?;
    let event = state.catalog.update(user.principal(), id, &input).await?;
    Ok(Json(event))
}

/// Delete an event.
///
/// # Errors
///
/// - 401 for anonymous callers, 403 when ownership is enforced and the
///   caller is not the organizer
/// - 404 for unknown ids
pub async fn delete_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete(user.principal(), parse_event_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! SQL translation of [`EventQuery`].
//!
//! Must agree with `EventQuery::matches` and `EventQuery::compare`:
//! exact case-sensitive `title`/`location`, date instant or UTC day,
//! case-insensitive substring search with every term required, and a
//! byte-wise (`COLLATE "C"`) title order with `date, id` as tie-breakers.

use chrono::{Duration, NaiveTime};
use eventhub_core::{DateFilter, EventQuery, SortField};
use sqlx::{Postgres, QueryBuilder};

/// Build the `SELECT` for a list request.
#[must_use]
pub fn list_query(query: &EventQuery) -> QueryBuilder<'static, Postgres> {
    let mut sql = QueryBuilder::new(
        "SELECT id, title, description, event_date, location, organizer_id FROM events WHERE TRUE",
    );

    if let Some(title) = &query.title {
        sql.push(" AND title = ").push_bind(title.clone());
    }
    if let Some(location) = &query.location {
        sql.push(" AND location = ").push_bind(location.clone());
    }
    match query.date {
        Some(DateFilter::Exact(instant)) => {
            sql.push(" AND event_date = ").push_bind(instant);
        }
        Some(DateFilter::Day(day)) => {
            let start = day.and_time(NaiveTime::MIN).and_utc();
            sql.push(" AND event_date >= ")
                .push_bind(start)
                .push(" AND event_date < ")
                .push_bind(start + Duration::days(1));
        }
        None => {}
    }
    for term in &query.search {
        sql.push(" AND (strpos(lower(title), ")
            .push_bind(term.clone())
            .push(") > 0 OR strpos(lower(description), ")
            .push_bind(term.clone())
            .push(") > 0 OR strpos(lower(location), ")
            .push_bind(term.clone())
            .push(") > 0)");
    }

    sql.push(" ORDER BY ");
    for key in query.effective_ordering() {
        let column = match key.field {
            SortField::Date => "event_date",
            SortField::Title => "title COLLATE \"C\"",
        };
        sql.push(column)
            .push(if key.descending { " DESC, " } else { " ASC, " });
    }
    sql.push("event_date ASC, id ASC");
    sql
}

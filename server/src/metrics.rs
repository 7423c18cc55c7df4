//! Business metrics for eventhub.
//!
//! # Exported Metrics
//!
//! - `eventhub_events_created_total` - Events created
//! - `eventhub_registrations_total{status}` - Registration attempts by outcome
//!   (`created`, `duplicate`, `rolled_back`)
//! - `eventhub_notifications_total{status}` - Confirmation emails (`sent`, `failed`)
//! - `eventhub_logins_total{status}` - Login attempts (`succeeded`, `failed`)

use metrics::{counter, describe_counter};

/// Register descriptions for all business metrics.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        "eventhub_events_created_total",
        "Total number of events created"
    );
    describe_counter!(
        "eventhub_registrations_total",
        "Event registration attempts by status (created, duplicate, rolled_back)"
    );
    describe_counter!(
        "eventhub_notifications_total",
        "Registration confirmation emails by status (sent, failed)"
    );
    describe_counter!(
        "eventhub_logins_total",
        "Login attempts by status (succeeded, failed)"
    );

    tracing::info!("Business metrics registered");
}

pub(crate) fn event_created() {
    counter!("eventhub_events_created_total").increment(1);
}

pub(crate) fn registration(status: &'static str) {
    counter!("eventhub_registrations_total", "status" => status).increment(1);
}

pub(crate) fn notification(status: &'static str) {
    counter!("eventhub_notifications_total", "status" => status).increment(1);
}

pub(crate) fn login(status: &'static str) {
    counter!("eventhub_logins_total", "status" => status).increment(1);
}

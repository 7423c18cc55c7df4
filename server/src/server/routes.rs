//! Router configuration.

use super::health::readiness_check;
use super::state::AppState;
use crate::api::{accounts, events, registrations};
use axum::{
    routing::{get, post, MethodRouter},
    Router,
};
use eventhub_web::{correlation_id_layer, handlers::health_check};
use tower_http::trace::TraceLayer;

/// Register `handler` under `path` and `path/`.
fn route_both(router: Router<AppState>, path: &str, handler: MethodRouter<AppState>) -> Router<AppState> {
    router
        .route(path, handler.clone())
        .route(&format!("{path}/"), handler)
}

/// Build the complete Axum router.
///
/// | Method | Path | |
/// |---|---|---|
/// | GET, POST | `/events` | list (anyone), create |
/// | GET, PUT, DELETE | `/events/:id` | detail, replace, delete |
/// | POST | `/events/register` | register for an event |
/// | GET | `/events/registrations` | caller's registrations |
/// | POST | `/register` | create an account |
/// | POST | `/login`, `/token` | obtain tokens |
/// | POST | `/token/refresh` | new access token |
/// | GET | `/health`, `/ready` | liveness, readiness |
///
/// Every path also accepts a trailing slash.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new();
    for (path, handler) in [
        (
            "/events",
            get(events::list_events).post(events::create_event),
        ),
        ("/events/register", post(registrations::register_for_event)),
        (
            "/events/registrations",
            get(registrations::list_my_registrations),
        ),
        (
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        ),
        ("/register", post(accounts::register)),
        ("/login", post(accounts::login)),
        ("/token", post(accounts::login)),
        ("/token/refresh", post(accounts::refresh)),
    ] {
        router = route_both(router, path, handler);
    }

    router
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}

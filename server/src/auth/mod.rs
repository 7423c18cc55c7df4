//! Request authentication for the HTTP layer.

pub mod middleware;

pub use middleware::CurrentUser;

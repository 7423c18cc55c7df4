//! Console email provider for development.

use crate::providers::{EmailFuture, EmailProvider};
use tracing::info;

/// Console email provider.
///
/// Logs emails instead of sending them. Useful for development where you
/// don't want to send real emails.
///
/// # Examples
///
/// ```
/// use eventhub_auth::providers::{ConsoleEmailProvider, EmailProvider};
///
/// # futures_block_on(async {
/// let provider = ConsoleEmailProvider::new();
/// provider
///     .send_email("user@example.com", "Hello", "Body")
///     .await
///     .unwrap();
/// # });
/// # fn futures_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConsoleEmailProvider;

impl ConsoleEmailProvider {
    /// Create a new console email provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EmailProvider for ConsoleEmailProvider {
    fn send_email<'a>(&'a self, to: &'a str, subject: &'a str, body: &'a str) -> EmailFuture<'a> {
        Box::pin(async move {
            info!(
                to = %to,
                subject = %subject,
                body = %body,
                "📧 Email (Development Mode)"
            );
            Ok(())
        })
    }
}

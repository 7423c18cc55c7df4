//! Email provider trait.

use crate::error::Result;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`EmailProvider::send_email`].
pub type EmailFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Email provider.
///
/// This trait abstracts over email delivery services. It returns a boxed
/// future so the provider can be shared as `Arc<dyn EmailProvider>`.
pub trait EmailProvider: Send + Sync {
    /// Send a plain-text message.
    ///
    /// # Arguments
    ///
    /// - `to`: Recipient email address
    /// - `subject`: Subject line
    /// - `body`: Plain-text body
    ///
    /// # Errors
    ///
    /// Returns `EmailDeliveryFailed` if:
    /// - The recipient address cannot be parsed
    /// - The transport rejects or fails to deliver the message
    fn send_email<'a>(&'a self, to: &'a str, subject: &'a str, body: &'a str) -> EmailFuture<'a>;
}

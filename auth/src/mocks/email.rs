//! Mock email provider for testing.

use crate::error::AuthError;
use crate::providers::{EmailFuture, EmailProvider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A message captured by [`MockEmailProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Recipient
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Body
    pub body: String,
}

/// Mock email provider.
///
/// Records every message instead of sending it, and can be switched to
/// fail. Clones share the same outbox.
#[derive(Debug, Clone, Default)]
pub struct MockEmailProvider {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    failing: Arc<AtomicBool>,
}

impl MockEmailProvider {
    /// Create a new mock email provider that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose deliveries fail.
    #[must_use]
    pub fn failing() -> Self {
        let provider = Self::new();
        provider.set_failing(true);
        provider
    }

    /// Toggle failure mode.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |sent| sent.clone())
    }

    /// Messages delivered to `to`.
    #[must_use]
    pub fn sent_to(&self, to: &str) -> Vec<SentEmail> {
        self.sent().into_iter().filter(|m| m.to == to).collect()
    }
}

impl EmailProvider for MockEmailProvider {
    fn send_email<'a>(&'a self, to: &'a str, subject: &'a str, body: &'a str) -> EmailFuture<'a> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AuthError::EmailDeliveryFailed(
                    "mock provider configured to fail".to_string(),
                ));
            }
            let message = SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            };
            self.sent
                .lock()
                .map_err(|_| AuthError::InternalError("mock outbox poisoned".to_string()))?
                .push(message);
            Ok(())
        })
    }
}

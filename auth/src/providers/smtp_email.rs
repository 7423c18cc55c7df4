//! SMTP email provider implementation using Lettre.

use crate::config::SmtpConfig;
use crate::error::{AuthError, Result};
use crate::providers::{EmailFuture, EmailProvider};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// SMTP email provider using Lettre.
///
/// Sends real emails over STARTTLS, suitable for production use.
///
/// # Examples
///
/// ```ignore
/// use eventhub_auth::config::SmtpConfig;
/// use eventhub_auth::providers::SmtpEmailProvider;
///
/// let provider = SmtpEmailProvider::new(
///     SmtpConfig {
///         host: "smtp.gmail.com".to_string(),
///         port: 587,
///         username: Some("user@gmail.com".to_string()),
///         password: Some("app_password".to_string()),
///     },
///     "noreply@example.com",
///     "Eventhub",
/// )?;
/// ```
#[derive(Clone)]
pub struct SmtpEmailProvider {
    /// Relay settings.
    smtp: SmtpConfig,

    /// Parsed sender mailbox.
    from: Mailbox,
}

impl SmtpEmailProvider {
    /// Create a new SMTP email provider.
    ///
    /// # Errors
    ///
    /// Returns `EmailDeliveryFailed` if the sender address is invalid.
    pub fn new(smtp: SmtpConfig, from_email: &str, from_name: &str) -> Result<Self> {
        let from = format!("{from_name} <{from_email}>")
            .parse()
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("Invalid from address: {e}")))?;
        Ok(Self { smtp, from })
    }

    /// Build SMTP transport for sending emails.
    ///
    /// Creates a new transport for each email to avoid connection pooling issues.
    fn build_transport(&self) -> Result<SmtpTransport> {
        let mut builder = SmtpTransport::starttls_relay(&self.smtp.host)
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("SMTP relay error: {e}")))?
            .port(self.smtp.port);
        if let (Some(username), Some(password)) = (&self.smtp.username, &self.smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(builder.build())
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| AuthError::EmailDeliveryFailed(format!("Invalid to address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("Failed to build email: {e}")))
    }
}

impl EmailProvider for SmtpEmailProvider {
    fn send_email<'a>(&'a self, to: &'a str, subject: &'a str, body: &'a str) -> EmailFuture<'a> {
        Box::pin(async move {
            let email = self.build_message(to, subject, body)?;
            let mailer = self.build_transport()?;

            tokio::task::spawn_blocking(move || {
                mailer
                    .send(&email)
                    .map_err(|e| AuthError::EmailDeliveryFailed(format!("Failed to send email: {e}")))
            })
            .await
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("Email task failed: {e}")))?
            .map(|_| ())
        })
    }
}

impl std::fmt::Debug for SmtpEmailProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpEmailProvider")
            .field("smtp", &self.smtp)
            .field("from", &self.from.to_string())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn smtp() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            username: None,
            password: None,
        }
    }

    #[test]
    fn test_rejects_invalid_sender() {
        assert!(SmtpEmailProvider::new(smtp(), "not an address", "Eventhub").is_err());
    }

    #[test]
    fn test_builds_plain_text_message() {
        let provider = SmtpEmailProvider::new(smtp(), "noreply@example.com", "Eventhub").unwrap();
        let message = provider
            .build_message("a@x.com", "Registration confirmed: Meetup", "See you there")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Registration confirmed: Meetup"));
        assert!(raw.contains("To: a@x.com"));
    }

    #[test]
    fn test_rejects_invalid_recipient() {
        let provider = SmtpEmailProvider::new(smtp(), "noreply@example.com", "Eventhub").unwrap();
        assert!(matches!(
            provider.build_message("nope", "s", "b"),
            Err(AuthError::EmailDeliveryFailed(_))
        ));
    }
}

//! Authentication and notification configuration.
//!
//! Values are supplied by the application at construction time; nothing in
//! this crate reads the environment.

use chrono::Duration;

/// Token and password settings.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign tokens.
    pub jwt_secret: String,

    /// Access token lifetime.
    ///
    /// Default: 5 minutes
    pub access_ttl: Duration,

    /// Refresh token lifetime.
    ///
    /// Default: 1 day
    pub refresh_ttl: Duration,

    /// Minimum password length in characters.
    ///
    /// Default: 5
    pub min_password_length: usize,

    /// Maximum password length in characters.
    ///
    /// Default: 128
    pub max_password_length: usize,
}

impl AuthConfig {
    /// Create a configuration with the given signing secret and default lifetimes.
    #[must_use]
    pub const fn new(jwt_secret: String) -> Self {
        Self {
            jwt_secret,
            access_ttl: Duration::minutes(5),
            refresh_ttl: Duration::days(1),
            min_password_length: 5,
            max_password_length: 128,
        }
    }

    /// Set access token lifetime.
    #[must_use]
    pub const fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Set refresh token lifetime.
    #[must_use]
    pub const fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Set minimum password length.
    #[must_use]
    pub const fn with_min_password_length(mut self, length: usize) -> Self {
        self.min_password_length = length;
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("min_password_length", &self.min_password_length)
            .field("max_password_length", &self.max_password_length)
            .finish()
    }
}

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP server address (e.g., "smtp.gmail.com").
    pub host: String,

    /// SMTP server port (usually 587 for STARTTLS).
    pub port: u16,

    /// Optional authentication username.
    pub username: Option<String>,

    /// Optional authentication password.
    pub password: Option<String>,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Notification sender settings.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Sender address for outgoing mail.
    pub from_email: String,

    /// Sender display name.
    pub from_name: String,

    /// SMTP relay. `None` selects the console provider.
    pub smtp: Option<SmtpConfig>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            from_email: "noreply@eventhub.local".to_string(),
            from_name: "Eventhub".to_string(),
            smtp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::new("secret".to_string());
        assert_eq!(config.access_ttl, Duration::minutes(5));
        assert_eq!(config.refresh_ttl, Duration::days(1));
        assert_eq!(config.min_password_length, 5);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AuthConfig::new("super-secret".to_string());
        assert!(!format!("{config:?}").contains("super-secret"));

        let smtp = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: Some("user".to_string()),
            password: Some("hunter2".to_string()),
        };
        assert!(!format!("{smtp:?}").contains("hunter2"));
    }
}

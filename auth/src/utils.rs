//! Input checks for account fields.

/// Maximum handle length in characters.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Validate email address format.
///
/// This performs basic RFC 5322 validation:
/// - Must contain exactly one `@`
/// - Must have non-empty local and domain parts
/// - Length must be between 3 and 255 characters
///
/// # Examples
///
/// ```
/// use eventhub_auth::utils::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(is_valid_email("user+tag@subdomain.example.com"));
/// assert!(!is_valid_email("invalid"));
/// assert!(!is_valid_email("@example.com"));
/// assert!(!is_valid_email("user@"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if domain.contains('@') || local.is_empty() || domain.is_empty() {
        return false;
    }

    if !domain.contains('.') {
        return false;
    }

    let valid_local_chars =
        |c: char| c.is_alphanumeric() || c == '.' || c == '-' || c == '+' || c == '_';
    let valid_domain_chars = |c: char| c.is_alphanumeric() || c == '.' || c == '-';

    if !local.chars().all(valid_local_chars) || !domain.chars().all(valid_domain_chars) {
        return false;
    }

    // Domain labels between dots must be non-empty
    domain.split('.').all(|part| !part.is_empty())
}

/// Validate a login handle: 1 to 150 letters, digits or `@ . + - _`.
///
/// # Examples
///
/// ```
/// use eventhub_auth::utils::is_valid_username;
///
/// assert!(is_valid_username("alice"));
/// assert!(is_valid_username("alice.smith+events@home"));
/// assert!(!is_valid_username("alice smith"));
/// assert!(!is_valid_username(""));
/// ```
#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    let length = username.chars().count();
    (1..=MAX_USERNAME_LENGTH).contains(&length)
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@example.com"));
        assert!(is_valid_email("user+tag@example.com"));
        assert!(is_valid_email("user_name@subdomain.example.com"));
        assert!(is_valid_email("user-name@example.co.uk"));
        assert!(is_valid_email("a@x.com"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@b")); // No dot in domain
    }

    #[test]
    fn test_email_length_limits() {
        assert!(!is_valid_email("a@"));
        assert!(is_valid_email("a@b.c"));

        let long_email = format!("{}@example.com", "a".repeat(250));
        assert!(!is_valid_email(&long_email));
    }

    #[test]
    fn test_username_length_limits() {
        assert!(is_valid_username(&"a".repeat(MAX_USERNAME_LENGTH)));
        assert!(!is_valid_username(&"a".repeat(MAX_USERNAME_LENGTH + 1)));
    }

    #[test]
    fn test_username_rejects_punctuation() {
        for bad in ["al/ice", "al ice", "al#ice", "al!ice"] {
            assert!(!is_valid_username(bad), "{bad} should be rejected");
        }
    }
}

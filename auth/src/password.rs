//! Password hashing with Argon2id.
//!
//! Hashes are stored in PHC string format (`$argon2id$v=19$...`), so the
//! salt and parameters travel with the hash. Both functions are CPU-bound;
//! async callers run them on the blocking pool.

use crate::error::{AuthError, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use std::sync::OnceLock;

// Hashed on first use so it carries the same parameters as real hashes.
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH
        .get_or_init(|| hash_password("eventhub-unknown-account").ok())
        .as_deref()
}

/// Hash `password` with a fresh random salt.
///
/// # Errors
///
/// Returns `InternalError` if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt)
        .map_err(|e| AuthError::InternalError(format!("salt encoding failed: {e}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InternalError(format!("password hashing failed: {e}")))
}

/// Check `password` against a stored PHC hash.
///
/// A malformed stored hash counts as a mismatch.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Like [`verify_password`], but with no stored hash the password is still
/// checked against a fixed dummy hash before returning `false`.
///
/// Keeps a login for an unknown handle as slow as one with a wrong password.
#[must_use]
pub fn verify_password_or_dummy(password: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(stored_hash) => verify_password(password, stored_hash),
        None => {
            if let Some(dummy) = dummy_hash() {
                let _ = verify_password(password, dummy);
            }
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("pw123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("pw123", &hash));
        assert!(!verify_password("pw124", &hash));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let a = hash_password("pw123").unwrap();
        let b = hash_password("pw123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dummy_hash_uses_real_parameters() {
        let dummy = dummy_hash().unwrap();
        let real = hash_password("pw123").unwrap();
        assert!(dummy.starts_with("$argon2id$"));
        // Same algorithm, version and cost parameters; only salt and hash differ.
        let params = |h: &str| h.split('$').take(4).collect::<Vec<_>>().join("$");
        assert_eq!(params(dummy), params(&real));
    }

    #[test]
    fn test_missing_hash_never_verifies() {
        assert!(!verify_password_or_dummy("eventhub-unknown-account", None));
        let hash = hash_password("pw123").unwrap();
        assert!(verify_password_or_dummy("pw123", Some(&hash)));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("pw123", "not-a-hash"));
        assert!(!verify_password("pw123", ""));
    }
}

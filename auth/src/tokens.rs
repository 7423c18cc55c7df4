//! Signed bearer tokens (JWT, HS256).
//!
//! Two token types share one claim set and differ in `token_type` and
//! lifetime. Expiry is checked against the injected clock rather than the
//! library's wall-clock check, so tests with a fixed clock behave the same as
//! production.

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use chrono::{DateTime, Utc};
use eventhub_core::UserId;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purpose of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived, presented on every authenticated request
    Access,
    /// Long-lived, exchanged for new access tokens
    Refresh,
}

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: UserId,
    /// Login handle at issue time
    pub username: String,
    /// Access or refresh
    pub token_type: TokenType,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

/// Access and refresh token issued at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    /// Access token
    pub access: String,
    /// Refresh token
    pub refresh: String,
}

/// Issues and verifies tokens with one signing secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl TokenIssuer {
    /// Build an issuer from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    /// Sign a token of `token_type` for a user.
    ///
    /// # Errors
    ///
    /// Returns `InternalError` if signing fails.
    pub fn issue(
        &self,
        user_id: UserId,
        username: &str,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(format!("token signing failed: {e}")))
    }

    /// Sign an access and a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `InternalError` if signing fails.
    pub fn issue_pair(
        &self,
        user_id: UserId,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue(user_id, username, TokenType::Access, now)?,
            refresh: self.issue(user_id, username, TokenType::Refresh, now)?,
        })
    }

    /// Verify signature, type and expiry.
    ///
    /// # Errors
    ///
    /// - `InvalidToken`: malformed, bad signature, or not of `expected` type
    /// - `TokenExpired`: `exp` is not after `now`
    pub fn verify(&self, token: &str, expected: TokenType, now: DateTime<Utc>) -> Result<Claims> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::InvalidToken
            })?;
        let claims = data.claims;

        if claims.token_type != expected {
            return Err(AuthError::InvalidToken);
        }
        if claims.exp <= now.timestamp() {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&AuthConfig::new("test-secret".to_string()))
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_access_token_roundtrip_claims() {
        let user = UserId::new();
        let token = issuer().issue(user, "alice", TokenType::Access, now()).unwrap();

        let claims = issuer().verify(&token, TokenType::Access, now()).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn test_token_type_is_enforced() {
        let pair = issuer().issue_pair(UserId::new(), "alice", now()).unwrap();

        assert_eq!(
            issuer().verify(&pair.refresh, TokenType::Access, now()),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            issuer().verify(&pair.access, TokenType::Refresh, now()),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_expired_token() {
        let token = issuer()
            .issue(UserId::new(), "alice", TokenType::Access, now())
            .unwrap();
        let later = now() + Duration::minutes(5);
        assert_eq!(
            issuer().verify(&token, TokenType::Access, later),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer()
            .issue(UserId::new(), "alice", TokenType::Access, now())
            .unwrap();
        let other = TokenIssuer::new(&AuthConfig::new("other-secret".to_string()));
        assert_eq!(
            other.verify(&token, TokenType::Access, now()),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(
            issuer().verify("not.a.jwt", TokenType::Access, now()),
            Err(AuthError::InvalidToken)
        );
    }
}

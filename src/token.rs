//! Admin bearer tokens.
//!
//! Tokens are HMAC-signed (HS256) JWTs carrying the admin username, with a
//! fixed 24-hour expiry. There is no session state on the server; possession
//! of a token with a valid signature and unexpired timestamp is the whole
//! auth check.

use jwt_simple::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const TOKEN_ISSUER: &str = "keydesk";
const TOKEN_TTL_HOURS: u64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub username: String,
}

/// Mints and verifies admin bearer tokens with a server-side secret.
#[derive(Clone)]
pub struct TokenIssuer {
    key: HS256Key,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: HS256Key::from_bytes(secret),
        }
    }

    /// Sign a 24-hour token for the given admin username.
    pub fn issue(&self, username: &str) -> Result<String> {
        let claims = Claims::with_custom_claims(
            AdminClaims {
                username: username.to_string(),
            },
            Duration::from_hours(TOKEN_TTL_HOURS),
        )
        .with_issuer(TOKEN_ISSUER);

        self.key
            .authenticate(claims)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry; any failure rejects as Unauthorized.
    pub fn verify(&self, token: &str) -> Result<AdminClaims> {
        let mut options = VerificationOptions::default();
        options.allowed_issuers = Some(std::collections::HashSet::from([
            TOKEN_ISSUER.to_string(),
        ]));

        self.key
            .verify_token::<AdminClaims>(token, Some(options))
            .map(|claims| claims.custom)
            .map_err(|_| AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new(b"test-secret");
        let token = issuer.issue("admin").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.username, "admin");
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = TokenIssuer::new(b"test-secret");
        let token = issuer.issue("admin").unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        assert!(issuer.verify(&tampered).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenIssuer::new(b"secret-one");
        let other = TokenIssuer::new(b"secret-two");
        let token = issuer.issue("admin").unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let issuer = TokenIssuer::new(b"test-secret");
        assert!(issuer.verify("not-a-jwt").is_err());
        assert!(issuer.verify("").is_err());
    }
}

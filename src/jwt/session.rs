use std::sync::Arc;

use jwt_simple::prelude::{Claims, Duration, HS256Key, MACLike};

use super::SessionClaims;
use crate::error::{AppError, Result};

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    key: Arc<HS256Key>,
    ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            key: Arc::new(HS256Key::from_bytes(secret)),
            ttl_secs,
        }
    }

    /// Issuer with a random per-process key. Tokens do not survive a restart.
    pub fn ephemeral(ttl_secs: u64) -> Self {
        Self {
            key: Arc::new(HS256Key::generate()),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn issue(&self, user_id: &str) -> Result<String> {
        let claims = Claims::with_custom_claims(
            SessionClaims {
                id: user_id.to_string(),
            },
            Duration::from_secs(self.ttl_secs),
        )
        .with_subject(user_id);

        self.key
            .authenticate(claims)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry, returning the user id the token was issued for.
    pub fn verify(&self, token: &str) -> Result<String> {
        let claims = self
            .key
            .verify_token::<SessionClaims>(token, None)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;
        Ok(claims.custom.id)
    }
}

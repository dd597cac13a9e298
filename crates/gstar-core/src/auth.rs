//! Authentication contracts.
//!
//! The concrete hashing and token implementations live in the infrastructure
//! crate; the application layer only sees these traits.

use crate::error::Result;
use crate::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Distinguishes access tokens from refresh tokens via the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id as a decimal string
    pub sub: String,
    pub username: String,
    /// Expiry as a unix timestamp (seconds)
    pub exp: i64,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Unique id, present on refresh tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64> {
        self.sub
            .parse()
            .map_err(|_| crate::GstarError::unauthorized("Invalid token payload"))
    }
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// The identity extracted from a valid access token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
}

/// Signs and verifies bearer tokens.
pub trait TokenService: Send + Sync {
    fn issue(&self, user: &User, kind: TokenKind) -> Result<IssuedToken>;

    /// Verifies signature and expiry. Does not check the token kind.
    fn decode(&self, token: &str) -> Result<Claims>;
}

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;

    /// Returns false for a mismatch and for a malformed hash.
    fn verify(&self, password: &str, password_hash: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_type_field_name() {
        let claims = Claims {
            sub: "7".to_string(),
            username: "alice".to_string(),
            exp: 0,
            kind: TokenKind::Refresh,
            jti: Some("abc".to_string()),
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["type"], "refresh");
        assert_eq!(claims.user_id().unwrap(), 7);
    }

    #[test]
    fn test_claims_bad_subject() {
        let claims = Claims {
            sub: "not-a-number".to_string(),
            username: "alice".to_string(),
            exp: 0,
            kind: TokenKind::Access,
            jti: None,
        };
        assert!(claims.user_id().unwrap_err().is_unauthorized());
    }
}

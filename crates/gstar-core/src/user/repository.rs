//! User repository traits.

use super::model::{NewUser, RefreshToken, User};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence operations for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new user.
    ///
    /// Fails with `GstarError::Conflict` when the username or email is taken.
    async fn create(&self, user: &NewUser) -> Result<User>;

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// Persistence operations for issued refresh tokens.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn save(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken>;

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>>;

    /// Deletes a token. Deleting an unknown token is not an error.
    async fn delete(&self, token: &str) -> Result<()>;

    /// Deletes `old_token` and stores `new_token` as one atomic step.
    async fn rotate(
        &self,
        old_token: &str,
        user_id: i64,
        new_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken>;
}

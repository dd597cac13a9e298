//! Account and token use cases.

use chrono::Utc;
use gstar_core::auth::{AuthenticatedUser, PasswordHasher, TokenKind, TokenPair, TokenService};
use gstar_core::user::{NewUser, RefreshTokenRepository, User, UserRepository};
use gstar_core::{GstarError, Result};
use std::sync::Arc;

pub struct AuthUseCase {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl AuthUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            hasher,
            tokens,
        }
    }

    /// Registers a new account. Duplicate usernames or emails are a conflict.
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Result<User> {
        if self.users.find_by_username(username).await?.is_some() {
            return Err(GstarError::conflict("Username already registered"));
        }
        if self.users.find_by_email(email).await?.is_some() {
            return Err(GstarError::conflict("Email already registered"));
        }

        let user = self
            .users
            .create(&NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: self.hasher.hash(password)?,
            })
            .await?;
        tracing::info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Checks credentials and issues a stored refresh token plus an access
    /// token.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        let user = match self.users.find_by_username(username).await? {
            Some(user) if self.hasher.verify(password, &user.password_hash) => user,
            _ => {
                tracing::debug!("Rejected login for '{username}'");
                return Err(GstarError::unauthorized("Incorrect username or password"));
            }
        };

        let access = self.tokens.issue(&user, TokenKind::Access)?;
        let refresh = self.tokens.issue(&user, TokenKind::Refresh)?;
        self.refresh_tokens
            .save(user.id, &refresh.token, refresh.expires_at)
            .await?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    /// Exchanges a stored refresh token for a new pair. The old refresh
    /// token stops working.
    pub async fn reissue(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self
            .tokens
            .decode(refresh_token)
            .map_err(|_| GstarError::unauthorized("Invalid refresh token"))?;
        if claims.kind != TokenKind::Refresh {
            return Err(GstarError::unauthorized("Invalid token type"));
        }

        let stored = self
            .refresh_tokens
            .find(refresh_token)
            .await?
            .ok_or_else(|| GstarError::unauthorized("Refresh token not found"))?;
        if stored.is_expired_at(Utc::now()) {
            self.refresh_tokens.delete(refresh_token).await?;
            return Err(GstarError::unauthorized("Refresh token expired"));
        }

        let user = self
            .users
            .find_by_id(stored.user_id)
            .await?
            .ok_or_else(|| GstarError::unauthorized("User not found"))?;

        let access = self.tokens.issue(&user, TokenKind::Access)?;
        let refresh = self.tokens.issue(&user, TokenKind::Refresh)?;
        self.refresh_tokens
            .rotate(refresh_token, user.id, &refresh.token, refresh.expires_at)
            .await?;
        tracing::debug!("Rotated refresh token for user {}", user.id);

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    /// Resolves a bearer access token to the caller's identity.
    pub fn authenticate(&self, access_token: &str) -> Result<AuthenticatedUser> {
        let claims = self.tokens.decode(access_token)?;
        if claims.kind != TokenKind::Access {
            return Err(GstarError::unauthorized("Invalid token type"));
        }
        Ok(AuthenticatedUser {
            user_id: claims.user_id()?,
            username: claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gstar_core::config::AuthSettings;
    use gstar_infrastructure::{BcryptPasswordHasher, InMemoryStore, JwtTokenService};

    fn usecase_with(store: &InMemoryStore) -> AuthUseCase {
        let tokens = JwtTokenService::from_settings(&AuthSettings {
            jwt_secret: "test-secret".to_string(),
            ..Default::default()
        })
        .unwrap();
        AuthUseCase::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(BcryptPasswordHasher::with_cost(4)),
            Arc::new(tokens),
        )
    }

    async fn registered() -> (InMemoryStore, AuthUseCase) {
        let store = InMemoryStore::new();
        let usecase = usecase_with(&store);
        usecase
            .signup("alice", "alice@example.com", "secret1")
            .await
            .unwrap();
        (store, usecase)
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicates() {
        let (_, usecase) = registered().await;

        let err = usecase
            .signup("alice", "other@example.com", "secret1")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Username already registered");

        let err = usecase
            .signup("bob", "alice@example.com", "secret1")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[tokio::test]
    async fn test_signup_stores_hash_not_password() {
        let (store, _) = registered().await;

        let user = store.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "secret1");
    }

    #[tokio::test]
    async fn test_login_and_authenticate() {
        let (store, usecase) = registered().await;

        let pair = usecase.login("alice", "secret1").await.unwrap();

        let identity = usecase.authenticate(&pair.access_token).unwrap();
        assert_eq!(identity.username, "alice");
        assert!(store.find(&pair.refresh_token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (_, usecase) = registered().await;

        for (username, password) in [("alice", "wrong-pw"), ("nobody", "secret1")] {
            let err = usecase.login(username, password).await.unwrap_err();
            assert!(err.is_unauthorized());
            assert_eq!(err.to_string(), "Incorrect username or password");
        }
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let (_, usecase) = registered().await;
        let pair = usecase.login("alice", "secret1").await.unwrap();

        let err = usecase.authenticate(&pair.refresh_token).unwrap_err();

        assert_eq!(err.to_string(), "Invalid token type");
    }

    #[tokio::test]
    async fn test_reissue_rotates_refresh_token() {
        let (store, usecase) = registered().await;
        let pair = usecase.login("alice", "secret1").await.unwrap();

        let renewed = usecase.reissue(&pair.refresh_token).await.unwrap();

        assert_ne!(renewed.refresh_token, pair.refresh_token);
        assert!(store.find(&pair.refresh_token).await.unwrap().is_none());
        assert!(store.find(&renewed.refresh_token).await.unwrap().is_some());

        let err = usecase.reissue(&pair.refresh_token).await.unwrap_err();
        assert_eq!(err.to_string(), "Refresh token not found");
    }

    #[tokio::test]
    async fn test_reissue_rejects_access_token() {
        let (_, usecase) = registered().await;
        let pair = usecase.login("alice", "secret1").await.unwrap();

        let err = usecase.reissue(&pair.access_token).await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Invalid token type");
    }

    #[tokio::test]
    async fn test_reissue_rejects_garbage() {
        let (_, usecase) = registered().await;

        let err = usecase.reissue("not-a-jwt").await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid refresh token");
    }

    #[tokio::test]
    async fn test_reissue_deletes_expired_stored_token() {
        let (store, usecase) = registered().await;
        let pair = usecase.login("alice", "secret1").await.unwrap();
        // The JWT itself is still valid; only the stored record has lapsed.
        let stored = store.find(&pair.refresh_token).await.unwrap().unwrap();
        store.delete(&pair.refresh_token).await.unwrap();
        store
            .save(
                stored.user_id,
                &pair.refresh_token,
                Utc::now() - Duration::seconds(1),
            )
            .await
            .unwrap();

        let err = usecase.reissue(&pair.refresh_token).await.unwrap_err();

        assert_eq!(err.to_string(), "Refresh token expired");
        assert!(store.find(&pair.refresh_token).await.unwrap().is_none());
    }
}

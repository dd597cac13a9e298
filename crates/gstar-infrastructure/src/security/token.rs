use chrono::{Duration, Utc};
use gstar_core::auth::{Claims, IssuedToken, TokenKind, TokenService};
use gstar_core::config::AuthSettings;
use gstar_core::user::User;
use gstar_core::{GstarError, Result};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// HMAC-signed JWTs.
///
/// Access tokens live `access_token_expire_minutes`; refresh tokens live
/// `refresh_token_expire_days` and carry a random `jti` so two refresh
/// tokens issued in the same second still differ.
pub struct JwtTokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtTokenService {
    pub fn from_settings(settings: &AuthSettings) -> Result<Self> {
        let algorithm = match settings.jwt_algorithm.to_uppercase().as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => {
                return Err(GstarError::config(format!(
                    "Unsupported JWT algorithm '{other}' (expected HS256, HS384 or HS512)"
                )));
            }
        };
        if settings.jwt_secret.is_empty() {
            return Err(GstarError::config("JWT secret must not be empty"));
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            access_ttl: Duration::minutes(settings.access_token_expire_minutes),
            refresh_ttl: Duration::days(settings.refresh_token_expire_days),
        })
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user: &User, kind: TokenKind) -> Result<IssuedToken> {
        let (ttl, jti) = match kind {
            TokenKind::Access => (self.access_ttl, None),
            TokenKind::Refresh => (self.refresh_ttl, Some(uuid::Uuid::new_v4().to_string())),
        };
        let expires_at = Utc::now() + ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            exp: expires_at.timestamp(),
            kind,
            jti,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| GstarError::internal(format!("Failed to sign token: {e}")))?;
        Ok(IssuedToken { token, expires_at })
    }

    fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => GstarError::unauthorized("Token expired"),
                _ => GstarError::unauthorized("Invalid token"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(access_minutes: i64) -> AuthSettings {
        AuthSettings {
            jwt_secret: "test-secret".to_string(),
            jwt_algorithm: "HS256".to_string(),
            access_token_expire_minutes: access_minutes,
            refresh_token_expire_days: 7,
        }
    }

    fn user() -> User {
        User {
            id: 42,
            username: "alice".to_string(),
            email: "a@x.io".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_decode_access_token() {
        let service = JwtTokenService::from_settings(&settings(30)).unwrap();
        let issued = service.issue(&user(), TokenKind::Access).unwrap();

        let claims = service.decode(&issued.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.jti.is_none());
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let service = JwtTokenService::from_settings(&settings(30)).unwrap();
        let first = service.issue(&user(), TokenKind::Refresh).unwrap();
        let second = service.issue(&user(), TokenKind::Refresh).unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(service.decode(&first.token).unwrap().kind, TokenKind::Refresh);
    }

    #[test]
    fn test_expired_token() {
        let service = JwtTokenService::from_settings(&settings(-5)).unwrap();
        let issued = service.issue(&user(), TokenKind::Access).unwrap();
        let err = service.decode(&issued.token).unwrap_err();
        assert!(matches!(err, GstarError::Unauthorized(ref m) if m == "Token expired"));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let service = JwtTokenService::from_settings(&settings(30)).unwrap();
        let mut other = settings(30);
        other.jwt_secret = "another-secret".to_string();
        let forged = JwtTokenService::from_settings(&other)
            .unwrap()
            .issue(&user(), TokenKind::Access)
            .unwrap();

        let err = service.decode(&forged.token).unwrap_err();
        assert!(matches!(err, GstarError::Unauthorized(ref m) if m == "Invalid token"));
    }

    #[test]
    fn test_unsupported_algorithm() {
        let mut config = settings(30);
        config.jwt_algorithm = "RS256".to_string();
        assert!(matches!(
            JwtTokenService::from_settings(&config),
            Err(GstarError::Config(_))
        ));
    }
}

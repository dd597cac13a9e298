//! Extractors that reject with [`ApiError`] instead of axum's plain-text
//! rejections.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use gstar_core::GstarError;
use gstar_core::auth::AuthenticatedUser;
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;
use crate::app::AppState;
use crate::schemas::Validate;

/// The caller identified by an `Authorization: Bearer <access token>` header.
pub struct AuthUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| GstarError::unauthorized("Not authenticated"))?;

        Ok(Self(state.auth_usecase.authenticate(token)?))
    }
}

/// JSON body that must deserialize and pass [`Validate`]; both failures
/// answer 422.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| GstarError::validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| GstarError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

use axum::Json;
use axum::extract::State;

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::app::AppState;
use crate::schemas::{LoginRequest, MessageResponse, ReissueRequest, SignupRequest};
use gstar_core::auth::TokenPair;

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth_usecase
        .signup(&request.username, &request.email, &request.password)
        .await?;
    Ok(Json(MessageResponse {
        message: "회원가입에 성공했습니다.".to_string(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state
        .auth_usecase
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(pair))
}

pub async fn reissue(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ReissueRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state.auth_usecase.reissue(&request.refresh_token).await?;
    Ok(Json(pair))
}

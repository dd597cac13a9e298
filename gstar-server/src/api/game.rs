use axum::Json;
use axum::extract::State;
use gstar_application::{NewGameCommand, ProgressCommand};

use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiPath, AuthUser};
use crate::app::AppState;
use crate::schemas::{CreateGameRequest, CreateGameResponse, NextSceneRequest, NextSceneResponse};

pub async fn create_game(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, ApiError> {
    let started = state
        .game_usecase
        .start_game(NewGameCommand {
            user_id: user.user_id,
            personality: request.personality,
            genre: request.genre,
            playtime_minutes: request.playtime,
        })
        .await?;
    Ok(Json(started.into()))
}

pub async fn next_scene(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath((game_id, session_id, scene_id)): ApiPath<(i64, i64, i64)>,
    ApiJson(request): ApiJson<NextSceneRequest>,
) -> Result<Json<NextSceneResponse>, ApiError> {
    let bundle = state
        .game_usecase
        .advance(progress(user.user_id, game_id, session_id, scene_id, request))
        .await?;
    Ok(Json(bundle.into()))
}

pub async fn select_option(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath((game_id, session_id, scene_id, selection_id)): ApiPath<(i64, i64, i64, u32)>,
    ApiJson(request): ApiJson<NextSceneRequest>,
) -> Result<Json<NextSceneResponse>, ApiError> {
    let bundle = state
        .game_usecase
        .advance_after_selection(
            progress(user.user_id, game_id, session_id, scene_id, request),
            selection_id,
        )
        .await?;
    Ok(Json(bundle.into()))
}

fn progress(
    user_id: i64,
    game_id: i64,
    session_id: i64,
    scene_id: i64,
    request: NextSceneRequest,
) -> ProgressCommand {
    ProgressCommand {
        user_id,
        game_id,
        session_id,
        scene_id,
        emotion: request.emotion,
        elapsed_seconds: request.time,
    }
}

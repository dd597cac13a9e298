//! HTTP routes, mounted under `/api/v2`.

mod auth;
pub mod error;
pub mod extract;
mod game;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::app::AppState;

pub const API_PREFIX: &str = "/api/v2";

pub fn router(state: AppState) -> Router {
    let images = &state.config.images;
    let images_service = ServeDir::new(&images.dir);
    let images_prefix = format!("/{}", images.url_prefix.trim_matches('/'));

    let api = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/reissue", post(auth::reissue))
        .route("/game", post(game::create_game))
        .route(
            "/game/{game_id}/{session_id}/{scene_id}",
            post(game::next_scene),
        )
        .route(
            "/game/{game_id}/{session_id}/{scene_id}/selection/{selection_id}",
            post(game::select_option),
        );

    Router::new()
        .route("/", get(root))
        .nest(API_PREFIX, api)
        .nest_service(&images_prefix, images_service)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "GSTAR API Server is running" }))
}

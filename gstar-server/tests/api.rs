use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use gstar_application::{AuthUseCase, GameUseCase};
use gstar_core::character::{CharacterRepository, default_roster};
use gstar_core::config::AppConfig;
use gstar_core::scene::{Expression, SceneRepository};
use gstar_core::story::{
    BackgroundGenerator, BeatRequest, GameOpening, NextBeat, OpeningRequest, SceneDraft,
    StoryGenerator,
};
use gstar_core::{GstarError, Result};
use gstar_infrastructure::{BcryptPasswordHasher, InMemoryStore, JwtTokenService};
use gstar_server::{AppState, router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Dialogue first, then a choice, then dialogue forever.
#[derive(Default)]
struct ScriptedStory {
    calls: AtomicUsize,
}

#[async_trait]
impl StoryGenerator for ScriptedStory {
    async fn open_game(&self, _request: &OpeningRequest) -> Result<GameOpening> {
        Ok(GameOpening {
            title: "벚꽃 아래에서".to_string(),
            main_character_id: 1,
            main_character_name: "아리아나".to_string(),
            first_session_content: "벚꽃이 흩날리는 교정".to_string(),
            first_scene: SceneDraft::Dialogue {
                role: "아리아나".to_string(),
                dialogue: "안녕! 전학생이지?".to_string(),
                character_id: Some(1),
                expression: Some(Expression::Smile),
            },
        })
    }

    async fn next_beat(&self, _request: &BeatRequest) -> Result<NextBeat> {
        let scene = match self.calls.fetch_add(1, Ordering::SeqCst) {
            1 => SceneDraft::Selection {
                role: "user".to_string(),
                options: BTreeMap::from([
                    ("1".to_string(), "응, 반가워".to_string()),
                    ("2".to_string(), "...".to_string()),
                ]),
            },
            _ => SceneDraft::Dialogue {
                role: "아리아나".to_string(),
                dialogue: "같이 매점 갈래?".to_string(),
                character_id: Some(1),
                expression: None,
            },
        };
        Ok(NextBeat {
            scene,
            next_session: None,
        })
    }
}

struct BrokenBackground;

#[async_trait]
impl BackgroundGenerator for BrokenBackground {
    async fn create_background(&self, _description: &str) -> Result<String> {
        Err(GstarError::upstream("image service down"))
    }
}

struct TestApp {
    router: Router,
    store: InMemoryStore,
}

async fn test_app(config: AppConfig) -> TestApp {
    let store = InMemoryStore::new();
    store.replace_all(&default_roster()).await.unwrap();

    let tokens = JwtTokenService::from_settings(&config.auth).unwrap();
    let auth_usecase = Arc::new(AuthUseCase::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(BcryptPasswordHasher::with_cost(4)),
        Arc::new(tokens),
    ));
    let game_usecase = Arc::new(GameUseCase::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(ScriptedStory::default()),
        Arc::new(BrokenBackground),
        config.images.placeholder_url.clone(),
    ));

    TestApp {
        router: router(AppState {
            auth_usecase,
            game_usecase,
            config: Arc::new(config),
        }),
        store,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn progress_body() -> Value {
    json!({
        "emotion": {
            "angry": 0, "disgust": 0, "fear": 0, "happy": 70,
            "sad": 0, "surprise": 10, "neutral": 20
        },
        "time": 30
    })
}

async fn login(router: &Router) -> (String, String) {
    let (status, _) = send(
        router,
        post(
            "/api/v2/signup",
            None,
            json!({"username": "player1", "email": "p1@example.com", "password": "secret1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        router,
        post(
            "/api/v2/login",
            None,
            json!({"username": "player1", "password": "secret1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app(AppConfig::default()).await;

    let request = Request::get("/").body(Body::empty()).unwrap();
    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "GSTAR API Server is running"}));
}

#[tokio::test]
async fn test_signup_responses() {
    let app = test_app(AppConfig::default()).await;
    let body = json!({"username": "player1", "email": "p1@example.com", "password": "secret1"});

    let (status, response) = send(&app.router, post("/api/v2/signup", None, body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], "회원가입에 성공했습니다.");

    let (status, response) = send(&app.router, post("/api/v2/signup", None, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["detail"], "Username already registered");

    let (status, response) = send(
        &app.router,
        post(
            "/api/v2/signup",
            None,
            json!({"username": "p2", "email": "not-an-email", "password": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["detail"].is_string());
}

#[tokio::test]
async fn test_malformed_json_is_unprocessable() {
    let app = test_app(AppConfig::default()).await;

    let request = Request::post("/api/v2/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_bad_login_is_unauthorized() {
    let app = test_app(AppConfig::default()).await;
    login(&app.router).await;

    let (status, body) = send(
        &app.router,
        post(
            "/api/v2/login",
            None,
            json!({"username": "player1", "password": "wrong-password"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Incorrect username or password");
}

#[tokio::test]
async fn test_reissue_requires_refresh_token() {
    let app = test_app(AppConfig::default()).await;
    let (access, refresh) = login(&app.router).await;

    let (status, body) = send(
        &app.router,
        post("/api/v2/reissue", None, json!({"refresh_token": access})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid token type");

    let (status, body) = send(
        &app.router,
        post("/api/v2/reissue", None, json!({"refresh_token": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert_ne!(body["refresh_token"], json!(refresh));
}

#[tokio::test]
async fn test_game_routes_require_bearer_token() {
    let app = test_app(AppConfig::default()).await;
    let (_, refresh) = login(&app.router).await;
    let body = json!({"personality": "따뜻함", "genre": "로맨스", "playtime": 5});

    let (status, _) = send(&app.router, post("/api/v2/game", None, body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, response) = send(&app.router, post("/api/v2/game", Some(&refresh), body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["detail"], "Invalid token type");
}

#[tokio::test]
async fn test_game_scenario() {
    let app = test_app(AppConfig::default()).await;
    let (token, _) = login(&app.router).await;

    let (status, game) = send(
        &app.router,
        post(
            "/api/v2/game",
            Some(&token),
            json!({"personality": "따뜻함", "genre": "로맨스", "playtime": 5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["title"], "벚꽃 아래에서");
    assert_eq!(game["main_character_name"], "아리아나");
    assert_eq!(game["sessions"].as_array().unwrap().len(), 1);

    let session = &game["sessions"][0];
    assert_eq!(
        session["background_url"],
        "https://placeholder.com/background.jpg"
    );
    assert_eq!(session["scenes"].as_array().unwrap().len(), 1);
    assert_eq!(session["scenes"][0]["type"], "dialogue");
    assert_eq!(session["scenes"][0]["character_filename"], "1_smile.png");

    let game_id = game["game_id"].as_i64().unwrap();
    let session_id = session["session_id"].as_i64().unwrap();
    let first_scene_id = session["scenes"][0]["scene_id"].as_i64().unwrap();

    // Advance until the choice appears.
    let mut scene_id = first_scene_id;
    let mut choice = Value::Null;
    for _ in 0..2 {
        let (status, next) = send(
            &app.router,
            post(
                &format!("/api/v2/game/{game_id}/{session_id}/{scene_id}"),
                Some(&token),
                progress_body(),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(next["session_id"].as_i64(), Some(session_id));
        assert_ne!(next["scenes"][0]["scene_id"].as_i64(), Some(first_scene_id));
        scene_id = next["scenes"][0]["scene_id"].as_i64().unwrap();
        choice = next;
    }
    assert_eq!(choice["scenes"][0]["type"], "selection");
    assert_eq!(choice["scenes"][0]["selections"]["1"], "응, 반가워");

    let (status, reaction) = send(
        &app.router,
        post(
            &format!("/api/v2/game/{game_id}/{session_id}/{scene_id}/selection/1"),
            Some(&token),
            progress_body(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reaction["scenes"][0]["type"], "dialogue");

    let stored = SceneRepository::find_by_id(&app.store, scene_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.selected_option, Some(1));

    // A second, different choice on the same scene is refused.
    let (status, _) = send(
        &app.router,
        post(
            &format!("/api/v2/game/{game_id}/{session_id}/{scene_id}/selection/2"),
            Some(&token),
            progress_body(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_progress_rejections() {
    let app = test_app(AppConfig::default()).await;
    let (token, _) = login(&app.router).await;
    let (_, game) = send(
        &app.router,
        post(
            "/api/v2/game",
            Some(&token),
            json!({"personality": "따뜻함", "genre": "로맨스", "playtime": 5}),
        ),
    )
    .await;
    let game_id = game["game_id"].as_i64().unwrap();
    let session_id = game["sessions"][0]["session_id"].as_i64().unwrap();
    let scene_id = game["sessions"][0]["scenes"][0]["scene_id"].as_i64().unwrap();

    let (status, _) = send(
        &app.router,
        post(
            &format!("/api/v2/game/{game_id}/{session_id}/999"),
            Some(&token),
            progress_body(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app.router,
        post(
            &format!("/api/v2/game/{game_id}/{session_id}/{scene_id}/selection/1"),
            Some(&token),
            progress_body(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = progress_body();
    body["emotion"]["happy"] = json!(150);
    let (status, _) = send(
        &app.router,
        post(
            &format!("/api/v2/game/{game_id}/{session_id}/{scene_id}"),
            Some(&token),
            body,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app.router,
        post(
            &format!("/api/v2/game/{game_id}/{session_id}/{scene_id}"),
            Some(&token),
            json!({"emotion": progress_body()["emotion"], "time": -1}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app.router,
        post(
            "/api/v2/game",
            Some(&token),
            json!({"personality": "따뜻함", "genre": "로맨스", "playtime": 0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_serves_generated_images() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("beach_20250101_120000.png"), b"png").unwrap();
    let mut config = AppConfig::default();
    config.images.dir = dir.path().to_string_lossy().to_string();
    let app = test_app(config).await;

    let request = Request::get("/static/generated_images/beach_20250101_120000.png")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"png");
}

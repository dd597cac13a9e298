use std::sync::Arc;

use anyhow::{Context, Result};
use gstar_application::{AuthUseCase, GameUseCase};
use gstar_core::character::{CharacterRepository, default_roster};
use gstar_core::config::{AppConfig, DatabaseSettings};
use gstar_interaction::{GeminiApiAgent, GeminiBackgroundGenerator, GeminiStoryGenerator};
use gstar_infrastructure::{
    BcryptPasswordHasher, JwtTokenService, SqliteCharacterRepository, SqliteGameRepository,
    SqliteSceneRepository, SqliteSessionRepository, SqliteStore, SqliteUserRepository,
};

use crate::app::AppState;

pub struct AppBootstrap {
    pub app_state: AppState,
    pub store: SqliteStore,
}

/// Opens the configured database, creating the schema when missing.
pub fn open_store(settings: &DatabaseSettings) -> Result<SqliteStore> {
    let store = if settings.is_in_memory() {
        SqliteStore::open_in_memory()
    } else {
        SqliteStore::open(&settings.path)
    };
    store.with_context(|| format!("Failed to open database '{}'", settings.path))
}

/// Inserts the default roster when the table is empty. With `reset` the
/// roster is replaced even if characters already exist.
pub async fn seed_characters(characters: &dyn CharacterRepository, reset: bool) -> Result<usize> {
    let existing = characters.list_all().await?;
    if !existing.is_empty() && !reset {
        tracing::info!(
            "[Bootstrap] Character roster already has {} entries",
            existing.len()
        );
        return Ok(0);
    }

    let seeded = characters.replace_all(&default_roster()).await?;
    tracing::info!("[Bootstrap] Seeded {} default characters", seeded.len());
    Ok(seeded.len())
}

/// Composition root: wires repositories, Gemini adapters and use cases.
pub async fn bootstrap(config: AppConfig) -> Result<AppBootstrap> {
    let store = open_store(&config.database)?;

    let users = Arc::new(SqliteUserRepository::new(store.clone()));
    let characters = Arc::new(SqliteCharacterRepository::new(store.clone()));
    let games = Arc::new(SqliteGameRepository::new(store.clone()));
    let sessions = Arc::new(SqliteSessionRepository::new(store.clone()));
    let scenes = Arc::new(SqliteSceneRepository::new(store.clone()));

    seed_characters(characters.as_ref(), false).await?;

    let tokens = JwtTokenService::from_settings(&config.auth)
        .context("Invalid authentication settings")?;
    let auth_usecase = Arc::new(AuthUseCase::new(
        users.clone(),
        users,
        Arc::new(BcryptPasswordHasher::new()),
        Arc::new(tokens),
    ));

    if config.gemini.api_key.is_empty() {
        tracing::warn!("[Bootstrap] Gemini API key is empty; story generation will fail");
    }
    let text_agent = Arc::new(GeminiApiAgent::text_from_settings(&config.gemini));
    let image_agent = Arc::new(
        GeminiApiAgent::image_from_settings(&config.gemini)
            .context("Failed to build image client")?,
    );
    let story = Arc::new(GeminiStoryGenerator::new(text_agent.clone())?);
    let backgrounds = Arc::new(GeminiBackgroundGenerator::new(
        text_agent,
        image_agent,
        config.images.clone(),
    )?);

    let game_usecase = Arc::new(GameUseCase::new(
        characters,
        games,
        sessions,
        scenes,
        story,
        backgrounds,
        config.images.placeholder_url.clone(),
    ));

    tracing::info!(
        "[Bootstrap] Using database '{}', text model '{}', image model '{}'",
        config.database.path,
        config.gemini.model,
        config.gemini.image_model
    );

    Ok(AppBootstrap {
        app_state: AppState {
            auth_usecase,
            game_usecase,
            config: Arc::new(config),
        },
        store,
    })
}

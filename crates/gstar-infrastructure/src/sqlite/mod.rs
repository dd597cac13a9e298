//! SQLite persistence.
//!
//! One `SqliteStore` owns the connection; every repository holds a clone of
//! the store and runs its statements through [`SqliteStore::with_conn`].
//! Multi-row writes (game creation, session transitions, token rotation)
//! run inside a single transaction.
//!
//! ```text
//! users ─┬─ refresh_tokens
//!        └─ games ── sessions ── scenes
//! characters (roster, referenced by id)
//! ```

mod character_repository;
mod game_repository;
mod rows;
mod scene_repository;
mod session_repository;
mod user_repository;

pub use character_repository::SqliteCharacterRepository;
pub use game_repository::SqliteGameRepository;
pub use scene_repository::SqliteSceneRepository;
pub use session_repository::SqliteSessionRepository;
pub use user_repository::SqliteUserRepository;

use gstar_core::{GstarError, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS refresh_tokens (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token      TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS characters (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    personality TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS games (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title             TEXT NOT NULL,
    personality       TEXT NOT NULL,
    genre             TEXT NOT NULL,
    playtime          INTEGER NOT NULL CHECK (playtime > 0),
    main_character_id INTEGER NOT NULL,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id        INTEGER NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    session_number INTEGER NOT NULL CHECK (session_number >= 1),
    content        TEXT NOT NULL,
    background_url TEXT,
    is_completed   INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    UNIQUE (game_id, session_number)
);

CREATE TABLE IF NOT EXISTS scenes (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id      INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    scene_number    INTEGER NOT NULL CHECK (scene_number >= 1),
    role            TEXT NOT NULL,
    type            TEXT NOT NULL CHECK (type IN ('dialogue', 'selection')),
    dialogue        TEXT,
    selections      TEXT,
    selected_option INTEGER,
    character_id    INTEGER,
    expression      TEXT,
    created_at      TEXT NOT NULL,
    UNIQUE (session_id, scene_number),
    CHECK ((type = 'dialogue' AND dialogue IS NOT NULL AND selections IS NULL)
        OR (type = 'selection' AND selections IS NOT NULL AND dialogue IS NULL)),
    CHECK (selected_option IS NULL OR type = 'selection')
);

CREATE INDEX IF NOT EXISTS idx_games_user ON games(user_id);
CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user ON refresh_tokens(user_id);
"#;

/// Shared handle to the SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(sql_error)?;
        tracing::info!("Opened database at {}", path.display());
        Self::initialize(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sql_error)?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(sql_error)?;
        conn.execute_batch(SCHEMA).map_err(sql_error)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| GstarError::internal("Database connection lock poisoned"))?;
        f(&mut *conn)
    }
}

pub(crate) fn sql_error(err: rusqlite::Error) -> GstarError {
    GstarError::data_access(err.to_string())
}

/// True when `err` is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::sqlite::SqliteUserRepository;
    use crate::sqlite::SqliteGameRepository;
    use gstar_core::game::{Game, GameRepository, NewGame};
    use gstar_core::scene::{Scene, SceneContent, SceneSeed};
    use gstar_core::session::{Session, SessionSeed};
    use gstar_core::user::{NewUser, User, UserRepository};

    pub async fn store_with_user(username: &str) -> (SqliteStore, User) {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = SqliteUserRepository::new(store.clone())
            .create(&NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        (store, user)
    }

    pub fn new_game(user_id: i64, playtime_minutes: u32) -> NewGame {
        NewGame {
            user_id,
            title: "그 여름의 옥상".to_string(),
            personality: "다정함".to_string(),
            genre: "학원물".to_string(),
            playtime_minutes,
            main_character_id: 1,
        }
    }

    pub fn opening_seeds() -> (SessionSeed, SceneSeed) {
        (
            SessionSeed {
                session_number: 1,
                content: "학교 옥상".to_string(),
                background_url: Some("/static/generated_images/rooftop.png".to_string()),
            },
            SceneSeed {
                scene_number: 1,
                role: "narrator".to_string(),
                content: SceneContent::dialogue("바람이 분다."),
                character_id: None,
                expression: None,
            },
        )
    }

    /// A store holding one user with one freshly opened game.
    pub async fn store_with_game() -> (SqliteStore, Game, Session, Scene) {
        let (store, user) = store_with_user("alice").await;
        let (session, scene) = opening_seeds();
        let (game, session, scene) = SqliteGameRepository::new(store.clone())
            .create_with_opening(&new_game(user.id, 30), &session, &scene)
            .await
            .unwrap();
        (store, game, session, scene)
    }
}

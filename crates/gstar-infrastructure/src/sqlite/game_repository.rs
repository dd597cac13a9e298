//! SQLite-backed game repository.

use super::rows::{GAME_COLUMNS, game_from_row, insert_scene, insert_session, optional};
use super::{SqliteStore, sql_error};
use async_trait::async_trait;
use chrono::Utc;
use gstar_core::Result;
use gstar_core::game::{Game, GameRepository, NewGame};
use gstar_core::scene::{Scene, SceneSeed};
use gstar_core::session::{Session, SessionSeed};
use rusqlite::params;

#[derive(Clone)]
pub struct SqliteGameRepository {
    store: SqliteStore,
}

impl SqliteGameRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl GameRepository for SqliteGameRepository {
    async fn create_with_opening(
        &self,
        game: &NewGame,
        session: &SessionSeed,
        scene: &SceneSeed,
    ) -> Result<(Game, Session, Scene)> {
        let now = Utc::now();
        self.store.with_conn(|conn| {
            let tx = conn.transaction().map_err(sql_error)?;
            tx.execute(
                "INSERT INTO games (user_id, title, personality, genre, playtime, main_character_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    game.user_id,
                    game.title,
                    game.personality,
                    game.genre,
                    game.playtime_minutes,
                    game.main_character_id,
                    now,
                ],
            )
            .map_err(sql_error)?;

            let created = Game {
                id: tx.last_insert_rowid(),
                user_id: game.user_id,
                title: game.title.clone(),
                personality: game.personality.clone(),
                genre: game.genre.clone(),
                playtime_minutes: game.playtime_minutes,
                main_character_id: game.main_character_id,
                created_at: now,
                updated_at: now,
            };
            let first_session = insert_session(&tx, created.id, session, now)?;
            let first_scene = insert_scene(&tx, first_session.id, scene, now)?;
            tx.commit().map_err(sql_error)?;

            tracing::debug!(
                "Created game {} with session {} and scene {}",
                created.id,
                first_session.id,
                first_scene.id
            );
            Ok((created, first_session, first_scene))
        })
    }

    async fn find_by_id(&self, game_id: i64) -> Result<Option<Game>> {
        let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1");
        self.store
            .with_conn(|conn| optional(conn.query_row(&sql, params![game_id], game_from_row)))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Game>> {
        let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE user_id = ?1 ORDER BY id");
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(sql_error)?;
            let games = stmt
                .query_map(params![user_id], game_from_row)
                .map_err(sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_error)?;
            Ok(games)
        })
    }
}

//! SQLite-backed session repository.

use super::rows::{
    SESSION_COLUMNS, find_session, insert_scene, insert_session, optional, session_from_row,
};
use super::{SqliteStore, sql_error};
use async_trait::async_trait;
use chrono::Utc;
use gstar_core::scene::{Scene, SceneSeed};
use gstar_core::session::{Session, SessionRepository, SessionSeed};
use gstar_core::{GstarError, Result};
use rusqlite::params;

#[derive(Clone)]
pub struct SqliteSessionRepository {
    store: SqliteStore,
}

impl SqliteSessionRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn find_by_id(&self, session_id: i64) -> Result<Option<Session>> {
        self.store.with_conn(|conn| find_session(conn, session_id))
    }

    async fn list_by_game(&self, game_id: i64) -> Result<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE game_id = ?1 ORDER BY session_number"
        );
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(sql_error)?;
            let sessions = stmt
                .query_map(params![game_id], session_from_row)
                .map_err(sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_error)?;
            Ok(sessions)
        })
    }

    async fn latest_for_game(&self, game_id: i64) -> Result<Option<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE game_id = ?1 ORDER BY session_number DESC LIMIT 1"
        );
        self.store
            .with_conn(|conn| optional(conn.query_row(&sql, params![game_id], session_from_row)))
    }

    async fn mark_completed(&self, session_id: i64) -> Result<Session> {
        let now = Utc::now();
        self.store.with_conn(|conn| {
            conn.execute(
                "UPDATE sessions SET is_completed = 1, updated_at = ?1 WHERE id = ?2 AND is_completed = 0",
                params![now, session_id],
            )
            .map_err(sql_error)?;
            find_session(conn, session_id)?
                .ok_or_else(|| GstarError::not_found("Session", session_id))
        })
    }

    async fn open_next(
        &self,
        game_id: i64,
        closing_session_id: i64,
        session: &SessionSeed,
        first_scene: &SceneSeed,
    ) -> Result<(Session, Scene)> {
        let now = Utc::now();
        self.store.with_conn(|conn| {
            let tx = conn.transaction().map_err(sql_error)?;
            let closed = tx
                .execute(
                    "UPDATE sessions SET is_completed = 1, updated_at = ?1
                     WHERE id = ?2 AND game_id = ?3 AND is_completed = 0",
                    params![now, closing_session_id, game_id],
                )
                .map_err(sql_error)?;
            if closed == 0 {
                return Err(match find_session(&tx, closing_session_id)? {
                    Some(existing) if existing.game_id == game_id => {
                        GstarError::bad_request("Session is already completed")
                    }
                    _ => GstarError::not_found("Session", closing_session_id),
                });
            }

            let next = insert_session(&tx, game_id, session, now)?;
            let scene = insert_scene(&tx, next.id, first_scene, now)?;
            tx.commit().map_err(sql_error)?;

            tracing::debug!(
                "Game {} moved from session {} to session {}",
                game_id,
                closing_session_id,
                next.session_number
            );
            Ok((next, scene))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::store_with_game;
    use gstar_core::scene::SceneContent;

    fn next_seeds(session_number: u32) -> (SessionSeed, SceneSeed) {
        (
            SessionSeed {
                session_number,
                content: "방과 후 도서관".to_string(),
                background_url: None,
            },
            SceneSeed {
                scene_number: 1,
                role: "유나".to_string(),
                content: SceneContent::dialogue("조용히 해."),
                character_id: Some(2),
                expression: None,
            },
        )
    }

    #[tokio::test]
    async fn test_open_next_completes_previous() {
        let (store, game, first, _) = store_with_game().await;
        let repo = SqliteSessionRepository::new(store);
        let (session, scene) = next_seeds(2);

        let (next, scene) = repo.open_next(game.id, first.id, &session, &scene).await.unwrap();
        assert_eq!(next.session_number, 2);
        assert!(!next.is_completed);
        assert_eq!(scene.scene_number, 1);

        let sessions = repo.list_by_game(game.id).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].is_completed);
        assert_eq!(repo.latest_for_game(game.id).await.unwrap().unwrap().id, next.id);
    }

    #[tokio::test]
    async fn test_open_next_from_completed_session_fails() {
        let (store, game, first, _) = store_with_game().await;
        let repo = SqliteSessionRepository::new(store);
        repo.mark_completed(first.id).await.unwrap();
        let (session, scene) = next_seeds(2);

        let err = repo.open_next(game.id, first.id, &session, &scene).await.unwrap_err();
        assert!(err.is_bad_request());
        assert_eq!(repo.list_by_game(game.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_session_number_rolls_back() {
        let (store, game, first, _) = store_with_game().await;
        let repo = SqliteSessionRepository::new(store);
        let (session, scene) = next_seeds(1);

        assert!(repo.open_next(game.id, first.id, &session, &scene).await.is_err());
        let reloaded = repo.find_by_id(first.id).await.unwrap().unwrap();
        assert!(!reloaded.is_completed);
    }

    #[tokio::test]
    async fn test_mark_completed_is_idempotent() {
        let (store, _, first, _) = store_with_game().await;
        let repo = SqliteSessionRepository::new(store);

        assert!(repo.mark_completed(first.id).await.unwrap().is_completed);
        assert!(repo.mark_completed(first.id).await.unwrap().is_completed);
        assert!(repo.mark_completed(first.id + 100).await.unwrap_err().is_not_found());
    }
}

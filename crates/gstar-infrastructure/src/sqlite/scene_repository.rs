//! SQLite-backed scene repository.

use super::rows::{
    SCENE_COLUMNS, find_scene, find_session, insert_scene, optional, scene_from_row,
};
use super::{SqliteStore, sql_error};
use async_trait::async_trait;
use chrono::Utc;
use gstar_core::scene::{Scene, SceneRepository, SceneSeed};
use gstar_core::{GstarError, Result};
use rusqlite::params;

#[derive(Clone)]
pub struct SqliteSceneRepository {
    store: SqliteStore,
}

impl SqliteSceneRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SceneRepository for SqliteSceneRepository {
    async fn append(&self, session_id: i64, scene: &SceneSeed) -> Result<Scene> {
        // Check and insert under one lock.
        self.store.with_conn(|conn| match find_session(conn, session_id)? {
            None => Err(GstarError::not_found("Session", session_id)),
            Some(session) if session.is_completed => {
                Err(GstarError::bad_request("Session is already completed"))
            }
            Some(_) => insert_scene(conn, session_id, scene, Utc::now()),
        })
    }

    async fn find_by_id(&self, scene_id: i64) -> Result<Option<Scene>> {
        self.store.with_conn(|conn| find_scene(conn, scene_id))
    }

    async fn list_by_session(&self, session_id: i64) -> Result<Vec<Scene>> {
        let sql = format!(
            "SELECT {SCENE_COLUMNS} FROM scenes WHERE session_id = ?1 ORDER BY scene_number"
        );
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(sql_error)?;
            let scenes = stmt
                .query_map(params![session_id], scene_from_row)
                .map_err(sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_error)?;
            Ok(scenes)
        })
    }

    async fn latest_for_session(&self, session_id: i64) -> Result<Option<Scene>> {
        let sql = format!(
            "SELECT {SCENE_COLUMNS} FROM scenes WHERE session_id = ?1 ORDER BY scene_number DESC LIMIT 1"
        );
        self.store
            .with_conn(|conn| optional(conn.query_row(&sql, params![session_id], scene_from_row)))
    }

    async fn record_selection(&self, scene_id: i64, selection_id: u32) -> Result<bool> {
        self.store.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE scenes SET selected_option = ?1
                     WHERE id = ?2 AND selected_option IS NULL AND type = 'selection'",
                    params![selection_id, scene_id],
                )
                .map_err(sql_error)?;
            Ok(updated == 1)
        })
    }
}

//! Row mapping and insert helpers shared by the SQLite repositories.

use super::sql_error;
use chrono::{DateTime, Utc};
use gstar_core::Result;
use gstar_core::game::Game;
use gstar_core::scene::{Expression, Scene, SceneContent, SceneSeed};
use gstar_core::session::{Session, SessionSeed};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use std::collections::BTreeMap;

pub(crate) const GAME_COLUMNS: &str = "id, user_id, title, personality, genre, playtime, \
     main_character_id, created_at, updated_at";

pub(crate) const SESSION_COLUMNS: &str =
    "id, game_id, session_number, content, background_url, is_completed, created_at, updated_at";

pub(crate) const SCENE_COLUMNS: &str = "id, session_id, scene_number, role, type, dialogue, \
     selections, selected_option, character_id, expression, created_at";

pub(crate) fn game_from_row(row: &Row<'_>) -> rusqlite::Result<Game> {
    Ok(Game {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        personality: row.get(3)?,
        genre: row.get(4)?,
        playtime_minutes: row.get(5)?,
        main_character_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub(crate) fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        game_id: row.get(1)?,
        session_number: row.get(2)?,
        content: row.get(3)?,
        background_url: row.get(4)?,
        is_completed: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub(crate) fn scene_from_row(row: &Row<'_>) -> rusqlite::Result<Scene> {
    let kind: String = row.get(4)?;
    let content = match kind.as_str() {
        "dialogue" => SceneContent::Dialogue {
            dialogue: row.get(5)?,
        },
        "selection" => {
            let raw: String = row.get(6)?;
            let selections: BTreeMap<String, String> = serde_json::from_str(&raw)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;
            SceneContent::Selection { selections }
        }
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("unknown scene type '{other}'").into(),
            ));
        }
    };
    let expression: Option<String> = row.get(9)?;

    Ok(Scene {
        id: row.get(0)?,
        session_id: row.get(1)?,
        scene_number: row.get(2)?,
        role: row.get(3)?,
        content,
        selected_option: row.get(7)?,
        character_id: row.get(8)?,
        expression: expression.as_deref().and_then(Expression::from_tag),
        created_at: row.get(10)?,
    })
}

pub(crate) fn insert_session(
    conn: &Connection,
    game_id: i64,
    seed: &SessionSeed,
    now: DateTime<Utc>,
) -> Result<Session> {
    conn.execute(
        "INSERT INTO sessions (game_id, session_number, content, background_url, is_completed, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
        params![game_id, seed.session_number, seed.content, seed.background_url, now],
    )
    .map_err(sql_error)?;

    Ok(Session {
        id: conn.last_insert_rowid(),
        game_id,
        session_number: seed.session_number,
        content: seed.content.clone(),
        background_url: seed.background_url.clone(),
        is_completed: false,
        created_at: now,
        updated_at: now,
    })
}

pub(crate) fn insert_scene(
    conn: &Connection,
    session_id: i64,
    seed: &SceneSeed,
    now: DateTime<Utc>,
) -> Result<Scene> {
    let (dialogue, selections) = match &seed.content {
        SceneContent::Dialogue { dialogue } => (Some(dialogue.as_str()), None),
        SceneContent::Selection { selections } => (None, Some(serde_json::to_string(selections)?)),
    };
    let expression = seed.expression.map(|e| e.to_string());

    conn.execute(
        "INSERT INTO scenes (session_id, scene_number, role, type, dialogue, selections, character_id, expression, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            session_id,
            seed.scene_number,
            seed.role,
            seed.content.kind().to_string(),
            dialogue,
            selections,
            seed.character_id,
            expression,
            now,
        ],
    )
    .map_err(sql_error)?;

    Ok(Scene {
        id: conn.last_insert_rowid(),
        session_id,
        scene_number: seed.scene_number,
        role: seed.role.clone(),
        content: seed.content.clone(),
        selected_option: None,
        character_id: seed.character_id,
        expression: seed.expression,
        created_at: now,
    })
}

pub(crate) fn find_session(conn: &Connection, session_id: i64) -> Result<Option<Session>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
    optional(conn.query_row(&sql, params![session_id], session_from_row))
}

pub(crate) fn find_scene(conn: &Connection, scene_id: i64) -> Result<Option<Scene>> {
    let sql = format!("SELECT {SCENE_COLUMNS} FROM scenes WHERE id = ?1");
    optional(conn.query_row(&sql, params![scene_id], scene_from_row))
}

/// Turns `QueryReturnedNoRows` into `Ok(None)`.
pub(crate) fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(sql_error(e)),
    }
}

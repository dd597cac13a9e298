//! SQLite-backed character roster.

use super::rows::optional;
use super::{SqliteStore, sql_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gstar_core::Result;
use gstar_core::character::{Character, CharacterRepository, NewCharacter};
use rusqlite::{Connection, Row, params};

const CHARACTER_COLUMNS: &str = "id, name, personality, created_at";

#[derive(Clone)]
pub struct SqliteCharacterRepository {
    store: SqliteStore,
}

impl SqliteCharacterRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

fn character_from_row(row: &Row<'_>) -> rusqlite::Result<Character> {
    Ok(Character {
        id: row.get(0)?,
        name: row.get(1)?,
        personality: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn insert_character(
    conn: &Connection,
    character: &NewCharacter,
    now: DateTime<Utc>,
) -> Result<Character> {
    conn.execute(
        "INSERT INTO characters (name, personality, created_at) VALUES (?1, ?2, ?3)",
        params![character.name, character.personality, now],
    )
    .map_err(sql_error)?;
    Ok(Character {
        id: conn.last_insert_rowid(),
        name: character.name.clone(),
        personality: character.personality.clone(),
        created_at: now,
    })
}

#[async_trait]
impl CharacterRepository for SqliteCharacterRepository {
    async fn list_all(&self) -> Result<Vec<Character>> {
        let sql = format!("SELECT {CHARACTER_COLUMNS} FROM characters ORDER BY id");
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(sql_error)?;
            let characters = stmt
                .query_map([], character_from_row)
                .map_err(sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_error)?;
            Ok(characters)
        })
    }

    async fn find_by_id(&self, character_id: i64) -> Result<Option<Character>> {
        let sql = format!("SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = ?1");
        self.store.with_conn(|conn| {
            optional(conn.query_row(&sql, params![character_id], character_from_row))
        })
    }

    async fn create(&self, character: &NewCharacter) -> Result<Character> {
        self.store
            .with_conn(|conn| insert_character(conn, character, Utc::now()))
    }

    async fn replace_all(&self, characters: &[NewCharacter]) -> Result<Vec<Character>> {
        let now = Utc::now();
        self.store.with_conn(|conn| {
            let tx = conn.transaction().map_err(sql_error)?;
            tx.execute("DELETE FROM characters", []).map_err(sql_error)?;
            // Restart ids at 1 so sprite file names stay stable across reseeds.
            tx.execute("DELETE FROM sqlite_sequence WHERE name = 'characters'", [])
                .map_err(sql_error)?;
            let created = characters
                .iter()
                .map(|c| insert_character(&tx, c, now))
                .collect::<Result<Vec<_>>>()?;
            tx.commit().map_err(sql_error)?;
            Ok(created)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gstar_core::character::default_roster;

    #[tokio::test]
    async fn test_replace_all_restarts_ids() {
        let repo = SqliteCharacterRepository::new(SqliteStore::open_in_memory().unwrap());
        repo.create(&NewCharacter::new("임시", "테스트")).await.unwrap();

        let roster = repo.replace_all(&default_roster()).await.unwrap();
        assert_eq!(roster.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let listed = repo.list_all().await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].name, "아리아나");
        assert_eq!(repo.find_by_id(2).await.unwrap().unwrap().name, "유나");
        assert!(repo.find_by_id(4).await.unwrap().is_none());
    }
}

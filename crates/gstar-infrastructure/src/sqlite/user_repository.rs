//! SQLite-backed user and refresh token repositories.

use super::rows::optional;
use super::{SqliteStore, is_unique_violation, sql_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gstar_core::user::{NewUser, RefreshToken, RefreshTokenRepository, User, UserRepository};
use gstar_core::{GstarError, Result};
use rusqlite::{Connection, Row, params};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";
const TOKEN_COLUMNS: &str = "id, user_id, token, created_at, expires_at";

/// Implements both [`UserRepository`] and [`RefreshTokenRepository`].
#[derive(Clone)]
pub struct SqliteUserRepository {
    store: SqliteStore,
}

impl SqliteUserRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    fn find_one(&self, column: &str, value: &dyn rusqlite::ToSql) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
        self.store
            .with_conn(|conn| optional(conn.query_row(&sql, [value], user_from_row)))
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<RefreshToken> {
    Ok(RefreshToken {
        id: row.get(0)?,
        user_id: row.get(1)?,
        token: row.get(2)?,
        created_at: row.get(3)?,
        expires_at: row.get(4)?,
    })
}

fn insert_token(
    conn: &Connection,
    user_id: i64,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<RefreshToken> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO refresh_tokens (user_id, token, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, token, now, expires_at],
    )
    .map_err(sql_error)?;
    Ok(RefreshToken {
        id: conn.last_insert_rowid(),
        user_id,
        token: token.to_string(),
        created_at: now,
        expires_at,
    })
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let now = Utc::now();
        self.store.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![user.username, user.email, user.password_hash, now],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    let field = if e.to_string().contains("users.email") {
                        "Email"
                    } else {
                        "Username"
                    };
                    GstarError::conflict(format!("{field} already registered"))
                } else {
                    sql_error(e)
                }
            })?;

            Ok(User {
                id: conn.last_insert_rowid(),
                username: user.username.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                created_at: now,
                updated_at: now,
            })
        })
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        self.find_one("id", &user_id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_one("username", &username)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("email", &email)
    }
}

#[async_trait]
impl RefreshTokenRepository for SqliteUserRepository {
    async fn save(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken> {
        self.store
            .with_conn(|conn| insert_token(conn, user_id, token, expires_at))
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token = ?1");
        self.store
            .with_conn(|conn| optional(conn.query_row(&sql, params![token], token_from_row)))
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.store.with_conn(|conn| {
            conn.execute("DELETE FROM refresh_tokens WHERE token = ?1", params![token])
                .map_err(sql_error)?;
            Ok(())
        })
    }

    async fn rotate(
        &self,
        old_token: &str,
        user_id: i64,
        new_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction().map_err(sql_error)?;
            let removed = tx
                .execute(
                    "DELETE FROM refresh_tokens WHERE token = ?1 AND user_id = ?2",
                    params![old_token, user_id],
                )
                .map_err(sql_error)?;
            if removed == 0 {
                return Err(GstarError::unauthorized("Invalid refresh token"));
            }
            let stored = insert_token(&tx, user_id, new_token, expires_at)?;
            tx.commit().map_err(sql_error)?;
            Ok(stored)
        })
    }
}

//! Session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ordered chapter within a game, bound to one location.
///
/// At most one session per game is open (`is_completed == false`);
/// completing it is one-way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: i64,
    pub game_id: i64,
    /// 1-based, gapless per game
    pub session_number: u32,
    /// Location and mood description, e.g. "학교 옥상. 시원한 바람이 부는 점심시간"
    pub content: String,
    pub background_url: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A session about to be created; the parent game id is supplied by the
/// repository call that consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSeed {
    pub session_number: u32,
    pub content: String,
    pub background_url: Option<String>,
}

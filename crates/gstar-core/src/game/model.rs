//! Game domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One playthrough owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    pub id: i64,
    pub user_id: i64,
    /// Title generated by the language model
    pub title: String,
    /// Personality the player asked for
    pub personality: String,
    pub genre: String,
    /// Target total playtime in minutes (always > 0)
    pub playtime_minutes: u32,
    pub main_character_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn total_playtime_seconds(&self) -> u64 {
        u64::from(self.playtime_minutes) * 60
    }
}

#[derive(Debug, Clone)]
pub struct NewGame {
    pub user_id: i64,
    pub title: String,
    pub personality: String,
    pub genre: String,
    pub playtime_minutes: u32,
    pub main_character_id: i64,
}

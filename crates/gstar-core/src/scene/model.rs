//! Scene domain model.

use super::expression::Expression;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SceneKind {
    Dialogue,
    Selection,
}

/// What a scene shows: a spoken line, or a set of player choices.
///
/// Keeping this an enum makes "dialogue XOR options" hold by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SceneContent {
    Dialogue { dialogue: String },
    /// Selection id (`"1"`, `"2"`, ...) to option text. Never empty.
    Selection { selections: BTreeMap<String, String> },
}

impl SceneContent {
    pub fn dialogue(text: impl Into<String>) -> Self {
        Self::Dialogue {
            dialogue: text.into(),
        }
    }

    pub fn selection<K, V>(options: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Selection {
            selections: options
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn kind(&self) -> SceneKind {
        match self {
            Self::Dialogue { .. } => SceneKind::Dialogue,
            Self::Selection { .. } => SceneKind::Selection,
        }
    }

    pub fn dialogue_text(&self) -> Option<&str> {
        match self {
            Self::Dialogue { dialogue } => Some(dialogue),
            Self::Selection { .. } => None,
        }
    }

    pub fn options(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Dialogue { .. } => None,
            Self::Selection { selections } => Some(selections),
        }
    }

    /// Looks up an option by its numeric selection id.
    pub fn option_text(&self, selection_id: u32) -> Option<&str> {
        self.options()
            .and_then(|options| options.get(&selection_id.to_string()))
            .map(String::as_str)
    }
}

/// One persisted beat within a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scene {
    pub id: i64,
    pub session_id: i64,
    /// 1-based, gapless per session
    pub scene_number: u32,
    /// Character name, "user" or "narrator"
    pub role: String,
    pub content: SceneContent,
    /// Chosen selection id; set at most once, selection scenes only
    pub selected_option: Option<u32>,
    pub character_id: Option<i64>,
    pub expression: Option<Expression>,
    pub created_at: DateTime<Utc>,
}

impl Scene {
    pub fn kind(&self) -> SceneKind {
        self.content.kind()
    }

    /// Sprite file the client should display, if a character is speaking.
    pub fn character_filename(&self) -> Option<String> {
        let character_id = self.character_id?;
        Some(match self.expression {
            Some(expression) => format!("{character_id}_{expression}.png"),
            None => format!("{character_id}.png"),
        })
    }
}

/// A scene about to be created; the parent session id is supplied by the
/// repository call that consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSeed {
    pub scene_number: u32,
    pub role: String,
    pub content: SceneContent,
    pub character_id: Option<i64>,
    pub expression: Option<Expression>,
}

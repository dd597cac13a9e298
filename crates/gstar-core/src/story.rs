//! Story generation contracts.
//!
//! The orchestrator talks to the language model and the image service only
//! through `StoryGenerator` and `BackgroundGenerator`. Implementations must
//! hand back fully validated values: a `SceneDraft` is always either a
//! complete dialogue line or a non-empty set of choices.

use crate::character::Character;
use crate::emotion::DominantEmotion;
use crate::error::Result;
use crate::game::Game;
use crate::progress::PlayProgress;
use crate::scene::{Expression, Scene, SceneContent, SceneKind, SceneSeed};
use crate::session::Session;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// The next beat proposed by the model, already validated.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneDraft {
    Dialogue {
        role: String,
        dialogue: String,
        character_id: Option<i64>,
        expression: Option<Expression>,
    },
    Selection {
        role: String,
        options: BTreeMap<String, String>,
    },
}

impl SceneDraft {
    pub fn kind(&self) -> SceneKind {
        match self {
            Self::Dialogue { .. } => SceneKind::Dialogue,
            Self::Selection { .. } => SceneKind::Selection,
        }
    }

    pub fn into_seed(self, scene_number: u32) -> SceneSeed {
        match self {
            Self::Dialogue {
                role,
                dialogue,
                character_id,
                expression,
            } => SceneSeed {
                scene_number,
                role,
                content: SceneContent::Dialogue { dialogue },
                character_id,
                expression,
            },
            Self::Selection { role, options } => SceneSeed {
                scene_number,
                role,
                content: SceneContent::Selection { selections: options },
                character_id: None,
                expression: None,
            },
        }
    }
}

/// Everything the model produces when a game starts.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOpening {
    pub title: String,
    pub main_character_id: i64,
    pub main_character_name: String,
    pub first_session_content: String,
    pub first_scene: SceneDraft,
}

/// The model's answer to a progression request.
#[derive(Debug, Clone, PartialEq)]
pub struct NextBeat {
    pub scene: SceneDraft,
    /// Description of the next location when the current session ends.
    pub next_session: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpeningRequest {
    pub personality: String,
    pub genre: String,
    pub playtime_minutes: u32,
    pub characters: Vec<Character>,
}

/// Context for generating the next beat of the current session.
#[derive(Debug, Clone)]
pub struct BeatRequest {
    pub game: Game,
    pub characters: Vec<Character>,
    pub main_character: Option<Character>,
    pub session: Session,
    /// Scenes of the current session only, ordered by `scene_number`.
    pub transcript: Vec<Scene>,
    pub dominant_emotion: DominantEmotion,
    pub progress: PlayProgress,
    /// Text of the option the player just picked, for the selection variant.
    pub selected_option: Option<String>,
}

#[async_trait]
pub trait StoryGenerator: Send + Sync {
    async fn open_game(&self, request: &OpeningRequest) -> Result<GameOpening>;

    async fn next_beat(&self, request: &BeatRequest) -> Result<NextBeat>;
}

/// Renders a background for a session description and returns its URL.
#[async_trait]
pub trait BackgroundGenerator: Send + Sync {
    async fn create_background(&self, description: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_seed_drops_character() {
        let draft = SceneDraft::Selection {
            role: "user".to_string(),
            options: BTreeMap::from([("1".to_string(), "응".to_string())]),
        };
        assert_eq!(draft.kind(), SceneKind::Selection);

        let seed = draft.into_seed(4);
        assert_eq!(seed.scene_number, 4);
        assert_eq!(seed.content.option_text(1), Some("응"));
        assert_eq!(seed.character_id, None);
    }

    #[test]
    fn test_dialogue_seed_keeps_expression() {
        let seed = SceneDraft::Dialogue {
            role: "소라".to_string(),
            dialogue: "흥.".to_string(),
            character_id: Some(3),
            expression: Some(Expression::Blush),
        }
        .into_seed(1);
        assert_eq!(seed.content.dialogue_text(), Some("흥."));
        assert_eq!(seed.expression, Some(Expression::Blush));
    }
}

//! Request and response bodies of the HTTP API.

use std::collections::BTreeMap;

use gstar_application::{SceneBundle, StartedGame};
use gstar_core::emotion::EmotionDistribution;
use gstar_core::scene::{Scene, SceneContent};
use gstar_core::session::Session;
use gstar_core::{GstarError, Result};
use serde::{Deserialize, Serialize};

/// Field-level checks run after a body deserializes.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

// ============== Auth ==============

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<()> {
        let length = self.username.chars().count();
        if !(3..=50).contains(&length) {
            return Err(GstarError::validation(
                "username must be between 3 and 50 characters",
            ));
        }
        if !is_valid_email(&self.email) {
            return Err(GstarError::validation("email is not a valid email address"));
        }
        if self.password.chars().count() < 6 {
            return Err(GstarError::validation(
                "password must be at least 6 characters",
            ));
        }
        Ok(())
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(name, rest)| !name.is_empty() && !rest.is_empty())
        && !domain.ends_with('.')
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ReissueRequest {
    pub refresh_token: String,
}

impl Validate for ReissueRequest {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

// ============== Game ==============

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub personality: String,
    pub genre: String,
    /// Target playtime in minutes.
    pub playtime: u32,
}

impl Validate for CreateGameRequest {
    fn validate(&self) -> Result<()> {
        if self.personality.trim().is_empty() {
            return Err(GstarError::validation("personality must not be blank"));
        }
        if self.genre.trim().is_empty() {
            return Err(GstarError::validation("genre must not be blank"));
        }
        if self.playtime == 0 {
            return Err(GstarError::validation("playtime must be greater than 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct NextSceneRequest {
    pub emotion: EmotionDistribution,
    /// Elapsed playtime in seconds.
    pub time: u64,
}

impl Validate for NextSceneRequest {
    fn validate(&self) -> Result<()> {
        self.emotion.validate()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SceneData {
    pub role: String,
    pub scene_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub dialogue: Option<String>,
    pub selections: BTreeMap<String, String>,
    pub character_id: Option<i64>,
    pub emotion: Option<String>,
    pub character_filename: Option<String>,
}

impl From<&Scene> for SceneData {
    fn from(scene: &Scene) -> Self {
        let (dialogue, selections) = match &scene.content {
            SceneContent::Dialogue { dialogue } => (Some(dialogue.clone()), BTreeMap::new()),
            SceneContent::Selection { selections } => (None, selections.clone()),
        };
        Self {
            role: scene.role.clone(),
            scene_id: scene.id,
            kind: scene.kind().to_string(),
            dialogue,
            selections,
            character_id: scene.character_id,
            emotion: scene.expression.map(|e| e.to_string()),
            character_filename: scene.character_filename(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionData {
    pub session_id: i64,
    pub content: String,
    pub scenes: Vec<SceneData>,
    pub background_url: Option<String>,
}

impl SessionData {
    fn new(session: &Session, scene: &Scene) -> Self {
        Self {
            session_id: session.id,
            content: session.content.clone(),
            scenes: vec![SceneData::from(scene)],
            background_url: session.background_url.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGameResponse {
    pub game_id: i64,
    pub personality: String,
    pub genre: String,
    pub title: String,
    pub playtime: u32,
    pub main_character_id: i64,
    pub main_character_name: String,
    pub sessions: Vec<SessionData>,
}

impl From<StartedGame> for CreateGameResponse {
    fn from(started: StartedGame) -> Self {
        let session = SessionData::new(&started.session, &started.scene);
        Self {
            game_id: started.game.id,
            personality: started.game.personality,
            genre: started.game.genre,
            title: started.game.title,
            playtime: started.game.playtime_minutes,
            main_character_id: started.main_character.id,
            main_character_name: started.main_character.name,
            sessions: vec![session],
        }
    }
}

/// Same shape as one entry of `CreateGameResponse::sessions`.
pub type NextSceneResponse = SessionData;

impl From<SceneBundle> for NextSceneResponse {
    fn from(bundle: SceneBundle) -> Self {
        SessionData::new(&bundle.session, &bundle.scene)
    }
}

//! In-memory repositories.
//!
//! `InMemoryStore` implements every repository trait over plain collections
//! behind one mutex. It mirrors the SQLite store's rules (unique usernames,
//! gapless numbering, write-once selections, no scenes in closed sessions)
//! and is used only by tests. The server always runs on SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gstar_core::character::{Character, CharacterRepository, NewCharacter};
use gstar_core::game::{Game, GameRepository, NewGame};
use gstar_core::scene::{Scene, SceneKind, SceneRepository, SceneSeed};
use gstar_core::session::{Session, SessionRepository, SessionSeed};
use gstar_core::user::{NewUser, RefreshToken, RefreshTokenRepository, User, UserRepository};
use gstar_core::{GstarError, Result};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    users: Vec<User>,
    refresh_tokens: Vec<RefreshToken>,
    characters: Vec<Character>,
    games: Vec<Game>,
    sessions: Vec<Session>,
    scenes: Vec<Scene>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_session(&mut self, game_id: i64, seed: &SessionSeed, now: DateTime<Utc>) -> Result<Session> {
        if seed.session_number == 0
            || self
                .sessions
                .iter()
                .any(|s| s.game_id == game_id && s.session_number == seed.session_number)
        {
            return Err(GstarError::data_access(format!(
                "Session number {} is not available for game {}",
                seed.session_number, game_id
            )));
        }
        let session = Session {
            id: self.next_id(),
            game_id,
            session_number: seed.session_number,
            content: seed.content.clone(),
            background_url: seed.background_url.clone(),
            is_completed: false,
            created_at: now,
            updated_at: now,
        };
        self.sessions.push(session.clone());
        Ok(session)
    }

    fn insert_scene(&mut self, session_id: i64, seed: &SceneSeed, now: DateTime<Utc>) -> Result<Scene> {
        match self.sessions.iter().find(|s| s.id == session_id) {
            None => return Err(GstarError::not_found("Session", session_id)),
            Some(session) if session.is_completed => {
                return Err(GstarError::bad_request("Session is already completed"));
            }
            Some(_) => {}
        }
        if seed.scene_number == 0
            || self
                .scenes
                .iter()
                .any(|s| s.session_id == session_id && s.scene_number == seed.scene_number)
        {
            return Err(GstarError::data_access(format!(
                "Scene number {} is not available for session {}",
                seed.scene_number, session_id
            )));
        }
        let scene = Scene {
            id: self.next_id(),
            session_id,
            scene_number: seed.scene_number,
            role: seed.role.clone(),
            content: seed.content.clone(),
            selected_option: None,
            character_id: seed.character_id,
            expression: seed.expression,
            created_at: now,
        };
        self.scenes.push(scene.clone());
        Ok(scene)
    }
}

/// Shared in-memory backing for all repositories. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| GstarError::internal("In-memory store lock poisoned"))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let mut state = self.lock()?;
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(GstarError::conflict("Username already registered"));
        }
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(GstarError::conflict("Email already registered"));
        }
        let now = Utc::now();
        let created = User {
            id: state.next_id(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryStore {
    async fn save(&self, user_id: i64, token: &str, expires_at: DateTime<Utc>) -> Result<RefreshToken> {
        let mut state = self.lock()?;
        let stored = RefreshToken {
            id: state.next_id(),
            user_id,
            token: token.to_string(),
            created_at: Utc::now(),
            expires_at,
        };
        state.refresh_tokens.push(stored.clone());
        Ok(stored)
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>> {
        Ok(self.lock()?.refresh_tokens.iter().find(|t| t.token == token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.lock()?.refresh_tokens.retain(|t| t.token != token);
        Ok(())
    }

    async fn rotate(
        &self,
        old_token: &str,
        user_id: i64,
        new_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken> {
        let mut state = self.lock()?;
        let position = state
            .refresh_tokens
            .iter()
            .position(|t| t.token == old_token && t.user_id == user_id)
            .ok_or_else(|| GstarError::unauthorized("Invalid refresh token"))?;
        state.refresh_tokens.remove(position);
        let stored = RefreshToken {
            id: state.next_id(),
            user_id,
            token: new_token.to_string(),
            created_at: Utc::now(),
            expires_at,
        };
        state.refresh_tokens.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl CharacterRepository for InMemoryStore {
    async fn list_all(&self) -> Result<Vec<Character>> {
        let mut characters = self.lock()?.characters.clone();
        characters.sort_by_key(|c| c.id);
        Ok(characters)
    }

    async fn find_by_id(&self, character_id: i64) -> Result<Option<Character>> {
        Ok(self.lock()?.characters.iter().find(|c| c.id == character_id).cloned())
    }

    async fn create(&self, character: &NewCharacter) -> Result<Character> {
        let mut state = self.lock()?;
        let id = state.characters.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let created = Character {
            id,
            name: character.name.clone(),
            personality: character.personality.clone(),
            created_at: Utc::now(),
        };
        state.characters.push(created.clone());
        Ok(created)
    }

    async fn replace_all(&self, characters: &[NewCharacter]) -> Result<Vec<Character>> {
        let now = Utc::now();
        let roster: Vec<Character> = characters
            .iter()
            .zip(1..)
            .map(|(c, id)| Character {
                id,
                name: c.name.clone(),
                personality: c.personality.clone(),
                created_at: now,
            })
            .collect();
        self.lock()?.characters = roster.clone();
        Ok(roster)
    }
}

#[async_trait]
impl GameRepository for InMemoryStore {
    async fn create_with_opening(
        &self,
        game: &NewGame,
        session: &SessionSeed,
        scene: &SceneSeed,
    ) -> Result<(Game, Session, Scene)> {
        if game.playtime_minutes == 0 {
            return Err(GstarError::data_access("Playtime must be positive"));
        }
        let mut state = self.lock()?;
        let now = Utc::now();
        let created = Game {
            id: state.next_id(),
            user_id: game.user_id,
            title: game.title.clone(),
            personality: game.personality.clone(),
            genre: game.genre.clone(),
            playtime_minutes: game.playtime_minutes,
            main_character_id: game.main_character_id,
            created_at: now,
            updated_at: now,
        };
        state.games.push(created.clone());
        let first_session = match state.insert_session(created.id, session, now) {
            Ok(s) => s,
            Err(e) => {
                state.games.pop();
                return Err(e);
            }
        };
        let first_scene = match state.insert_scene(first_session.id, scene, now) {
            Ok(s) => s,
            Err(e) => {
                state.sessions.pop();
                state.games.pop();
                return Err(e);
            }
        };
        Ok((created, first_session, first_scene))
    }

    async fn find_by_id(&self, game_id: i64) -> Result<Option<Game>> {
        Ok(self.lock()?.games.iter().find(|g| g.id == game_id).cloned())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Game>> {
        Ok(self
            .lock()?
            .games
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn find_by_id(&self, session_id: i64) -> Result<Option<Session>> {
        Ok(self.lock()?.sessions.iter().find(|s| s.id == session_id).cloned())
    }

    async fn list_by_game(&self, game_id: i64) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .lock()?
            .sessions
            .iter()
            .filter(|s| s.game_id == game_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.session_number);
        Ok(sessions)
    }

    async fn latest_for_game(&self, game_id: i64) -> Result<Option<Session>> {
        Ok(self
            .lock()?
            .sessions
            .iter()
            .filter(|s| s.game_id == game_id)
            .max_by_key(|s| s.session_number)
            .cloned())
    }

    async fn mark_completed(&self, session_id: i64) -> Result<Session> {
        let mut state = self.lock()?;
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| GstarError::not_found("Session", session_id))?;
        if !session.is_completed {
            session.is_completed = true;
            session.updated_at = Utc::now();
        }
        Ok(session.clone())
    }

    async fn open_next(
        &self,
        game_id: i64,
        closing_session_id: i64,
        session: &SessionSeed,
        first_scene: &SceneSeed,
    ) -> Result<(Session, Scene)> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let closing = state
            .sessions
            .iter()
            .position(|s| s.id == closing_session_id && s.game_id == game_id)
            .ok_or_else(|| GstarError::not_found("Session", closing_session_id))?;
        if state.sessions[closing].is_completed {
            return Err(GstarError::bad_request("Session is already completed"));
        }

        let next = state.insert_session(game_id, session, now)?;
        let scene = match state.insert_scene(next.id, first_scene, now) {
            Ok(scene) => scene,
            Err(e) => {
                state.sessions.pop();
                return Err(e);
            }
        };
        state.sessions[closing].is_completed = true;
        state.sessions[closing].updated_at = now;
        Ok((next, scene))
    }
}

#[async_trait]
impl SceneRepository for InMemoryStore {
    async fn append(&self, session_id: i64, scene: &SceneSeed) -> Result<Scene> {
        self.lock()?.insert_scene(session_id, scene, Utc::now())
    }

    async fn find_by_id(&self, scene_id: i64) -> Result<Option<Scene>> {
        Ok(self.lock()?.scenes.iter().find(|s| s.id == scene_id).cloned())
    }

    async fn list_by_session(&self, session_id: i64) -> Result<Vec<Scene>> {
        let mut scenes: Vec<Scene> = self
            .lock()?
            .scenes
            .iter()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect();
        scenes.sort_by_key(|s| s.scene_number);
        Ok(scenes)
    }

    async fn latest_for_session(&self, session_id: i64) -> Result<Option<Scene>> {
        Ok(self
            .lock()?
            .scenes
            .iter()
            .filter(|s| s.session_id == session_id)
            .max_by_key(|s| s.scene_number)
            .cloned())
    }

    async fn record_selection(&self, scene_id: i64, selection_id: u32) -> Result<bool> {
        let mut state = self.lock()?;
        match state.scenes.iter_mut().find(|s| s.id == scene_id) {
            Some(scene) if scene.kind() == SceneKind::Selection && scene.selected_option.is_none() => {
                scene.selected_option = Some(selection_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

//! Session repository trait.

use super::model::{Session, SessionSeed};
use crate::error::Result;
use crate::scene::{Scene, SceneSeed};
use async_trait::async_trait;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_id(&self, session_id: i64) -> Result<Option<Session>>;

    /// Lists a game's sessions ordered by `session_number`.
    async fn list_by_game(&self, game_id: i64) -> Result<Vec<Session>>;

    /// The session with the highest `session_number` for the game.
    async fn latest_for_game(&self, game_id: i64) -> Result<Option<Session>>;

    /// Sets the completion flag. Completing an already completed session is
    /// a no-op.
    async fn mark_completed(&self, session_id: i64) -> Result<Session>;

    /// Completes `closing_session_id` and creates the next session of the
    /// same game with its first scene, all in one transaction.
    async fn open_next(
        &self,
        game_id: i64,
        closing_session_id: i64,
        session: &SessionSeed,
        first_scene: &SceneSeed,
    ) -> Result<(Session, Scene)>;
}

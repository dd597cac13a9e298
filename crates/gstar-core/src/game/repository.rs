//! Game repository trait.

use super::model::{Game, NewGame};
use crate::error::Result;
use crate::scene::{Scene, SceneSeed};
use crate::session::{Session, SessionSeed};
use async_trait::async_trait;

#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Creates a game together with its first session and that session's
    /// first scene. Either all three rows exist afterwards or none does.
    async fn create_with_opening(
        &self,
        game: &NewGame,
        session: &SessionSeed,
        scene: &SceneSeed,
    ) -> Result<(Game, Session, Scene)>;

    async fn find_by_id(&self, game_id: i64) -> Result<Option<Game>>;

    /// Lists a user's games, oldest first.
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Game>>;
}

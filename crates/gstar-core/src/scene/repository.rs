//! Scene repository trait.

use super::model::{Scene, SceneSeed};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SceneRepository: Send + Sync {
    /// Appends a scene to an existing session.
    async fn append(&self, session_id: i64, scene: &SceneSeed) -> Result<Scene>;

    async fn find_by_id(&self, scene_id: i64) -> Result<Option<Scene>>;

    /// Lists a session's scenes ordered by `scene_number`.
    async fn list_by_session(&self, session_id: i64) -> Result<Vec<Scene>>;

    /// The scene with the highest `scene_number` in the session.
    async fn latest_for_session(&self, session_id: i64) -> Result<Option<Scene>>;

    /// Stores the chosen option if none is stored yet.
    ///
    /// Returns `true` when this call wrote the value and `false` when an
    /// option was already present (the stored value is left untouched).
    async fn record_selection(&self, scene_id: i64, selection_id: u32) -> Result<bool>;
}

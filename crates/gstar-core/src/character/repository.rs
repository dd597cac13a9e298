//! Character repository trait.

use super::model::{Character, NewCharacter};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CharacterRepository: Send + Sync {
    /// Lists the roster ordered by id.
    async fn list_all(&self) -> Result<Vec<Character>>;

    async fn find_by_id(&self, character_id: i64) -> Result<Option<Character>>;

    async fn create(&self, character: &NewCharacter) -> Result<Character>;

    /// Replaces the whole roster in one step.
    async fn replace_all(&self, characters: &[NewCharacter]) -> Result<Vec<Character>>;
}

//! Repository trait re-exports.
//!
//! This module provides centralized access to all repository traits.

pub use crate::character::CharacterRepository;
pub use crate::game::GameRepository;
pub use crate::scene::SceneRepository;
pub use crate::session::SessionRepository;
pub use crate::user::{RefreshTokenRepository, UserRepository};

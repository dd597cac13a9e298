//! Character roster module.

mod model;
mod repository;

pub use model::{Character, NewCharacter, default_roster};
pub use repository::CharacterRepository;

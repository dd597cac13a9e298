//! Game domain module.

mod model;
mod repository;

pub use model::{Game, NewGame};
pub use repository::GameRepository;

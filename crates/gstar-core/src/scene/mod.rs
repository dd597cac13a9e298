//! Scene (single story beat) domain module.

mod expression;
mod model;
mod repository;

pub use expression::Expression;
pub use model::{Scene, SceneContent, SceneKind, SceneSeed};
pub use repository::SceneRepository;

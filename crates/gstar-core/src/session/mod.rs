//! Session (location chapter) domain module.
//!
//! A session is one location within a game, not a network session.

mod model;
mod repository;

pub use model::{Session, SessionSeed};
pub use repository::SessionRepository;

//! Application layer for GSTAR.
//!
//! Use cases coordinate the domain repositories with the story and image
//! generators. They depend on traits only; wiring happens in the server.

pub mod auth_usecase;
pub mod game_usecase;

pub use auth_usecase::AuthUseCase;
pub use game_usecase::{GameUseCase, NewGameCommand, ProgressCommand, SceneBundle, StartedGame};

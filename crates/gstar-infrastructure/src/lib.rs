pub mod config_service;
pub mod memory_repository;
pub mod paths;
pub mod security;
pub mod sqlite;

pub use crate::config_service::ConfigService;
pub use crate::memory_repository::InMemoryStore;
pub use crate::security::{BcryptPasswordHasher, JwtTokenService};
pub use crate::sqlite::{
    SqliteCharacterRepository, SqliteGameRepository, SqliteSceneRepository,
    SqliteSessionRepository, SqliteStore, SqliteUserRepository,
};

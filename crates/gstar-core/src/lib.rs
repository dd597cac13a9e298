pub mod auth;
pub mod character;
pub mod config;
pub mod emotion;
pub mod error;
pub mod game;
pub mod progress;
pub mod repository;
pub mod scene;
pub mod session;
pub mod story;
pub mod user;

// Re-export common error type
pub use error::{GstarError, Result};

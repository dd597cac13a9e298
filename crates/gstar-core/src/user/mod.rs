//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: User account and refresh token models
//! - `repository`: Persistence traits for both

mod model;
mod repository;

// Re-export public API
pub use model::{NewUser, RefreshToken, User};
pub use repository::{RefreshTokenRepository, UserRepository};

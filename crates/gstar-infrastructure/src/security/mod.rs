//! Password hashing and bearer token signing.

mod password;
mod token;

pub use password::BcryptPasswordHasher;
pub use token::JwtTokenService;

pub mod bootstrap;
pub mod state;

pub use bootstrap::{AppBootstrap, bootstrap, open_store, seed_characters};
pub use state::AppState;

use std::sync::Arc;

use gstar_application::{AuthUseCase, GameUseCase};
use gstar_core::config::AppConfig;

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_usecase: Arc<AuthUseCase>,
    pub game_usecase: Arc<GameUseCase>,
    pub config: Arc<AppConfig>,
}

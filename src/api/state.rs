use std::sync::Arc;

use crate::config::AppConfig;
use crate::service::GameService;
use crate::ws::WsManager;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    pub service: Arc<GameService>,
    pub ws: Arc<WsManager>,
    pub config: AppConfig,
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(AppState {
            service: GameService::new(config.bcrypt_cost),
            ws: WsManager::new(),
            config,
            start_time: std::time::Instant::now(),
        })
    }
}

use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::Store;
use crate::services::SessionService;

/// Shared handler state. Cheap to clone: everything sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub store: Arc<dyn Store>,
    pub sessions: SessionService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let tokens = Arc::new(TokenService::new(&config.security));
        let sessions = SessionService::new(tokens.clone(), store.clone());

        Self {
            config: Arc::new(config),
            tokens,
            store,
            sessions,
        }
    }
}

//! Application state.

use reelid_engine::SessionManager;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(config: ApiConfig, sessions: SessionManager) -> Self {
        Self { config, sessions }
    }
}

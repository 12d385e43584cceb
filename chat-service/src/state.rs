//! Application state for the chat service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::session::SessionStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(SessionStore::new()),
        }
    }
}

//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::Level;
use crate::matchmaking::{LobbyHandle, LobbyService, LobbySettings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lobby: LobbyHandle,
}

impl AppState {
    /// Build state and start the lobby task. Must be called inside a tokio runtime.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let settings = LobbySettings {
            quorum: config.quorum,
            race_time_limit: config.race_time_limit,
        };
        let lobby = LobbyService::spawn(settings, Arc::new(Level::default()), config.tick_period());

        Self { config, lobby }
    }
}

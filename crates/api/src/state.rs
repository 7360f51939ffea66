//! Handler state.

use std::sync::Arc;

use placement_db::DbPool;

use crate::config::ServerConfig;

/// Everything a handler reaches through `State<AppState>`. Clones share the
/// pool and the config.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, config: ServerConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}

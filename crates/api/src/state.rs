use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool and the config are both reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: slotbook_db::DbPool,
    /// Server configuration, loaded once at startup.
    pub config: Arc<ServerConfig>,
}

//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use heartmap_core::config::HeartMapConfig;
use heartmap_storage::{Database, QueryService};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Nothing here
/// is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HeartMapConfig>,
    pub database: Arc<Database>,
    pub query_service: Arc<QueryService>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: HeartMapConfig, database: Database) -> Self {
        Self::with_database(config, Arc::new(database))
    }

    /// Build state around a database handle that is also used elsewhere.
    pub fn with_database(config: HeartMapConfig, database: Arc<Database>) -> Self {
        Self {
            config: Arc::new(config),
            query_service: Arc::new(QueryService::new(Arc::clone(&database))),
            database,
            start_time: Instant::now(),
        }
    }
}

//! Application state shared across all route handlers.
//!
//! AppState holds the configuration, the database, the GraphQL schema and
//! the API token. It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use dax_core::config::DaxConfig;
use dax_storage::Database;

use crate::graphql::{build_schema, DaxSchema};

/// Shared application state.
///
/// All fields are cheap to clone across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<DaxConfig>,
    /// SQLite database for persistent storage.
    pub database: Arc<Database>,
    /// Executable GraphQL schema with the database attached.
    pub schema: DaxSchema,
    /// Bearer token required on `/query`.
    pub api_token: String,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState and build the schema over `database`.
    pub fn new(config: DaxConfig, database: Database, api_token: String) -> Self {
        let database = Arc::new(database);
        let schema = build_schema(Arc::clone(&database), config.search.clone());
        Self {
            config: Arc::new(config),
            database,
            schema,
            api_token,
            start_time: Instant::now(),
        }
    }
}

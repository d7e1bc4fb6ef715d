//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.
//! Configures WAL mode and recommended PRAGMAs, installs the trigram SQL
//! functions, and runs migrations on initialization.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use dax_core::error::DaxError;

use crate::{migrations, trigram};

/// Thread-safe SQLite database wrapper.
///
/// The connection is wrapped in a Mutex since rusqlite Connection is not
/// Sync. All repositories share one `Arc<Database>`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    ///
    /// Configures WAL mode, synchronous=NORMAL, foreign keys, registers the
    /// `similarity()` and `fold()` functions, and runs all pending migrations.
    pub fn new(path: &Path) -> Result<Self, DaxError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| DaxError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| DaxError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        Self::init(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, DaxError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DaxError::Storage(format!("Failed to open in-memory db: {}", e)))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DaxError::Storage(format!("Failed to set pragmas: {}", e)))?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, DaxError> {
        trigram::register_functions(&conn)?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;

        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// This is the primary way to interact with the database. The mutex
    /// is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DaxError>
    where
        F: FnOnce(&Connection) -> Result<T, DaxError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DaxError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Current schema version.
    pub fn schema_version(&self) -> Result<i64, DaxError> {
        self.with_conn(migrations::current_version)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

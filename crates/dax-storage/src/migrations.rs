//! Database schema migrations.
//!
//! Applies the initial schema: users, vaults, the user/vault membership
//! table, entries, the trigram heading index and the global id ranges.

use rusqlite::Connection;
use tracing::info;

use dax_core::error::DaxError;
use dax_core::types::NodeType;

/// Highest schema version known to this build.
pub const LATEST_VERSION: i64 = 1;

/// Run all pending database migrations.
///
/// Each version is applied at most once; running this on an up-to-date
/// database is a no-op.
pub fn run_migrations(conn: &Connection) -> Result<(), DaxError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| DaxError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let version = current_version(conn)?;

    if version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Highest applied migration version, 0 for an empty database.
pub fn current_version(conn: &Connection) -> Result<i64, DaxError> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| DaxError::Storage(format!("Failed to query migration version: {}", e)))
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), DaxError> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| DaxError::Storage(format!("Failed to begin migration: {}", e)))?;

    tx.execute_batch(
        "
        -- Registry of entity types; the row id is the type's id range index.
        CREATE TABLE IF NOT EXISTS node_types (
            id              INTEGER PRIMARY KEY NOT NULL,
            type            TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            username        TEXT NOT NULL UNIQUE,
            hash            TEXT NOT NULL,
            settings        TEXT,
            created_at      INTEGER NOT NULL,
            active_at       INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS vaults (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL UNIQUE,
            settings        TEXT,
            created_at      INTEGER NOT NULL
        );

        -- Many-to-many: users <-> vaults.
        CREATE TABLE IF NOT EXISTS user_vaults (
            user_id         INTEGER NOT NULL,
            vault_id        INTEGER NOT NULL,
            PRIMARY KEY (user_id, vault_id),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (vault_id) REFERENCES vaults(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_user_vaults_vault
            ON user_vaults (vault_id);

        CREATE TABLE IF NOT EXISTS entries (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            vault_id        INTEGER NOT NULL,
            heading         TEXT,
            body            TEXT,
            attributes      TEXT,
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL,
            FOREIGN KEY (vault_id) REFERENCES vaults(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_entries_created_at
            ON entries (created_at DESC);

        CREATE INDEX IF NOT EXISTS idx_entries_updated_at
            ON entries (updated_at DESC);

        CREATE INDEX IF NOT EXISTS idx_entries_vault
            ON entries (vault_id, updated_at DESC);

        -- Trigram index over entry headings (external content).
        CREATE VIRTUAL TABLE IF NOT EXISTS entries_heading_trgm USING fts5(
            heading,
            content = 'entries',
            content_rowid = 'id',
            tokenize = 'trigram'
        );

        CREATE TRIGGER IF NOT EXISTS entries_heading_ai AFTER INSERT ON entries BEGIN
            INSERT INTO entries_heading_trgm (rowid, heading) VALUES (new.id, new.heading);
        END;

        CREATE TRIGGER IF NOT EXISTS entries_heading_ad AFTER DELETE ON entries BEGIN
            INSERT INTO entries_heading_trgm (entries_heading_trgm, rowid, heading)
                VALUES ('delete', old.id, old.heading);
        END;

        CREATE TRIGGER IF NOT EXISTS entries_heading_au AFTER UPDATE OF heading ON entries BEGIN
            INSERT INTO entries_heading_trgm (entries_heading_trgm, rowid, heading)
                VALUES ('delete', old.id, old.heading);
            INSERT INTO entries_heading_trgm (rowid, heading) VALUES (new.id, new.heading);
        END;
        ",
    )
    .map_err(|e| DaxError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    // Seed the global id ranges: each table's AUTOINCREMENT counter starts
    // at the bottom of its type's range.
    for node_type in NodeType::ALL {
        tx.execute(
            "INSERT OR IGNORE INTO node_types (id, type) VALUES (?1, ?2)",
            rusqlite::params![node_type.type_index(), node_type.table()],
        )
        .map_err(|e| DaxError::Storage(format!("Failed to register node type: {}", e)))?;

        let seeded: bool = tx
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name = ?1)",
                rusqlite::params![node_type.table()],
                |row| row.get(0),
            )
            .map_err(|e| DaxError::Storage(e.to_string()))?;
        if !seeded {
            tx.execute(
                "INSERT INTO sqlite_sequence (name, seq) VALUES (?1, ?2)",
                rusqlite::params![node_type.table(), node_type.id_range_start()],
            )
            .map_err(|e| DaxError::Storage(format!("Failed to seed id range: {}", e)))?;
        }
    }

    tx.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema')",
        [],
    )
    .map_err(|e| DaxError::Storage(format!("Failed to record migration v1: {}", e)))?;

    tx.commit()
        .map_err(|e| DaxError::Storage(format!("Failed to commit migration v1: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        crate::trigram::register_functions(&conn).unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        // Running again should be idempotent.
        run_migrations(&conn).unwrap();

        assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_node_types_registered() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        let types: Vec<(i64, String)> = conn
            .prepare("SELECT id, type FROM node_types ORDER BY id")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            types,
            vec![
                (0, "users".to_string()),
                (1, "vaults".to_string()),
                (2, "entries".to_string())
            ]
        );
    }

    #[test]
    fn test_ids_allocated_from_type_ranges() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO users (username, hash, created_at, active_at) VALUES ('greg', 'h', 0, 0)",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO vaults (name, created_at) VALUES ('inbox', 0)", [])
            .unwrap();
        let vault_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO entries (vault_id, heading, created_at, updated_at) VALUES (?1, 'x', 0, 0)",
            [vault_id],
        )
        .unwrap();
        let entry_id = conn.last_insert_rowid();

        let user_id: i64 = conn
            .query_row("SELECT id FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(NodeType::from_id(user_id), Some(NodeType::User));
        assert_eq!(vault_id, NodeType::Vault.id_range_start() + 1);
        assert_eq!(NodeType::from_id(vault_id), Some(NodeType::Vault));
        assert_eq!(NodeType::from_id(entry_id), Some(NodeType::Entry));
    }

    #[test]
    fn test_unique_username() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO users (username, hash, created_at, active_at) VALUES ('greg', 'h', 0, 0)",
            [],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO users (username, hash, created_at, active_at) VALUES ('greg', 'h', 0, 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_requires_existing_vault() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO entries (vault_id, created_at, updated_at) VALUES (42, 0, 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_trigram_index_follows_entries() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute("INSERT INTO vaults (name, created_at) VALUES ('inbox', 0)", [])
            .unwrap();
        let vault_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO entries (vault_id, heading, created_at, updated_at) VALUES (?1, 'Weekly planning', 0, 0)",
            [vault_id],
        )
        .unwrap();
        let entry_id = conn.last_insert_rowid();

        let count = |needle: &str| -> i64 {
            conn.query_row(
                "SELECT COUNT(*) FROM entries_heading_trgm WHERE entries_heading_trgm MATCH ?1",
                [needle],
                |row| row.get(0),
            )
            .unwrap()
        };

        assert_eq!(count("\"plan\""), 1);

        conn.execute(
            "UPDATE entries SET heading = 'Daily standup' WHERE id = ?1",
            [entry_id],
        )
        .unwrap();
        assert_eq!(count("\"plan\""), 0);
        assert_eq!(count("\"stand\""), 1);

        conn.execute("DELETE FROM vaults WHERE id = ?1", [vault_id])
            .unwrap();
        assert_eq!(count("\"stand\""), 0);
    }
}

//! Fuzzy heading search.
//!
//! Ranks entries by trigram similarity between their heading and the query,
//! using the `similarity()` SQL function installed by [`crate::trigram`].

use std::sync::Arc;

use tracing::debug;

use dax_core::error::DaxError;
use dax_core::types::Entry;

use crate::db::Database;
use crate::repository::row_to_entry_at;

/// Parameters for a heading search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Minimum similarity in `[0.0, 1.0]` for an entry to be returned.
    pub threshold: f64,
    /// Restrict results to one vault.
    pub vault_id: Option<i64>,
    /// Maximum number of hits.
    pub limit: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            vault_id: None,
            limit: 20,
        }
    }
}

/// A single search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub entry: Entry,
    /// Similarity between the heading and the query.
    pub score: f64,
}

/// Trigram-similarity search over entry headings.
pub struct HeadingSearch {
    db: Arc<Database>,
}

impl HeadingSearch {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Entries whose heading similarity to `query` is at least
    /// `options.threshold`, best match first. Ties go to the most recently
    /// updated entry.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>, DaxError> {
        let query = query.trim();
        if query.is_empty() || options.limit == 0 {
            return Ok(Vec::new());
        }
        if !(0.0..=1.0).contains(&options.threshold) {
            return Err(DaxError::Validation(format!(
                "threshold must be between 0 and 1, got {}",
                options.threshold
            )));
        }

        let limit = i64::try_from(options.limit).unwrap_or(i64::MAX);

        let hits = self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, vault_id, heading, body, attributes, created_at, updated_at,
                            similarity(heading, ?1) AS score
                     FROM entries
                     WHERE heading IS NOT NULL
                       AND (?3 IS NULL OR vault_id = ?3)
                       AND similarity(heading, ?1) >= ?2
                     ORDER BY score DESC, updated_at DESC, id DESC
                     LIMIT ?4",
                )
                .map_err(|e| DaxError::Storage(format!("Search query prepare failed: {}", e)))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![query, options.threshold, options.vault_id, limit],
                    |row| {
                        Ok(SearchHit {
                            entry: row_to_entry_at(row, 0)?,
                            score: row.get(7)?,
                        })
                    },
                )
                .map_err(|e| DaxError::Storage(format!("Search query failed: {}", e)))?;

            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| DaxError::Storage(e.to_string()))
        })?;

        debug!(query = %query, hits = hits.len(), "Heading search");
        Ok(hits)
    }
}

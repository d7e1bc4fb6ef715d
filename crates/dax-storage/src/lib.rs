//! Dax storage crate - SQLite persistence and trigram search.
//!
//! Provides a WAL-mode SQLite database with migrations, a pg_trgm-compatible
//! `similarity()` SQL function, repositories for users, vaults and entries,
//! and fuzzy search over entry headings.

pub mod db;
pub mod migrations;
pub mod repository;
pub mod search;
pub mod trigram;

pub use db::Database;
pub use repository::{EntryRepository, UserRepository, VaultRepository};
pub use search::{HeadingSearch, SearchHit, SearchOptions};

//! Repository implementations for SQLite-backed persistence.
//!
//! Provides UserRepository, VaultRepository and EntryRepository that operate
//! on the Database struct using raw SQL. Reads used inside a write
//! transaction are free functions over `&Connection` so they never re-enter
//! the database mutex.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use dax_core::error::DaxError;
use dax_core::password;
use dax_core::types::{
    validate_heading, validate_name, Entry, EntryFilter, EntryOrder, EntryUpdate, NewEntry,
    NewUser, NewVault, NodeType, Page, PageRequest, User, UserFilter, UserUpdate, Vault,
    VaultFilter, VaultUpdate,
};

use crate::db::Database;
use crate::trigram;

const USER_COLUMNS: &str = "id, username, hash, settings, created_at, active_at";
const VAULT_COLUMNS: &str = "id, name, settings, created_at";
const ENTRY_COLUMNS: &str = "id, vault_id, heading, body, attributes, created_at, updated_at";

/// Repository for users and their vault memberships.
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a user. `new.hash` must already be a password hash.
    pub fn create(&self, new: &NewUser) -> Result<User, DaxError> {
        let username = validate_name("username", &new.username)?;
        if new.hash.is_empty() {
            return Err(DaxError::Validation(
                "password hash must not be empty".to_string(),
            ));
        }
        let settings = json_text(new.settings.as_ref())?;

        let user = self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(sql_err)?;
            let now = now_micros();
            tx.execute(
                "INSERT INTO users (username, hash, settings, created_at, active_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                rusqlite::params![username, new.hash, settings, now],
            )
            .map_err(|e| write_err("username", &username, e))?;
            let id = tx.last_insert_rowid();

            for &vault_id in &new.vault_ids {
                ensure_node(&tx, NodeType::Vault, vault_id)?;
                link(&tx, id, vault_id)?;
            }

            let user = select_user(&tx, id)?.ok_or_else(|| DaxError::not_found("User", id))?;
            tx.commit().map_err(sql_err)?;
            Ok(user)
        })?;

        debug!(user_id = user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Find a user by ID.
    pub fn find_by_id(&self, id: i64) -> Result<Option<User>, DaxError> {
        self.db.with_conn(|conn| select_user(conn, id))
    }

    /// Fetch a user by ID, failing with `NotFound` if it does not exist.
    pub fn get(&self, id: i64) -> Result<User, DaxError> {
        self.find_by_id(id)?
            .ok_or_else(|| DaxError::not_found("User", id))
    }

    /// Find a user by exact username.
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, DaxError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                rusqlite::params![username.trim()],
                row_to_user,
            )
            .optional()
            .map_err(sql_err)
        })
    }

    /// List users matching `filter`, ordered by ID.
    pub fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<User>, DaxError> {
        self.list_window(filter, |_| page)
    }

    /// Like [`list`](Self::list), but the page is chosen from the total
    /// count inside the same connection lock.
    pub fn list_window(
        &self,
        filter: &UserFilter,
        window: impl FnOnce(u64) -> PageRequest,
    ) -> Result<Page<User>, DaxError> {
        let mut conditions = Conditions::default();
        if let Some(username) = &filter.username {
            conditions.push("username = ?", username.trim().to_string());
        }
        if let Some(needle) = &filter.username_contains {
            conditions.push("username LIKE ? ESCAPE '\\'", like_pattern(needle));
        }
        if let Some(vault_id) = filter.vault_id {
            conditions.push(
                "id IN (SELECT user_id FROM user_vaults WHERE vault_id = ?)",
                vault_id,
            );
        }

        self.db.with_conn(|conn| {
            select_page(conn, "users", USER_COLUMNS, &conditions, "id ASC", window, row_to_user)
        })
    }

    /// Count all users.
    pub fn count(&self) -> Result<u64, DaxError> {
        self.db.with_conn(|conn| count_table(conn, "users"))
    }

    /// Apply a partial update and return the updated user.
    pub fn update(&self, id: i64, update: &UserUpdate) -> Result<User, DaxError> {
        let mut sets = Assignments::default();
        let mut username_for_conflict = String::new();
        if let Some(username) = &update.username {
            let username = validate_name("username", username)?;
            username_for_conflict = username.clone();
            sets.push("username", username);
        }
        if let Some(hash) = &update.hash {
            if hash.is_empty() {
                return Err(DaxError::Validation(
                    "password hash must not be empty".to_string(),
                ));
            }
            sets.push("hash", hash.clone());
        }
        if let Some(settings) = &update.settings {
            sets.push("settings", json_text(settings.as_ref())?);
        }
        if let Some(active_at) = update.active_at {
            sets.push("active_at", active_at.timestamp_micros());
        }

        let user = self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(sql_err)?;
            ensure_node(&tx, NodeType::User, id)?;

            sets.apply(&tx, "users", id)
                .map_err(|e| write_err("username", &username_for_conflict, e))?;

            if update.clear_vaults {
                tx.execute(
                    "DELETE FROM user_vaults WHERE user_id = ?1",
                    rusqlite::params![id],
                )
                .map_err(sql_err)?;
            }
            for &vault_id in &update.remove_vault_ids {
                unlink(&tx, id, vault_id)?;
            }
            for &vault_id in &update.add_vault_ids {
                ensure_node(&tx, NodeType::Vault, vault_id)?;
                link(&tx, id, vault_id)?;
            }

            let user = select_user(&tx, id)?.ok_or_else(|| DaxError::not_found("User", id))?;
            tx.commit().map_err(sql_err)?;
            Ok(user)
        })?;

        debug!(user_id = id, "User updated");
        Ok(user)
    }

    /// Delete a user. Vault memberships go with it; vaults survive.
    pub fn delete(&self, id: i64) -> Result<(), DaxError> {
        self.db.with_conn(|conn| {
            let affected = conn
                .execute("DELETE FROM users WHERE id = ?1", rusqlite::params![id])
                .map_err(|e| DaxError::Storage(format!("Failed to delete user: {}", e)))?;
            if affected == 0 {
                return Err(DaxError::not_found("User", id));
            }
            Ok(())
        })?;
        debug!(user_id = id, "User deleted");
        Ok(())
    }

    /// Set `active_at` to now.
    pub fn touch_active(&self, id: i64) -> Result<User, DaxError> {
        self.update(
            id,
            &UserUpdate {
                active_at: Some(Utc::now()),
                ..UserUpdate::default()
            },
        )
    }

    /// Verify a username/password pair and bump `active_at` on success.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User, DaxError> {
        let user = match self.find_by_username(username)? {
            Some(user) => user,
            None => {
                warn!(username = %username, "Sign-in for unknown user");
                return Err(DaxError::InvalidCredentials);
            }
        };

        if !password::verify_password(password, &user.hash)? {
            warn!(user_id = user.id, "Sign-in with wrong password");
            return Err(DaxError::InvalidCredentials);
        }

        self.touch_active(user.id)
    }

    /// Vaults the user belongs to, ordered by ID.
    pub fn vaults_of(&self, user_id: i64) -> Result<Vec<Vault>, DaxError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT v.id, v.name, v.settings, v.created_at
                     FROM vaults v
                     JOIN user_vaults uv ON uv.vault_id = v.id
                     WHERE uv.user_id = ?1
                     ORDER BY v.id ASC",
                )
                .map_err(sql_err)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id], row_to_vault)
                .map_err(sql_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
        })
    }
}

/// Repository for vaults and their members.
pub struct VaultRepository {
    db: Arc<Database>,
}

impl VaultRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a vault, optionally linking it to existing users.
    pub fn create(&self, new: &NewVault) -> Result<Vault, DaxError> {
        let name = validate_name("name", &new.name)?;
        let settings = json_text(new.settings.as_ref())?;

        let vault = self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(sql_err)?;
            tx.execute(
                "INSERT INTO vaults (name, settings, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![name, settings, now_micros()],
            )
            .map_err(|e| write_err("vault name", &name, e))?;
            let id = tx.last_insert_rowid();

            for &user_id in &new.user_ids {
                ensure_node(&tx, NodeType::User, user_id)?;
                link(&tx, user_id, id)?;
            }

            let vault = select_vault(&tx, id)?.ok_or_else(|| DaxError::not_found("Vault", id))?;
            tx.commit().map_err(sql_err)?;
            Ok(vault)
        })?;

        debug!(vault_id = vault.id, name = %vault.name, "Vault created");
        Ok(vault)
    }

    /// Find a vault by ID.
    pub fn find_by_id(&self, id: i64) -> Result<Option<Vault>, DaxError> {
        self.db.with_conn(|conn| select_vault(conn, id))
    }

    /// Fetch a vault by ID, failing with `NotFound` if it does not exist.
    pub fn get(&self, id: i64) -> Result<Vault, DaxError> {
        self.find_by_id(id)?
            .ok_or_else(|| DaxError::not_found("Vault", id))
    }

    /// Find a vault by exact name.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Vault>, DaxError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM vaults WHERE name = ?1", VAULT_COLUMNS),
                rusqlite::params![name.trim()],
                row_to_vault,
            )
            .optional()
            .map_err(sql_err)
        })
    }

    /// List vaults matching `filter`, ordered by ID.
    pub fn list(&self, filter: &VaultFilter, page: PageRequest) -> Result<Page<Vault>, DaxError> {
        self.list_window(filter, |_| page)
    }

    /// Like [`list`](Self::list), with the page chosen from the total count.
    pub fn list_window(
        &self,
        filter: &VaultFilter,
        window: impl FnOnce(u64) -> PageRequest,
    ) -> Result<Page<Vault>, DaxError> {
        let mut conditions = Conditions::default();
        if let Some(name) = &filter.name {
            conditions.push("name = ?", name.trim().to_string());
        }
        if let Some(needle) = &filter.name_contains {
            conditions.push("name LIKE ? ESCAPE '\\'", like_pattern(needle));
        }
        if let Some(user_id) = filter.user_id {
            conditions.push(
                "id IN (SELECT vault_id FROM user_vaults WHERE user_id = ?)",
                user_id,
            );
        }

        self.db.with_conn(|conn| {
            select_page(conn, "vaults", VAULT_COLUMNS, &conditions, "id ASC", window, row_to_vault)
        })
    }

    /// Count all vaults.
    pub fn count(&self) -> Result<u64, DaxError> {
        self.db.with_conn(|conn| count_table(conn, "vaults"))
    }

    /// Apply a partial update and return the updated vault.
    pub fn update(&self, id: i64, update: &VaultUpdate) -> Result<Vault, DaxError> {
        let mut sets = Assignments::default();
        let mut name_for_conflict = String::new();
        if let Some(name) = &update.name {
            let name = validate_name("name", name)?;
            name_for_conflict = name.clone();
            sets.push("name", name);
        }
        if let Some(settings) = &update.settings {
            sets.push("settings", json_text(settings.as_ref())?);
        }

        let vault = self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(sql_err)?;
            ensure_node(&tx, NodeType::Vault, id)?;

            sets.apply(&tx, "vaults", id)
                .map_err(|e| write_err("vault name", &name_for_conflict, e))?;

            if update.clear_users {
                tx.execute(
                    "DELETE FROM user_vaults WHERE vault_id = ?1",
                    rusqlite::params![id],
                )
                .map_err(sql_err)?;
            }
            for &user_id in &update.remove_user_ids {
                unlink(&tx, user_id, id)?;
            }
            for &user_id in &update.add_user_ids {
                ensure_node(&tx, NodeType::User, user_id)?;
                link(&tx, user_id, id)?;
            }

            let vault = select_vault(&tx, id)?.ok_or_else(|| DaxError::not_found("Vault", id))?;
            tx.commit().map_err(sql_err)?;
            Ok(vault)
        })?;

        debug!(vault_id = id, "Vault updated");
        Ok(vault)
    }

    /// Delete a vault together with its memberships and entries.
    pub fn delete(&self, id: i64) -> Result<(), DaxError> {
        let removed_entries = self.db.with_conn(|conn| {
            let entries: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM entries WHERE vault_id = ?1",
                    rusqlite::params![id],
                    |row| row.get(0),
                )
                .map_err(sql_err)?;
            let affected = conn
                .execute("DELETE FROM vaults WHERE id = ?1", rusqlite::params![id])
                .map_err(|e| DaxError::Storage(format!("Failed to delete vault: {}", e)))?;
            if affected == 0 {
                return Err(DaxError::not_found("Vault", id));
            }
            Ok(entries)
        })?;
        debug!(vault_id = id, removed_entries, "Vault deleted");
        Ok(())
    }

    /// Members of a vault, ordered by ID.
    pub fn users_of(&self, vault_id: i64) -> Result<Vec<User>, DaxError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT u.id, u.username, u.hash, u.settings, u.created_at, u.active_at
                     FROM users u
                     JOIN user_vaults uv ON uv.user_id = u.id
                     WHERE uv.vault_id = ?1
                     ORDER BY u.id ASC",
                )
                .map_err(sql_err)?;
            let rows = stmt
                .query_map(rusqlite::params![vault_id], row_to_user)
                .map_err(sql_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
        })
    }

    /// Entries of a vault, most recently updated first.
    pub fn entries_of(&self, vault_id: i64, page: PageRequest) -> Result<Page<Entry>, DaxError> {
        EntryRepository::new(Arc::clone(&self.db)).list(
            &EntryFilter {
                vault_id: Some(vault_id),
                ..EntryFilter::default()
            },
            EntryOrder::default(),
            page,
        )
    }
}

/// Repository for entries.
pub struct EntryRepository {
    db: Arc<Database>,
}

impl EntryRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create an entry inside an existing vault.
    pub fn create(&self, new: &NewEntry) -> Result<Entry, DaxError> {
        if let Some(heading) = &new.heading {
            validate_heading(heading)?;
        }
        let attributes = json_text(new.attributes.as_ref())?;

        let entry = self.db.with_conn(|conn| {
            ensure_node(conn, NodeType::Vault, new.vault_id)?;
            let now = now_micros();
            conn.execute(
                "INSERT INTO entries (vault_id, heading, body, attributes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![new.vault_id, new.heading, new.body, attributes, now],
            )
            .map_err(|e| DaxError::Storage(format!("Failed to save entry: {}", e)))?;
            let id = conn.last_insert_rowid();
            select_entry(conn, id)?.ok_or_else(|| DaxError::not_found("Entry", id))
        })?;

        debug!(entry_id = entry.id, vault_id = entry.vault_id, "Entry created");
        Ok(entry)
    }

    /// Find an entry by ID.
    pub fn find_by_id(&self, id: i64) -> Result<Option<Entry>, DaxError> {
        self.db.with_conn(|conn| select_entry(conn, id))
    }

    /// Fetch an entry by ID, failing with `NotFound` if it does not exist.
    pub fn get(&self, id: i64) -> Result<Entry, DaxError> {
        self.find_by_id(id)?
            .ok_or_else(|| DaxError::not_found("Entry", id))
    }

    /// List entries matching `filter` in the requested order.
    ///
    /// `heading_contains` is answered from the trigram index when the needle
    /// has at least three characters; shorter needles fall back to a scan
    /// over `fold(heading)` so both paths ignore case the same way.
    pub fn list(
        &self,
        filter: &EntryFilter,
        order: EntryOrder,
        page: PageRequest,
    ) -> Result<Page<Entry>, DaxError> {
        self.list_window(filter, order, |_| page)
    }

    /// Like [`list`](Self::list), with the page chosen from the total count.
    pub fn list_window(
        &self,
        filter: &EntryFilter,
        order: EntryOrder,
        window: impl FnOnce(u64) -> PageRequest,
    ) -> Result<Page<Entry>, DaxError> {
        let mut conditions = Conditions::default();
        if let Some(vault_id) = filter.vault_id {
            conditions.push("vault_id = ?", vault_id);
        }
        if let Some(needle) = &filter.heading_contains {
            if needle.chars().count() >= 3 {
                conditions.push(
                    "id IN (SELECT rowid FROM entries_heading_trgm WHERE entries_heading_trgm MATCH ?)",
                    fts_phrase(needle),
                );
            } else {
                conditions.push("instr(fold(heading), ?) > 0", trigram::fold(needle));
            }
        }
        if let Some(needle) = &filter.body_contains {
            conditions.push("body LIKE ? ESCAPE '\\'", like_pattern(needle));
        }
        match filter.has_heading {
            Some(true) => conditions.push_raw("heading IS NOT NULL AND heading != ''"),
            Some(false) => conditions.push_raw("(heading IS NULL OR heading = '')"),
            None => {}
        }
        if let Some(t) = filter.created_after {
            conditions.push("created_at >= ?", t.timestamp_micros());
        }
        if let Some(t) = filter.created_before {
            conditions.push("created_at < ?", t.timestamp_micros());
        }
        if let Some(t) = filter.updated_after {
            conditions.push("updated_at >= ?", t.timestamp_micros());
        }
        if let Some(t) = filter.updated_before {
            conditions.push("updated_at < ?", t.timestamp_micros());
        }

        let direction = order.direction.sql();
        let order_by = format!(
            "{} {}, id {}",
            order.field.column(),
            direction,
            direction
        );

        self.db.with_conn(|conn| {
            select_page(conn, "entries", ENTRY_COLUMNS, &conditions, &order_by, window, row_to_entry)
        })
    }

    /// Count all entries.
    pub fn count(&self) -> Result<u64, DaxError> {
        self.db.with_conn(|conn| count_table(conn, "entries"))
    }

    /// Apply a partial update and return the updated entry.
    ///
    /// `updated_at` always moves forward, even for an empty update;
    /// `created_at` is never touched.
    pub fn update(&self, id: i64, update: &EntryUpdate) -> Result<Entry, DaxError> {
        let mut sets = Assignments::default();
        if let Some(heading) = &update.heading {
            if let Some(h) = heading {
                validate_heading(h)?;
            }
            sets.push("heading", heading.clone());
        }
        if let Some(body) = &update.body {
            sets.push("body", body.clone());
        }
        if let Some(attributes) = &update.attributes {
            sets.push("attributes", json_text(attributes.as_ref())?);
        }
        if let Some(vault_id) = update.vault_id {
            sets.push("vault_id", vault_id);
        }
        sets.push_raw("updated_at = MAX(?, updated_at + 1)", now_micros());

        let entry = self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(sql_err)?;
            ensure_node(&tx, NodeType::Entry, id)?;
            if let Some(vault_id) = update.vault_id {
                ensure_node(&tx, NodeType::Vault, vault_id)?;
            }

            sets.apply(&tx, "entries", id)
                .map_err(|e| DaxError::Storage(format!("Failed to update entry: {}", e)))?;

            let entry = select_entry(&tx, id)?.ok_or_else(|| DaxError::not_found("Entry", id))?;
            tx.commit().map_err(sql_err)?;
            Ok(entry)
        })?;

        debug!(entry_id = id, "Entry updated");
        Ok(entry)
    }

    /// Delete an entry.
    pub fn delete(&self, id: i64) -> Result<(), DaxError> {
        self.db.with_conn(|conn| {
            let affected = conn
                .execute("DELETE FROM entries WHERE id = ?1", rusqlite::params![id])
                .map_err(|e| DaxError::Storage(format!("Failed to delete entry: {}", e)))?;
            if affected == 0 {
                return Err(DaxError::not_found("Entry", id));
            }
            Ok(())
        })?;
        debug!(entry_id = id, "Entry deleted");
        Ok(())
    }
}

// ============================================================================
// SQL building helpers.
// ============================================================================

/// WHERE-clause accumulator with positional `?` parameters.
#[derive(Default)]
struct Conditions {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Conditions {
    fn push(&mut self, clause: &str, value: impl ToSql + 'static) {
        self.clauses.push(clause.to_string());
        self.params.push(Box::new(value));
    }

    fn push_raw(&mut self, clause: &str) {
        self.clauses.push(clause.to_string());
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    fn param_refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// SET-clause accumulator for partial updates.
#[derive(Default)]
struct Assignments {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Assignments {
    fn push(&mut self, column: &str, value: impl ToSql + 'static) {
        self.clauses.push(format!("{} = ?", column));
        self.params.push(Box::new(value));
    }

    fn push_raw(&mut self, clause: &str, value: impl ToSql + 'static) {
        self.clauses.push(clause.to_string());
        self.params.push(Box::new(value));
    }

    /// Run the UPDATE against row `id`. No-op when nothing is assigned.
    fn apply(&self, conn: &Connection, table: &str, id: i64) -> rusqlite::Result<usize> {
        if self.clauses.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            table,
            self.clauses.join(", ")
        );
        let mut params: Vec<&dyn ToSql> = self.params.iter().map(|p| p.as_ref()).collect();
        params.push(&id);
        conn.execute(&sql, params.as_slice())
    }
}

fn select_page<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    conditions: &Conditions,
    order_by: &str,
    window: impl FnOnce(u64) -> PageRequest,
    map_row: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Page<T>, DaxError> {
    let where_sql = conditions.where_sql();
    let refs = conditions.param_refs();

    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM {}{}", table, where_sql),
            refs.as_slice(),
            |row| row.get(0),
        )
        .map_err(|e| DaxError::Storage(format!("Count query on {}: {}", table, e)))?;
    let total = total.max(0) as u64;
    let page = window(total);

    let limit = i64::try_from(page.limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(page.offset).unwrap_or(i64::MAX);
    let mut page_refs = refs;
    page_refs.push(&limit);
    page_refs.push(&offset);

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM {}{} ORDER BY {} LIMIT ? OFFSET ?",
            columns, table, where_sql, order_by
        ))
        .map_err(|e| DaxError::Storage(format!("List query prepare on {}: {}", table, e)))?;
    let items = stmt
        .query_map(page_refs.as_slice(), map_row)
        .map_err(|e| DaxError::Storage(format!("List query on {}: {}", table, e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sql_err)?;

    Ok(Page { items, total })
}

fn count_table(conn: &Connection, table: &str) -> Result<u64, DaxError> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .map_err(sql_err)?;
    Ok(count.max(0) as u64)
}

/// Fail with `NotFound` unless `id` belongs to `node_type` and exists.
fn ensure_node(conn: &Connection, node_type: NodeType, id: i64) -> Result<(), DaxError> {
    if NodeType::from_id(id) != Some(node_type) {
        return Err(DaxError::not_found(node_type.name(), id));
    }
    let exists: bool = conn
        .query_row(
            &format!(
                "SELECT EXISTS (SELECT 1 FROM {} WHERE id = ?1)",
                node_type.table()
            ),
            rusqlite::params![id],
            |row| row.get(0),
        )
        .map_err(sql_err)?;
    if exists {
        Ok(())
    } else {
        Err(DaxError::not_found(node_type.name(), id))
    }
}

fn link(conn: &Connection, user_id: i64, vault_id: i64) -> Result<(), DaxError> {
    conn.execute(
        "INSERT OR IGNORE INTO user_vaults (user_id, vault_id) VALUES (?1, ?2)",
        rusqlite::params![user_id, vault_id],
    )
    .map_err(|e| DaxError::Storage(format!("Failed to link user and vault: {}", e)))?;
    Ok(())
}

fn unlink(conn: &Connection, user_id: i64, vault_id: i64) -> Result<(), DaxError> {
    conn.execute(
        "DELETE FROM user_vaults WHERE user_id = ?1 AND vault_id = ?2",
        rusqlite::params![user_id, vault_id],
    )
    .map_err(|e| DaxError::Storage(format!("Failed to unlink user and vault: {}", e)))?;
    Ok(())
}

/// `%needle%` with LIKE wildcards escaped (use with `ESCAPE '\'`).
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Quote a needle as a single FTS5 phrase.
fn fts_phrase(needle: &str) -> String {
    format!("\"{}\"", needle.replace('"', "\"\""))
}

// ============================================================================
// Row conversion.
// ============================================================================

fn select_user(conn: &Connection, id: i64) -> Result<Option<User>, DaxError> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        rusqlite::params![id],
        row_to_user,
    )
    .optional()
    .map_err(sql_err)
}

fn select_vault(conn: &Connection, id: i64) -> Result<Option<Vault>, DaxError> {
    conn.query_row(
        &format!("SELECT {} FROM vaults WHERE id = ?1", VAULT_COLUMNS),
        rusqlite::params![id],
        row_to_vault,
    )
    .optional()
    .map_err(sql_err)
}

pub(crate) fn select_entry(conn: &Connection, id: i64) -> Result<Option<Entry>, DaxError> {
    conn.query_row(
        &format!("SELECT {} FROM entries WHERE id = ?1", ENTRY_COLUMNS),
        rusqlite::params![id],
        row_to_entry,
    )
    .optional()
    .map_err(sql_err)
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        hash: row.get(2)?,
        settings: json_column(row, 3)?,
        created_at: time_column(row, 4)?,
        active_at: time_column(row, 5)?,
    })
}

fn row_to_vault(row: &Row<'_>) -> rusqlite::Result<Vault> {
    Ok(Vault {
        id: row.get(0)?,
        name: row.get(1)?,
        settings: json_column(row, 2)?,
        created_at: time_column(row, 3)?,
    })
}

/// Entry row in `ENTRY_COLUMNS` order, starting at column `offset`.
pub(crate) fn row_to_entry_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(offset)?,
        vault_id: row.get(offset + 1)?,
        heading: row.get(offset + 2)?,
        body: row.get(offset + 3)?,
        attributes: json_column(row, offset + 4)?,
        created_at: time_column(row, offset + 5)?,
        updated_at: time_column(row, offset + 6)?,
    })
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<Entry> {
    row_to_entry_at(row, 0)
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        serde_json::from_str(&t).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    })
    .transpose()
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let micros: i64 = row.get(idx)?;
    DateTime::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, micros))
}

fn json_text<T: Serialize>(value: Option<&T>) -> Result<Option<String>, DaxError> {
    value
        .map(serde_json::to_string)
        .transpose()
        .map_err(DaxError::from)
}

fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

pub(crate) fn sql_err(e: rusqlite::Error) -> DaxError {
    DaxError::Storage(e.to_string())
}

/// Map a write failure, turning UNIQUE violations into `Conflict`.
fn write_err(field: &str, value: &str, e: rusqlite::Error) -> DaxError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            DaxError::Conflict(format!("{} '{}' is already taken", field, value))
        }
        _ => DaxError::Storage(e.to_string()),
    }
}

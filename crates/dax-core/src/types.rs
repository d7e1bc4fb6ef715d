use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DaxError, Result};

/// Free-form JSON object used for user settings and entry attributes.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Vault settings are a flat string-to-string map.
pub type VaultSettings = BTreeMap<String, String>;

/// Maximum length (in characters) of usernames, vault names and headings.
pub const MAX_NAME_LEN: usize = 255;

// =============================================================================
// Global node ids
// =============================================================================

/// Entity type of a node.
///
/// Ids are unique across all entity tables: every type owns a 2^32-wide
/// range starting at `type_index << 32`, so the type of any id can be
/// recovered without touching the database.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    User,
    Vault,
    Entry,
}

impl NodeType {
    /// All node types in type-index order.
    pub const ALL: [NodeType; 3] = [NodeType::User, NodeType::Vault, NodeType::Entry];

    /// Width of each type's id range, in bits.
    pub const ID_RANGE_BITS: u32 = 32;

    /// Position of this type in the `node_types` table.
    pub fn type_index(self) -> i64 {
        match self {
            NodeType::User => 0,
            NodeType::Vault => 1,
            NodeType::Entry => 2,
        }
    }

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            NodeType::User => "users",
            NodeType::Vault => "vaults",
            NodeType::Entry => "entries",
        }
    }

    /// Display name, matching the GraphQL type name.
    pub fn name(self) -> &'static str {
        match self {
            NodeType::User => "User",
            NodeType::Vault => "Vault",
            NodeType::Entry => "Entry",
        }
    }

    /// First value of this type's id range (exclusive; ids start one above).
    pub fn id_range_start(self) -> i64 {
        self.type_index() << Self::ID_RANGE_BITS
    }

    /// Resolve the node type that owns `id`.
    pub fn from_id(id: i64) -> Option<Self> {
        if id <= 0 {
            return None;
        }
        let index = id >> Self::ID_RANGE_BITS;
        Self::ALL.into_iter().find(|t| t.type_index() == index)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A registered user.
///
/// `hash` holds the Argon2 PHC string. It never leaves the process: it is
/// skipped by serde and redacted from `Debug` output.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub hash: String,
    pub settings: Option<JsonMap>,
    pub created_at: DateTime<Utc>,
    pub active_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("hash", &"<sensitive>")
            .field("settings", &self.settings)
            .field("created_at", &self.created_at)
            .field("active_at", &self.active_at)
            .finish()
    }
}

/// A named collection of entries shared by one or more users.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub id: i64,
    pub name: String,
    pub settings: Option<VaultSettings>,
    pub created_at: DateTime<Utc>,
}

/// A single note inside a vault.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub vault_id: i64,
    pub heading: Option<String>,
    pub body: Option<String>,
    pub attributes: Option<JsonMap>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Create / update payloads
// =============================================================================

/// Payload for creating a user. `hash` must already be a password hash.
#[derive(Clone, Debug, Default)]
pub struct NewUser {
    pub username: String,
    pub hash: String,
    pub settings: Option<JsonMap>,
    pub vault_ids: Vec<i64>,
}

/// Partial update of a user.
///
/// Clearable fields use `Option<Option<T>>`: `None` keeps the current value,
/// `Some(None)` clears it, `Some(Some(v))` sets it.
#[derive(Clone, Debug, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub hash: Option<String>,
    pub settings: Option<Option<JsonMap>>,
    pub active_at: Option<DateTime<Utc>>,
    pub add_vault_ids: Vec<i64>,
    pub remove_vault_ids: Vec<i64>,
    pub clear_vaults: bool,
}

#[derive(Clone, Debug, Default)]
pub struct NewVault {
    pub name: String,
    pub settings: Option<VaultSettings>,
    pub user_ids: Vec<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct VaultUpdate {
    pub name: Option<String>,
    pub settings: Option<Option<VaultSettings>>,
    pub add_user_ids: Vec<i64>,
    pub remove_user_ids: Vec<i64>,
    pub clear_users: bool,
}

#[derive(Clone, Debug, Default)]
pub struct NewEntry {
    pub vault_id: i64,
    pub heading: Option<String>,
    pub body: Option<String>,
    pub attributes: Option<JsonMap>,
}

/// Partial update of an entry. Any update refreshes `updated_at`, even an
/// empty one.
#[derive(Clone, Debug, Default)]
pub struct EntryUpdate {
    pub vault_id: Option<i64>,
    pub heading: Option<Option<String>>,
    pub body: Option<Option<String>>,
    pub attributes: Option<Option<JsonMap>>,
}

// =============================================================================
// Filters, ordering, pagination
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct UserFilter {
    pub username: Option<String>,
    pub username_contains: Option<String>,
    pub vault_id: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct VaultFilter {
    pub name: Option<String>,
    pub name_contains: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct EntryFilter {
    pub vault_id: Option<i64>,
    pub heading_contains: Option<String>,
    pub body_contains: Option<String>,
    pub has_heading: Option<bool>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub updated_after: Option<DateTime<Utc>>,
    pub updated_before: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrderField {
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl EntryOrderField {
    pub fn column(self) -> &'static str {
        match self {
            EntryOrderField::CreatedAt => "created_at",
            EntryOrderField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

impl OrderDirection {
    pub fn sql(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Entry ordering. Defaults to most recently updated first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryOrder {
    pub field: EntryOrderField,
    pub direction: OrderDirection,
}

/// Offset-based page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// The first `limit` rows.
    pub fn first(limit: u64) -> Self {
        Self { offset: 0, limit }
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Trim and validate a unique display name (username or vault name).
pub fn validate_name(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DaxError::Validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(DaxError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate an entry heading. Headings are optional and may be empty.
pub fn validate_heading(heading: &str) -> Result<()> {
    if heading.chars().count() > MAX_NAME_LEN {
        return Err(DaxError::Validation(format!(
            "heading must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// Convert a JSON object into vault settings. Every value must be a string.
pub fn vault_settings_from_json(map: JsonMap) -> Result<VaultSettings> {
    map.into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => Ok((key, s)),
            other => Err(DaxError::Validation(format!(
                "vault setting '{}' must be a string, got {}",
                key, other
            ))),
        })
        .collect()
}

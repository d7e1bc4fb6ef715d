//! GraphQL input objects and their conversion into storage payloads.
//!
//! Update inputs follow the entgql shape: a value sets a field, `clearX`
//! nulls it (a value wins when both are given), and `addXIDs` /
//! `removeXIDs` / `clearXs` edit edges.

use async_graphql::{Enum, InputObject, Json, ID};
use chrono::{DateTime, Utc};

use dax_core::error::DaxError;
use dax_core::types::{
    self, vault_settings_from_json, EntryFilter, EntryOrder, EntryUpdate, JsonMap, NewEntry,
    NewVault, UserFilter, UserUpdate, VaultFilter, VaultUpdate,
};

use super::types::parse_id;

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(remote = "dax_core::types::OrderDirection")]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(remote = "dax_core::types::EntryOrderField")]
pub enum EntryOrderField {
    CreatedAt,
    UpdatedAt,
}

/// Ordering for entry connections. Defaults to `UPDATED_AT DESC`.
#[derive(InputObject, Debug)]
#[graphql(name = "EntryOrder")]
pub struct EntryOrderInput {
    pub direction: Option<OrderDirection>,
    pub field: EntryOrderField,
}

impl From<EntryOrderInput> for EntryOrder {
    fn from(input: EntryOrderInput) -> Self {
        EntryOrder {
            field: input.field.into(),
            direction: input.direction.map(Into::into).unwrap_or_default(),
        }
    }
}

fn parse_ids(ids: Option<Vec<ID>>) -> Result<Vec<i64>, DaxError> {
    ids.unwrap_or_default().iter().map(parse_id).collect()
}

/// Set wins over clear; `None` leaves the field untouched.
fn set_or_clear<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    match (value, clear) {
        (Some(v), _) => Some(Some(v)),
        (None, true) => Some(None),
        (None, false) => None,
    }
}

// =============================================================================
// Filters
// =============================================================================

#[derive(InputObject, Default, Debug)]
pub struct UserWhereInput {
    pub username: Option<String>,
    pub username_contains: Option<String>,
    /// Only members of this vault.
    #[graphql(name = "hasVaultWith")]
    pub vault_id: Option<ID>,
}

impl UserWhereInput {
    pub fn into_filter(self) -> Result<UserFilter, DaxError> {
        Ok(UserFilter {
            username: self.username,
            username_contains: self.username_contains,
            vault_id: self.vault_id.as_ref().map(parse_id).transpose()?,
        })
    }
}

#[derive(InputObject, Default, Debug)]
pub struct VaultWhereInput {
    pub name: Option<String>,
    pub name_contains: Option<String>,
    /// Only vaults this user belongs to.
    #[graphql(name = "hasUserWith")]
    pub user_id: Option<ID>,
}

impl VaultWhereInput {
    pub fn into_filter(self) -> Result<VaultFilter, DaxError> {
        Ok(VaultFilter {
            name: self.name,
            name_contains: self.name_contains,
            user_id: self.user_id.as_ref().map(parse_id).transpose()?,
        })
    }
}

#[derive(InputObject, Default, Debug)]
pub struct EntryWhereInput {
    #[graphql(name = "vaultID")]
    pub vault_id: Option<ID>,
    pub heading_contains: Option<String>,
    pub body_contains: Option<String>,
    pub has_heading: Option<bool>,
    #[graphql(name = "createdAtGTE")]
    pub created_at_gte: Option<DateTime<Utc>>,
    #[graphql(name = "createdAtLT")]
    pub created_at_lt: Option<DateTime<Utc>>,
    #[graphql(name = "updatedAtGTE")]
    pub updated_at_gte: Option<DateTime<Utc>>,
    #[graphql(name = "updatedAtLT")]
    pub updated_at_lt: Option<DateTime<Utc>>,
}

impl EntryWhereInput {
    pub fn into_filter(self) -> Result<EntryFilter, DaxError> {
        Ok(EntryFilter {
            vault_id: self.vault_id.as_ref().map(parse_id).transpose()?,
            heading_contains: self.heading_contains,
            body_contains: self.body_contains,
            has_heading: self.has_heading,
            created_after: self.created_at_gte,
            created_before: self.created_at_lt,
            updated_after: self.updated_at_gte,
            updated_before: self.updated_at_lt,
        })
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(InputObject, Debug)]
pub struct CreateUserInput {
    pub username: String,
    /// Plain-text password; only its Argon2 hash is stored.
    #[graphql(secret)]
    pub password: String,
    pub settings: Option<Json<JsonMap>>,
    #[graphql(name = "vaultIDs")]
    pub vault_ids: Option<Vec<ID>>,
}

impl CreateUserInput {
    /// Payload with the password already hashed.
    pub fn into_new_user(self, hash: String) -> Result<types::NewUser, DaxError> {
        Ok(types::NewUser {
            username: self.username,
            hash,
            settings: self.settings.map(|j| j.0),
            vault_ids: parse_ids(self.vault_ids)?,
        })
    }
}

#[derive(InputObject, Default, Debug)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    #[graphql(secret)]
    pub password: Option<String>,
    pub settings: Option<Json<JsonMap>>,
    #[graphql(default)]
    pub clear_settings: bool,
    pub active_at: Option<DateTime<Utc>>,
    #[graphql(name = "addVaultIDs")]
    pub add_vault_ids: Option<Vec<ID>>,
    #[graphql(name = "removeVaultIDs")]
    pub remove_vault_ids: Option<Vec<ID>>,
    #[graphql(default)]
    pub clear_vaults: bool,
}

impl UpdateUserInput {
    pub fn into_update(self, hash: Option<String>) -> Result<UserUpdate, DaxError> {
        Ok(UserUpdate {
            username: self.username,
            hash,
            settings: set_or_clear(self.settings.map(|j| j.0), self.clear_settings),
            active_at: self.active_at,
            add_vault_ids: parse_ids(self.add_vault_ids)?,
            remove_vault_ids: parse_ids(self.remove_vault_ids)?,
            clear_vaults: self.clear_vaults,
        })
    }
}

// =============================================================================
// Vaults
// =============================================================================

#[derive(InputObject, Debug)]
pub struct CreateVaultInput {
    pub name: String,
    /// String-valued settings.
    pub settings: Option<Json<JsonMap>>,
    #[graphql(name = "userIDs")]
    pub user_ids: Option<Vec<ID>>,
}

impl CreateVaultInput {
    pub fn into_new_vault(self) -> Result<NewVault, DaxError> {
        Ok(NewVault {
            name: self.name,
            settings: self.settings.map(|j| vault_settings_from_json(j.0)).transpose()?,
            user_ids: parse_ids(self.user_ids)?,
        })
    }
}

#[derive(InputObject, Default, Debug)]
pub struct UpdateVaultInput {
    pub name: Option<String>,
    pub settings: Option<Json<JsonMap>>,
    #[graphql(default)]
    pub clear_settings: bool,
    #[graphql(name = "addUserIDs")]
    pub add_user_ids: Option<Vec<ID>>,
    #[graphql(name = "removeUserIDs")]
    pub remove_user_ids: Option<Vec<ID>>,
    #[graphql(default)]
    pub clear_users: bool,
}

impl UpdateVaultInput {
    pub fn into_update(self) -> Result<VaultUpdate, DaxError> {
        let settings = self
            .settings
            .map(|j| vault_settings_from_json(j.0))
            .transpose()?;
        Ok(VaultUpdate {
            name: self.name,
            settings: set_or_clear(settings, self.clear_settings),
            add_user_ids: parse_ids(self.add_user_ids)?,
            remove_user_ids: parse_ids(self.remove_user_ids)?,
            clear_users: self.clear_users,
        })
    }
}

// =============================================================================
// Entries
// =============================================================================

#[derive(InputObject, Debug)]
pub struct CreateEntryInput {
    #[graphql(name = "vaultID")]
    pub vault_id: ID,
    pub heading: Option<String>,
    pub body: Option<String>,
    pub attributes: Option<Json<JsonMap>>,
}

impl CreateEntryInput {
    pub fn into_new_entry(self) -> Result<NewEntry, DaxError> {
        Ok(NewEntry {
            vault_id: parse_id(&self.vault_id)?,
            heading: self.heading,
            body: self.body,
            attributes: self.attributes.map(|j| j.0),
        })
    }
}

#[derive(InputObject, Default, Debug)]
pub struct UpdateEntryInput {
    /// Move the entry to another vault.
    #[graphql(name = "vaultID")]
    pub vault_id: Option<ID>,
    pub heading: Option<String>,
    #[graphql(default)]
    pub clear_heading: bool,
    pub body: Option<String>,
    #[graphql(default)]
    pub clear_body: bool,
    pub attributes: Option<Json<JsonMap>>,
    #[graphql(default)]
    pub clear_attributes: bool,
}

impl UpdateEntryInput {
    pub fn into_update(self) -> Result<EntryUpdate, DaxError> {
        Ok(EntryUpdate {
            vault_id: self.vault_id.as_ref().map(parse_id).transpose()?,
            heading: set_or_clear(self.heading, self.clear_heading),
            body: set_or_clear(self.body, self.clear_body),
            attributes: set_or_clear(self.attributes.map(|j| j.0), self.clear_attributes),
        })
    }
}

use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions, Object, ID};
use tracing::info;

use dax_core::password;
use dax_storage::{EntryRepository, UserRepository, VaultRepository};

use super::inputs::{
    CreateEntryInput, CreateUserInput, CreateVaultInput, UpdateEntryInput, UpdateUserInput,
    UpdateVaultInput,
};
use super::types::{database, node_id, parse_id, EntryObject, UserObject, VaultObject};
use crate::error::{ApiError, GqlResultExt};

/// Run a CPU-bound storage call off the async workers.
async fn blocking<T, F>(f: F) -> async_graphql::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, dax_core::DaxError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {}", e)).extend())?
        .gql()
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        input: CreateUserInput,
    ) -> async_graphql::Result<UserObject> {
        let plain = input.password.clone();
        let hash = blocking(move || password::hash_password(&plain)).await?;
        let new = input.into_new_user(hash).gql()?;

        let user = UserRepository::new(Arc::clone(database(ctx)?))
            .create(&new)
            .gql()?;
        info!(user_id = user.id, "User created via API");
        Ok(UserObject(user))
    }

    async fn update_user(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: UpdateUserInput,
    ) -> async_graphql::Result<UserObject> {
        let id = parse_id(&id).gql()?;
        let hash = match input.password.clone() {
            Some(plain) => Some(blocking(move || password::hash_password(&plain)).await?),
            None => None,
        };
        let update = input.into_update(hash).gql()?;

        UserRepository::new(Arc::clone(database(ctx)?))
            .update(id, &update)
            .map(UserObject)
            .gql()
    }

    async fn delete_user(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ID> {
        let raw = parse_id(&id).gql()?;
        UserRepository::new(Arc::clone(database(ctx)?))
            .delete(raw)
            .gql()?;
        info!(user_id = raw, "User deleted via API");
        Ok(node_id(raw))
    }

    /// Check a username/password pair. Returns the user with a refreshed
    /// `activeAt`.
    async fn sign_in(
        &self,
        ctx: &Context<'_>,
        username: String,
        #[graphql(secret)] password: String,
    ) -> async_graphql::Result<UserObject> {
        let repo = UserRepository::new(Arc::clone(database(ctx)?));
        let user = blocking(move || repo.authenticate(&username, &password)).await?;
        Ok(UserObject(user))
    }

    async fn create_vault(
        &self,
        ctx: &Context<'_>,
        input: CreateVaultInput,
    ) -> async_graphql::Result<VaultObject> {
        let new = input.into_new_vault().gql()?;
        let vault = VaultRepository::new(Arc::clone(database(ctx)?))
            .create(&new)
            .gql()?;
        info!(vault_id = vault.id, "Vault created via API");
        Ok(VaultObject(vault))
    }

    async fn update_vault(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: UpdateVaultInput,
    ) -> async_graphql::Result<VaultObject> {
        let id = parse_id(&id).gql()?;
        let update = input.into_update().gql()?;
        VaultRepository::new(Arc::clone(database(ctx)?))
            .update(id, &update)
            .map(VaultObject)
            .gql()
    }

    /// Delete a vault and every entry in it.
    async fn delete_vault(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ID> {
        let raw = parse_id(&id).gql()?;
        VaultRepository::new(Arc::clone(database(ctx)?))
            .delete(raw)
            .gql()?;
        info!(vault_id = raw, "Vault deleted via API");
        Ok(node_id(raw))
    }

    async fn create_entry(
        &self,
        ctx: &Context<'_>,
        input: CreateEntryInput,
    ) -> async_graphql::Result<EntryObject> {
        let new = input.into_new_entry().gql()?;
        EntryRepository::new(Arc::clone(database(ctx)?))
            .create(&new)
            .map(EntryObject)
            .gql()
    }

    async fn update_entry(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: UpdateEntryInput,
    ) -> async_graphql::Result<EntryObject> {
        let id = parse_id(&id).gql()?;
        let update = input.into_update().gql()?;
        EntryRepository::new(Arc::clone(database(ctx)?))
            .update(id, &update)
            .map(EntryObject)
            .gql()
    }

    async fn delete_entry(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ID> {
        let raw = parse_id(&id).gql()?;
        EntryRepository::new(Arc::clone(database(ctx)?))
            .delete(raw)
            .gql()?;
        Ok(node_id(raw))
    }
}

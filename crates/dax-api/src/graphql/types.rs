//! GraphQL object types wrapping the storage entities.

use std::sync::Arc;

use async_graphql::{Context, Json, Object, SimpleObject, Union, ID};
use chrono::{DateTime, Utc};

use dax_core::config::SearchConfig;
use dax_core::error::DaxError;
use dax_core::types::{Entry, EntryFilter, EntryOrder, JsonMap, NodeType, User, Vault, VaultSettings};
use dax_storage::{Database, EntryRepository, UserRepository, VaultRepository};

use super::inputs::{EntryOrderInput, EntryWhereInput};
use super::pagination::{paginate, DaxConnection};
use crate::error::GqlResultExt;

pub(crate) fn database<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Arc<Database>> {
    ctx.data::<Arc<Database>>()
}

pub(crate) fn search_config<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a SearchConfig> {
    ctx.data::<SearchConfig>()
}

pub(crate) fn node_id(id: i64) -> ID {
    ID(id.to_string())
}

/// Parse a global node id.
pub(crate) fn parse_id(id: &ID) -> Result<i64, DaxError> {
    id.0.trim()
        .parse::<i64>()
        .map_err(|_| DaxError::Validation(format!("invalid id: {}", id.0)))
}

/// Any object addressable by its global id.
#[derive(Union)]
pub enum Node {
    User(UserObject),
    Vault(VaultObject),
    Entry(EntryObject),
}

impl Node {
    /// Load whatever node `id` points at. Unknown ids resolve to `None`.
    pub(crate) fn load(db: &Arc<Database>, id: i64) -> Result<Option<Node>, DaxError> {
        let db = Arc::clone(db);
        Ok(match NodeType::from_id(id) {
            Some(NodeType::User) => UserRepository::new(db)
                .find_by_id(id)?
                .map(|u| Node::User(UserObject(u))),
            Some(NodeType::Vault) => VaultRepository::new(db)
                .find_by_id(id)?
                .map(|v| Node::Vault(VaultObject(v))),
            Some(NodeType::Entry) => EntryRepository::new(db)
                .find_by_id(id)?
                .map(|e| Node::Entry(EntryObject(e))),
            None => None,
        })
    }
}

pub struct UserObject(pub User);

#[Object(name = "User")]
impl UserObject {
    async fn id(&self) -> ID {
        node_id(self.0.id)
    }

    async fn username(&self) -> &str {
        &self.0.username
    }

    async fn settings(&self) -> Option<Json<JsonMap>> {
        self.0.settings.clone().map(Json)
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn active_at(&self) -> DateTime<Utc> {
        self.0.active_at
    }

    async fn vaults(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<VaultObject>> {
        let db = database(ctx)?;
        let vaults = UserRepository::new(Arc::clone(db))
            .vaults_of(self.0.id)
            .gql()?;
        Ok(vaults.into_iter().map(VaultObject).collect())
    }
}

pub struct VaultObject(pub Vault);

#[Object(name = "Vault")]
impl VaultObject {
    async fn id(&self) -> ID {
        node_id(self.0.id)
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn settings(&self) -> Option<Json<VaultSettings>> {
        self.0.settings.clone().map(Json)
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn users(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<UserObject>> {
        let db = database(ctx)?;
        let users = VaultRepository::new(Arc::clone(db))
            .users_of(self.0.id)
            .gql()?;
        Ok(users.into_iter().map(UserObject).collect())
    }

    #[allow(clippy::too_many_arguments)]
    async fn entries(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        first: Option<i32>,
        before: Option<String>,
        last: Option<i32>,
        order_by: Option<EntryOrderInput>,
        #[graphql(name = "where")] filter: Option<EntryWhereInput>,
    ) -> async_graphql::Result<DaxConnection<EntryObject>> {
        let mut filter = filter.unwrap_or_default().into_filter().gql()?;
        filter.vault_id = Some(self.0.id);
        entries_connection(ctx, filter, order_by, after, before, first, last).await
    }
}

pub struct EntryObject(pub Entry);

#[Object(name = "Entry")]
impl EntryObject {
    async fn id(&self) -> ID {
        node_id(self.0.id)
    }

    async fn heading(&self) -> Option<&str> {
        self.0.heading.as_deref()
    }

    async fn body(&self) -> Option<&str> {
        self.0.body.as_deref()
    }

    async fn attributes(&self) -> Option<Json<JsonMap>> {
        self.0.attributes.clone().map(Json)
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }

    async fn vault(&self, ctx: &Context<'_>) -> async_graphql::Result<VaultObject> {
        let db = database(ctx)?;
        VaultRepository::new(Arc::clone(db))
            .get(self.0.vault_id)
            .map(VaultObject)
            .gql()
    }
}

/// A heading search result.
#[derive(SimpleObject)]
pub struct EntrySearchHit {
    pub entry: EntryObject,
    /// Trigram similarity between the heading and the query, in `[0, 1]`.
    pub score: f64,
}

/// Relay connection over entries, shared by `Query.entries` and
/// `Vault.entries`.
pub(crate) async fn entries_connection(
    ctx: &Context<'_>,
    filter: EntryFilter,
    order_by: Option<EntryOrderInput>,
    after: Option<String>,
    before: Option<String>,
    first: Option<i32>,
    last: Option<i32>,
) -> async_graphql::Result<DaxConnection<EntryObject>> {
    let repo = EntryRepository::new(Arc::clone(database(ctx)?));
    let order: EntryOrder = order_by.map(Into::into).unwrap_or_default();

    paginate(after, before, first, last, search_config(ctx)?, |window| {
        repo.list_window(&filter, order, window)
            .map(|p| p.map(EntryObject))
    })
    .await
}

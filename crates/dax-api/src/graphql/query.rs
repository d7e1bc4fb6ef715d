use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions, Object, ID};

use dax_storage::{HeadingSearch, SearchOptions, UserRepository, VaultRepository};

use super::inputs::{EntryOrderInput, EntryWhereInput, UserWhereInput, VaultWhereInput};
use super::pagination::{paginate, DaxConnection};
use super::types::{
    database, entries_connection, parse_id, search_config, EntryObject, EntrySearchHit, Node,
    UserObject, VaultObject,
};
use crate::error::{ApiError, GqlResultExt};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Fetch any object by its global id.
    async fn node(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<Node>> {
        let id = parse_id(&id).gql()?;
        Node::load(database(ctx)?, id).gql()
    }

    /// Fetch several objects by global id, preserving order.
    async fn nodes(
        &self,
        ctx: &Context<'_>,
        ids: Vec<ID>,
    ) -> async_graphql::Result<Vec<Option<Node>>> {
        let db = database(ctx)?;
        ids.iter()
            .map(|id| {
                let id = parse_id(id).gql()?;
                Node::load(db, id).gql()
            })
            .collect()
    }

    async fn users(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        first: Option<i32>,
        before: Option<String>,
        last: Option<i32>,
        #[graphql(name = "where")] filter: Option<UserWhereInput>,
    ) -> async_graphql::Result<DaxConnection<UserObject>> {
        let filter = filter.unwrap_or_default().into_filter().gql()?;
        let repo = UserRepository::new(Arc::clone(database(ctx)?));

        paginate(after, before, first, last, search_config(ctx)?, |window| {
            repo.list_window(&filter, window).map(|p| p.map(UserObject))
        })
        .await
    }

    async fn vaults(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        first: Option<i32>,
        before: Option<String>,
        last: Option<i32>,
        #[graphql(name = "where")] filter: Option<VaultWhereInput>,
    ) -> async_graphql::Result<DaxConnection<VaultObject>> {
        let filter = filter.unwrap_or_default().into_filter().gql()?;
        let repo = VaultRepository::new(Arc::clone(database(ctx)?));

        paginate(after, before, first, last, search_config(ctx)?, |window| {
            repo.list_window(&filter, window).map(|p| p.map(VaultObject))
        })
        .await
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
        let filter = filter.unwrap_or_default().into_filter().gql()?;
        entries_connection(ctx, filter, order_by, after, before, first, last).await
    }

    /// Entries whose heading is similar to `query`, best match first.
    ///
    /// `threshold` defaults to `search.similarity_threshold` and `limit` to
    /// `search.default_limit`.
    async fn search_entries(
        &self,
        ctx: &Context<'_>,
        query: String,
        #[graphql(name = "vaultID")] vault_id: Option<ID>,
        threshold: Option<f64>,
        limit: Option<i32>,
    ) -> async_graphql::Result<Vec<EntrySearchHit>> {
        let config = search_config(ctx)?;
        let threshold = threshold.unwrap_or(config.similarity_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ApiError::BadRequest(format!(
                "threshold must be between 0 and 1, got {}",
                threshold
            ))
            .extend());
        }

        let options = SearchOptions {
            threshold,
            vault_id: vault_id.as_ref().map(parse_id).transpose().gql()?,
            limit: config.clamp_limit(limit.map(|l| l.max(0) as u64)),
        };

        let hits = HeadingSearch::new(Arc::clone(database(ctx)?))
            .search(&query, &options)
            .gql()?;

        Ok(hits
            .into_iter()
            .map(|hit| EntrySearchHit {
                entry: EntryObject(hit.entry),
                score: hit.score,
            })
            .collect())
    }
}

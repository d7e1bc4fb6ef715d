//! GraphQL schema: users, vaults and entries with Relay-style pagination.

mod inputs;
mod mutation;
mod pagination;
mod query;
mod types;

use std::sync::Arc;

use async_graphql::{EmptySubscription, Schema};

use dax_core::config::SearchConfig;
use dax_storage::Database;

pub use inputs::{
    CreateEntryInput, CreateUserInput, CreateVaultInput, EntryOrderField, EntryOrderInput,
    EntryWhereInput, OrderDirection, UpdateEntryInput, UpdateUserInput, UpdateVaultInput,
    UserWhereInput, VaultWhereInput,
};
pub use mutation::MutationRoot;
pub use pagination::{resolve_window, ConnectionTotals, DaxConnection};
pub use query::QueryRoot;
pub use types::{EntryObject, EntrySearchHit, Node, UserObject, VaultObject};

/// The executable schema.
pub type DaxSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

const MAX_QUERY_DEPTH: usize = 16;

/// Build the schema over `database`. `search` also bounds page sizes.
pub fn build_schema(database: Arc<Database>, search: SearchConfig) -> DaxSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(database)
        .data(search)
        .limit_depth(MAX_QUERY_DEPTH)
        .finish()
}

/// Schema definition language for the API.
pub fn sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}

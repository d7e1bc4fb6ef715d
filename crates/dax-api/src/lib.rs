//! Dax API crate - axum HTTP server exposing the GraphQL schema.
//!
//! Provides the `/query` GraphQL endpoint (bearer-token protected), the
//! GraphiQL playground, and a health check.

pub mod auth;
pub mod error;
pub mod graphql;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use graphql::{build_schema, sdl, DaxSchema};
pub use routes::{create_router, start_server};
pub use state::AppState;

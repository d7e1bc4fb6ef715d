//! Route handler functions for the HTTP endpoints.
//!
//! The GraphQL endpoint hands the request body to the schema; the other
//! handlers serve the playground page and a health summary.

use async_graphql::http::GraphiQLSource;
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};

use dax_storage::{EntryRepository, UserRepository, VaultRepository};

use crate::error::ApiError;
use crate::state::AppState;

/// GraphQL endpoint path.
pub const GRAPHQL_PATH: &str = "/query";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub schema_version: i64,
    pub users: u64,
    pub vaults: u64,
    pub entries: u64,
}

/// GET /health - liveness plus row counts.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let db = &state.database;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        schema_version: db.schema_version()?,
        users: UserRepository::new(db.clone()).count()?,
        vaults: VaultRepository::new(db.clone()).count()?,
        entries: EntryRepository::new(db.clone()).count()?,
    }))
}

/// GET / - GraphiQL playground, when enabled in `[server]`.
pub async fn playground(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    if !state.config.server.playground {
        return Err(ApiError::NotFound("playground is disabled".to_string()));
    }
    Ok(Html(
        GraphiQLSource::build()
            .endpoint(GRAPHQL_PATH)
            .title("Dax")
            .finish(),
    ))
}

/// POST /query - execute one GraphQL request.
pub async fn graphql(
    State(state): State<AppState>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let response = state.schema.execute(request).await;
    if response.is_err() {
        tracing::debug!(errors = response.errors.len(), "GraphQL request returned errors");
    }
    Json(response)
}

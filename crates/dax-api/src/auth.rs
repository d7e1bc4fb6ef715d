//! API authentication via bearer tokens.
//!
//! Provides token generation, persistence, and middleware for validating
//! `Authorization: Bearer <token>` headers on the GraphQL endpoint.

use std::path::Path;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rand::Rng;

use dax_core::config::DaxConfig;

use crate::error::ApiError;
use crate::state::AppState;

/// Generate a random 32-character hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

/// Load token from file, or generate and save a new one.
pub fn load_or_generate_token(token_path: &Path) -> String {
    if let Ok(contents) = std::fs::read_to_string(token_path) {
        let token = contents.trim().to_string();
        if !token.is_empty() {
            tracing::info!("API token loaded from {}", token_path.display());
            return token;
        }
    }

    let token = generate_token();

    if let Some(parent) = token_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = std::fs::write(token_path, &token) {
        tracing::warn!(error = %e, "Failed to save API token to {}", token_path.display());
    } else {
        // Owner-only access.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(token_path, std::fs::Permissions::from_mode(0o600));
        }
        tracing::info!("API token saved to {}", token_path.display());
    }

    token
}

/// The configured `server.api_token`, else the persisted or generated one.
///
/// A blank configured token counts as unset.
pub fn resolve_token(config: &DaxConfig) -> String {
    match config.server.api_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => {
            tracing::info!("Using API token from config");
            token.to_string()
        }
        _ => {
            let path = config.token_path();
            tracing::info!(path = %path.display(), "Using API token from file");
            load_or_generate_token(&path)
        }
    }
}

/// Middleware that validates Bearer token authentication.
///
/// Extracts the token from `Authorization: Bearer <token>` and compares
/// against `AppState.api_token`. Returns 401 if missing or invalid.
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let header = match req.headers().get(axum::http::header::AUTHORIZATION) {
        Some(value) => value,
        None => {
            return ApiError::Unauthorized("Missing Authorization header".to_string())
                .into_response()
        }
    };

    let value = match header.to_str() {
        Ok(s) => s,
        Err(_) => {
            return ApiError::Unauthorized("Invalid Authorization header encoding".to_string())
                .into_response()
        }
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if !state.api_token.is_empty() && token.trim() == state.api_token => {
            next.run(req).await
        }
        _ => {
            tracing::debug!("Rejected request with invalid bearer token");
            ApiError::Unauthorized("Invalid bearer token".to_string()).into_response()
        }
    }
}

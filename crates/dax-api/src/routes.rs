//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, the body
//! size limit, and bearer auth on the GraphQL endpoint.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use dax_core::config::DaxConfig;
use dax_core::error::DaxError;

use crate::handlers;
use crate::state::AppState;

/// Maximum request body size.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Origins allowed by CORS: the server's own port on localhost, plus the
/// next port up for a local dev frontend.
fn localhost_origins(port: u16) -> Vec<HeaderValue> {
    let dev_port = port.saturating_add(1);
    [port, dev_port]
        .iter()
        .flat_map(|p| {
            [
                format!("http://127.0.0.1:{}", p),
                format!("http://localhost:{}", p),
            ]
        })
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect()
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(localhost_origins(state.config.server.port)))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Routes that do NOT require authentication.
    let public_routes = Router::new()
        .route("/", get(handlers::playground))
        .route("/health", get(handlers::health));

    let protected_routes = Router::new()
        .route(handlers::GRAPHQL_PATH, post(handlers::graphql))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ));

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on `server.host:server.port` and run until Ctrl-C.
pub async fn start_server(config: &DaxConfig, state: AppState) -> Result<(), DaxError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DaxError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("GraphQL server listening on http://{}{}", addr, handlers::GRAPHQL_PATH);
    if config.server.playground {
        tracing::info!("Playground available at http://{}/", addr);
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DaxError::Api(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

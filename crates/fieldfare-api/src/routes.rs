//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, and the
//! scope-enforcement middleware on protected endpoints.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use fieldfare_core::config::FieldfareConfig;
use fieldfare_core::error::FieldfareError;

use crate::auth::SCOPE_HEADER;
use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
///
/// # Arguments
/// * `state` - The shared application state.
///
/// # Returns
/// A fully configured axum Router ready to serve requests.
pub fn create_router(state: AppState) -> Router {
    // CORS middleware: allow localhost origins for operational tooling.
    // Use the configured port (from CLI/env/config) plus port+1 for dev server.
    let port = state.config.general.port;
    let dev_port = port.saturating_add(1);
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            format!("http://127.0.0.1:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://localhost:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://127.0.0.1:{}", dev_port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://localhost:{}", dev_port)
                .parse::<HeaderValue>()
                .unwrap(),
        ]))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(SCOPE_HEADER),
        ]);

    // Routes that do NOT require a caller scope.
    let public_routes = Router::new().route("/health", get(handlers::health));

    // Scoped routes.
    let protected_routes = Router::new()
        .route("/search", post(handlers::search))
        .route("/ingest", post(handlers::ingest))
        .route_layer(axum::middleware::from_fn(crate::auth::require_scope));

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB global limit
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
///
/// Binds to 127.0.0.1 (localhost only) on the port from config.
pub async fn start_server(config: &FieldfareConfig, state: AppState) -> Result<(), FieldfareError> {
    let addr = format!("127.0.0.1:{}", config.general.port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FieldfareError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| FieldfareError::Api(format!("Server error: {}", e)))?;

    Ok(())
}

//! Fieldfare API crate - axum HTTP server, route handlers, scope middleware.
//!
//! Provides the REST API for the Fieldfare service: scoped similarity
//! search, trigger-batch ingestion, and health checks.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

//! Route handler functions for all API endpoints.
//!
//! Each handler extracts the request body via axum extractors, interacts
//! with AppState services, and returns JSON responses.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use fieldfare_ingest::{IngestOutcome, TriggerBatch};
use fieldfare_vector::KnnResponse;

use crate::auth::CallerScope;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request and response types
// =============================================================================

/// Request body for POST /search.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// The text to search for.
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub index_size: u64,
}

/// Response for POST /ingest: one outcome per trigger record, in order.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub outcomes: Vec<IngestOutcome>,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let uptime = state.start_time.elapsed().as_secs();
    let index_size = state
        .engine
        .index()
        .count(&state.config.index.name)
        .unwrap_or(0);

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: "0.1.0".to_string(),
        uptime_secs: uptime,
        index_size,
    }))
}

/// POST /search - scoped k-NN search over indexed documents.
///
/// The caller's scope restricts hits to documents whose scope attribute
/// equals it. Searching before the index exists returns the well-formed
/// empty response, not an error.
pub async fn search(
    State(state): State<AppState>,
    Extension(scope): Extension<CallerScope>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<KnnResponse>, ApiError> {
    if body.query.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "'query' must not be empty".to_string(),
        ));
    }

    let response = state.engine.search(&body.query, Some(&scope.0)).await?;
    Ok(Json(response))
}

/// POST /ingest - run a trigger batch through the ingestion pipeline.
///
/// Mirrors the storage-notification entry point for manual and operational
/// use. Always 200: per-record failures come back as outcomes, not as an
/// error status.
pub async fn ingest(
    State(state): State<AppState>,
    Json(batch): Json<TriggerBatch>,
) -> Json<IngestResponse> {
    let outcomes = state.pipeline.process_batch(&batch).await;
    Json(IngestResponse { outcomes })
}

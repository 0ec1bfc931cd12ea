//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use fieldfare_core::config::FieldfareConfig;
use fieldfare_ingest::DocumentPipeline;
use fieldfare_vector::QueryEngine;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. The
/// pipeline and engine share one `SimilarityIndex`, so documents ingested
/// through POST /ingest are immediately searchable.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<FieldfareConfig>,
    /// Query engine for scoped similarity search.
    pub engine: Arc<QueryEngine>,
    /// Document ingestion pipeline driven by POST /ingest.
    pub pipeline: Arc<DocumentPipeline>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with the given components.
    pub fn new(config: FieldfareConfig, engine: QueryEngine, pipeline: DocumentPipeline) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            pipeline: Arc::new(pipeline),
            start_time: Instant::now(),
        }
    }
}

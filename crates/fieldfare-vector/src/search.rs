//! Query engine combining query embedding with k-NN lookup.
//!
//! QueryEngine orchestrates the EmbeddingService (to embed queries) and
//! SimilarityIndex (to find the nearest documents), applying the caller's
//! scope as an exact-match filter.

use std::sync::Arc;

use fieldfare_core::config::{IndexConfig, SearchConfig};
use fieldfare_core::error::FieldfareError;

use crate::embedding::{DynEmbeddingService, EmbeddingService};
use crate::index::{KnnResponse, SimilarityIndex};

/// Query engine bound to one named index.
///
/// Uses dynamic dispatch (`Box<dyn DynEmbeddingService>`) so that production
/// code can supply `EndpointEmbedding` while tests use `MockEmbedding`. The
/// index name, result count, and scope attribute come from configuration
/// and stay fixed for the life of the engine.
pub struct QueryEngine {
    index: Arc<SimilarityIndex>,
    embedder: Box<dyn DynEmbeddingService>,
    index_name: String,
    k: usize,
    scope_attribute: String,
}

impl QueryEngine {
    /// Create a new query engine with a shared index and embedding service.
    pub fn new(
        index: Arc<SimilarityIndex>,
        embedder: impl EmbeddingService + 'static,
        index_config: &IndexConfig,
        search_config: &SearchConfig,
    ) -> Self {
        Self::new_dyn(index, Box::new(embedder), index_config, search_config)
    }

    /// Create a new query engine from a pre-boxed dynamic embedding service.
    pub fn new_dyn(
        index: Arc<SimilarityIndex>,
        embedder: Box<dyn DynEmbeddingService>,
        index_config: &IndexConfig,
        search_config: &SearchConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            index_name: index_config.name.clone(),
            k: search_config.k,
            scope_attribute: search_config.scope_attribute.clone(),
        }
    }

    /// Embed the query and return the nearest documents.
    ///
    /// When a scope is given, only documents whose scope attribute equals
    /// it are considered; the filter runs before scoring, so the full `k`
    /// survivors come back whenever enough documents match. Searching
    /// before anything has been ingested yields the empty response rather
    /// than an error.
    pub async fn search(
        &self,
        query: &str,
        scope: Option<&str>,
    ) -> Result<KnnResponse, FieldfareError> {
        let query_vec = self.embedder.embed_boxed(query).await?;
        let filter = scope.map(|value| (self.scope_attribute.as_str(), value));
        self.index.query_knn(&self.index_name, &query_vec, self.k, filter)
    }

    /// Get a reference to the underlying similarity index.
    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }
}

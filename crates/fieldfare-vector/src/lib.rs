//! Fieldfare Vector crate - similarity index, embedding service, and query engine.
//!
//! Provides named in-memory k-NN indexes with cosine similarity search,
//! an embedding service trait with endpoint-backed and mock implementations,
//! and the query engine used by the search surface.

pub mod embedding;
pub mod index;
pub mod search;

pub use embedding::{
    DynEmbeddingService, EmbeddingService, EndpointEmbedding, EndpointInvoker,
    HttpEndpointInvoker, MockEmbedding, MockEndpointInvoker,
};
pub use index::{DistanceMetric, KnnHit, KnnResponse, KnnSchema, SimilarityIndex};
pub use search::QueryEngine;

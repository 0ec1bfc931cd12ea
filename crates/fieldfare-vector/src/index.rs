//! In-memory similarity index with named, schema-bearing indexes.
//!
//! Each named index stores whole documents and scores them against query
//! vectors with exact cosine similarity. The schema carries the HNSW graph
//! parameters (`connectivity`, `build_breadth`) used by approximate
//! backends; the in-memory implementation records them but scans exactly,
//! which is O(n) per query and fine for moderate index sizes.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use fieldfare_core::error::FieldfareError;
use fieldfare_core::types::IndexedRecord;

/// Distance metric used to score vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
}

/// Schema for a named index: where the vector lives and how it is scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnSchema {
    /// Document field holding the embedding vector.
    pub vector_field: String,
    /// Required vector dimensionality.
    pub dimension: usize,
    /// Distance metric for scoring.
    pub metric: DistanceMetric,
    /// Neighbor graph connectivity (HNSW `m`).
    pub connectivity: usize,
    /// Candidate list breadth during graph construction (HNSW `ef_construction`).
    pub build_breadth: usize,
}

impl KnnSchema {
    /// Schema with the default cosine metric and graph parameters.
    pub fn new(vector_field: impl Into<String>, dimension: usize) -> Self {
        Self {
            vector_field: vector_field.into(),
            dimension,
            metric: DistanceMetric::Cosine,
            connectivity: 16,
            build_breadth: 512,
        }
    }
}

/// A single hit returned from a k-NN query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnHit {
    /// The ID assigned to the document when it was indexed.
    pub id: Uuid,
    /// Cosine similarity against the query vector.
    pub score: f64,
    /// The stored document, tags included.
    pub fields: IndexedRecord,
}

/// Response envelope for a k-NN query.
///
/// `index_size` is the total document count before any filtering, so a
/// caller can tell an empty index apart from a filter that matched nothing.
/// The default value is the shape returned for an index that does not
/// exist yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnnResponse {
    pub index_size: u64,
    pub hits: Vec<KnnHit>,
}

/// One named index: its schema plus the documents indexed into it.
#[derive(Debug)]
struct IndexShard {
    schema: KnnSchema,
    docs: HashMap<Uuid, IndexedRecord>,
}

/// Thread-safe registry of named similarity indexes.
///
/// Clones share the underlying storage, so the ingest pipeline and the
/// query engine can hold the same registry. Querying an index that has
/// never been created is not an error; it returns an empty response.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    shards: Arc<RwLock<HashMap<String, IndexShard>>>,
}

impl SimilarityIndex {
    /// Create a new empty index registry.
    pub fn new() -> Self {
        Self {
            shards: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create the named index if it does not exist yet.
    ///
    /// Returns `true` when this call created the index, `false` when it
    /// already existed. Concurrent callers race benignly: one creates, the
    /// rest observe the existing index.
    pub fn ensure_index(&self, name: &str, schema: &KnnSchema) -> Result<bool, FieldfareError> {
        let mut shards = self
            .shards
            .write()
            .map_err(|e| FieldfareError::Index(format!("Lock poisoned: {}", e)))?;

        match shards.entry(name.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(IndexShard {
                    schema: schema.clone(),
                    docs: HashMap::new(),
                });
                info!(
                    index = name,
                    dimension = schema.dimension,
                    connectivity = schema.connectivity,
                    "Created index"
                );
                Ok(true)
            }
        }
    }

    /// Return true if the named index exists.
    pub fn exists(&self, name: &str) -> Result<bool, FieldfareError> {
        let shards = self
            .shards
            .read()
            .map_err(|e| FieldfareError::Index(format!("Lock poisoned: {}", e)))?;
        Ok(shards.contains_key(name))
    }

    /// Index a document, returning the ID assigned to it.
    ///
    /// The document must carry a vector under the schema's `vector_field`
    /// with the schema's dimensionality. Every call stores a fresh document
    /// under a new ID; re-ingesting the same source produces duplicates,
    /// matching the append-style semantics of the write path.
    pub fn index_document(
        &self,
        name: &str,
        record: &IndexedRecord,
    ) -> Result<Uuid, FieldfareError> {
        let mut shards = self
            .shards
            .write()
            .map_err(|e| FieldfareError::Index(format!("Lock poisoned: {}", e)))?;

        let shard = shards
            .get_mut(name)
            .ok_or_else(|| FieldfareError::Index(format!("Index '{}' does not exist", name)))?;

        let vector = record.embedding(&shard.schema.vector_field).ok_or_else(|| {
            FieldfareError::Index(format!(
                "Document is missing vector field '{}'",
                shard.schema.vector_field
            ))
        })?;

        if vector.len() != shard.schema.dimension {
            return Err(FieldfareError::DimensionMismatch {
                expected: shard.schema.dimension,
                actual: vector.len(),
            });
        }

        let id = Uuid::new_v4();
        shard.docs.insert(id, record.clone());
        debug!(index = name, doc_id = %id, "Indexed document");
        Ok(id)
    }

    /// k-NN query with an optional exact-match filter on one document field.
    ///
    /// Returns the top `k` hits by descending cosine similarity. When a
    /// filter is given, only documents whose field equals the filter value
    /// are scored; `index_size` still reports the unfiltered total. An
    /// index that does not exist yields the default empty response.
    pub fn query_knn(
        &self,
        name: &str,
        query: &[f32],
        k: usize,
        filter: Option<(&str, &str)>,
    ) -> Result<KnnResponse, FieldfareError> {
        let shards = self
            .shards
            .read()
            .map_err(|e| FieldfareError::Index(format!("Lock poisoned: {}", e)))?;

        let Some(shard) = shards.get(name) else {
            return Ok(KnnResponse::default());
        };

        let mut hits: Vec<KnnHit> = Vec::new();
        for (id, doc) in &shard.docs {
            if let Some((attribute, value)) = filter {
                if doc.field_str(attribute) != Some(value) {
                    continue;
                }
            }
            let Some(vector) = doc.embedding(&shard.schema.vector_field) else {
                continue;
            };
            hits.push(KnnHit {
                id: *id,
                score: cosine_similarity(query, &vector),
                fields: doc.clone(),
            });
        }

        // Sort by descending score.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);

        Ok(KnnResponse {
            index_size: shard.docs.len() as u64,
            hits,
        })
    }

    /// Number of documents in the named index, zero if it does not exist.
    pub fn count(&self, name: &str) -> Result<u64, FieldfareError> {
        let shards = self
            .shards
            .read()
            .map_err(|e| FieldfareError::Index(format!("Lock poisoned: {}", e)))?;
        Ok(shards.get(name).map(|s| s.docs.len() as u64).unwrap_or(0))
    }
}

impl Default for SimilarityIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

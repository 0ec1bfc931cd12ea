//! Document ingestion pipeline.
//!
//! The DocumentPipeline takes each triggering record through analysis,
//! field resolution, embedding, persistence, and indexing, validating the
//! lifecycle transitions along the way. Failures stay local to the record
//! that caused them; the rest of the batch is always attempted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use fieldfare_core::config::{FieldfareConfig, FieldsConfig};
use fieldfare_core::error::FieldfareError;
use fieldfare_core::types::IndexedRecord;
use fieldfare_forms::{find_values, resolve_fields, DynAnalysisService};
use fieldfare_store::ObjectStore;
use fieldfare_vector::embedding::DynEmbeddingService;
use fieldfare_vector::index::{DistanceMetric, KnnSchema, SimilarityIndex};

use crate::events::TriggerBatch;
use crate::state::{advance, DocumentState};

/// Result of processing one trigger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IngestOutcome {
    /// The document went all the way through to the index.
    Indexed { object_key: String, doc_id: Uuid },
    /// No usable value for the embedding source field; document skipped.
    AnalysisEmpty { object_key: String },
    /// The record did not carry a bucket/key reference.
    Malformed { reason: String },
    /// A collaborator failed for this record; the batch continued.
    Failed { object_key: String, reason: String },
}

/// The main document ingestion pipeline.
///
/// Processes each source object through:
/// 1. Form analysis (block set extraction)
/// 2. Block graph resolution into a field map
/// 3. Embedding-source field selection
/// 4. Embedding generation
/// 5. Persistence of the transformed record, tags copied from the source
/// 6. Indexing of the persisted record, tags merged in as fields
///
/// The indexing stage re-reads the record it just persisted rather than
/// reusing the in-memory copy, so the index only ever sees what the
/// destination bucket holds.
pub struct DocumentPipeline {
    analysis: Box<dyn DynAnalysisService>,
    embedder: Box<dyn DynEmbeddingService>,
    store: Arc<dyn ObjectStore>,
    index: SimilarityIndex,
    fields: FieldsConfig,
    destination_bucket: String,
    index_name: String,
    schema: KnnSchema,
}

impl DocumentPipeline {
    /// Create a new pipeline over the given collaborators.
    pub fn new(
        analysis: Box<dyn DynAnalysisService>,
        embedder: Box<dyn DynEmbeddingService>,
        store: Arc<dyn ObjectStore>,
        index: SimilarityIndex,
        config: &FieldfareConfig,
    ) -> Self {
        let schema = KnnSchema {
            vector_field: config.fields.vector_field(),
            dimension: config.embedding.dimension,
            metric: DistanceMetric::Cosine,
            connectivity: config.index.connectivity,
            build_breadth: config.index.build_breadth,
        };

        Self {
            analysis,
            embedder,
            store,
            index,
            fields: config.fields.clone(),
            destination_bucket: config.store.destination_bucket.clone(),
            index_name: config.index.name.clone(),
            schema,
        }
    }

    /// Process every record in the batch, isolating failures per record.
    pub async fn process_batch(&self, batch: &TriggerBatch) -> Vec<IngestOutcome> {
        let mut outcomes = Vec::with_capacity(batch.records.len());

        for record in &batch.records {
            let (bucket, key) = match record.source() {
                Ok(source) => source,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed trigger record");
                    outcomes.push(IngestOutcome::Malformed {
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let outcome = match self.process_object(&bucket, &key).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(bucket = %bucket, key = %key, error = %e, "Record failed, continuing batch");
                    IngestOutcome::Failed {
                        object_key: key,
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Run one source object through the full pipeline.
    pub async fn process_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<IngestOutcome, FieldfareError> {
        let mut state = DocumentState::Received;

        let analysis = self.analysis.analyze_boxed(bucket, key).await?;
        state = advance(state, DocumentState::Analyzed)?;

        let field_map = resolve_fields(&analysis.blocks);

        // The embedding source is the raw first value of the matched field;
        // trimming only applies to what gets stored.
        let source_text = find_values(&field_map, &self.fields.source_field)?
            .and_then(|values| values.first())
            .cloned();
        let source_text = match source_text {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                debug!(
                    key = %key,
                    field = %self.fields.source_field,
                    "No usable source field value, skipping document"
                );
                advance(state, DocumentState::AnalysisEmpty)?;
                return Ok(IngestOutcome::AnalysisEmpty {
                    object_key: key.to_string(),
                });
            }
        };
        state = advance(state, DocumentState::FieldSelected)?;

        let vector = self.embedder.embed_boxed(&source_text).await?;
        state = advance(state, DocumentState::Embedded)?;

        let record = self.build_record(&field_map, key, vector)?;

        // Persist the transformed record and copy the source object's tags
        // onto it.
        let tags = self.store.get_tags(bucket, key)?;
        let destination_key = format!("{}.txt", key);
        self.store.put_object(
            &self.destination_bucket,
            &destination_key,
            &serde_json::to_vec(&record)?,
        )?;
        self.store
            .put_tags(&self.destination_bucket, &destination_key, &tags)?;
        state = advance(state, DocumentState::Persisted)?;

        // Index what was persisted: read the record back, fold its tags in
        // as plain fields, and hand it to the similarity index.
        let body = self
            .store
            .get_object(&self.destination_bucket, &destination_key)?;
        let mut document: IndexedRecord = serde_json::from_slice(&body)?;
        let stored_tags = self
            .store
            .get_tags(&self.destination_bucket, &destination_key)?;
        document.merge_tags(&stored_tags);

        self.index.ensure_index(&self.index_name, &self.schema)?;
        let doc_id = self.index.index_document(&self.index_name, &document)?;
        state = advance(state, DocumentState::Indexed)?;

        info!(key = %key, doc_id = %doc_id, state = %state, "Document indexed");
        Ok(IngestOutcome::Indexed {
            object_key: key.to_string(),
            doc_id,
        })
    }

    /// Assemble the persisted record: vector first, then the pass-through
    /// fields with their fallbacks.
    fn build_record(
        &self,
        field_map: &fieldfare_forms::FieldMap,
        key: &str,
        vector: Vec<f32>,
    ) -> Result<IndexedRecord, FieldfareError> {
        let mut record = IndexedRecord::new();
        record.set_field(self.schema.vector_field.clone(), vector);

        for field in self.fields.pass_through() {
            let value = find_values(field_map, field)?
                .and_then(|values| values.first())
                .map(|v| v.trim().to_string());

            match value {
                Some(v) => record.set_field(field, v),
                None if field == self.fields.id_field => {
                    // OCR missed the id; recover it from the object key's
                    // naming convention.
                    record.set_field(field, id_from_key(key));
                }
                None => record.set_field(field, ""),
            }
        }

        Ok(record)
    }

    /// Get a reference to the underlying similarity index.
    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }
}

/// Derive a document identifier from an object key: strip the path, then
/// the extension.
fn id_from_key(key: &str) -> String {
    let name = key.rsplit('/').next().unwrap_or(key);
    name.split('.').next().unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fieldfare_core::types::{Block, Relationship};
    use fieldfare_forms::MockAnalysisService;
    use fieldfare_store::MemoryObjectStore;
    use fieldfare_vector::embedding::{
        EmbeddingService, EndpointEmbedding, MockEmbedding, MockEndpointInvoker,
    };

    const SOURCE_BUCKET: &str = "content-repo";
    const SOURCE_KEY: &str = "incoming/r123.pdf";

    /// Key/value block quartet for one form field: a key block labeled
    /// `name` whose linked value block carries `value`.
    fn field_blocks(n: usize, name: &str, value: &str) -> Vec<Block> {
        let key_word = format!("kw{}", n);
        let value_word = format!("vw{}", n);
        let key_id = format!("k{}", n);
        let value_id = format!("v{}", n);

        vec![
            Block::word(&key_word, name),
            Block::word(&value_word, value),
            Block::key(
                &key_id,
                vec![
                    Relationship::value(vec![value_id.clone()]),
                    Relationship::child(vec![key_word]),
                ],
            ),
            Block::value(&value_id, vec![Relationship::child(vec![value_word])]),
        ]
    }

    fn review_blocks(body: &str, id: &str) -> Vec<Block> {
        let mut blocks = field_blocks(0, "ReviewBody", body);
        blocks.extend(field_blocks(1, "ReviewID", id));
        blocks
    }

    fn seed_source(store: &MemoryObjectStore, department: Option<&str>) {
        store
            .put_object(SOURCE_BUCKET, SOURCE_KEY, b"%PDF-1.4 scanned review")
            .unwrap();
        if let Some(dep) = department {
            let mut tags = fieldfare_core::types::ObjectTags::new();
            tags.insert("department".to_string(), dep.to_string());
            store.put_tags(SOURCE_BUCKET, SOURCE_KEY, &tags).unwrap();
        }
    }

    fn make_pipeline(blocks: Vec<Block>, store: Arc<MemoryObjectStore>) -> DocumentPipeline {
        DocumentPipeline::new(
            Box::new(MockAnalysisService::with_blocks(blocks)),
            Box::new(MockEmbedding::new()),
            store,
            SimilarityIndex::new(),
            &FieldfareConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_process_object_full_lifecycle() {
        let store = Arc::new(MemoryObjectStore::new());
        seed_source(&store, Some("books"));

        let pipeline = make_pipeline(
            review_blocks("a gripping detective novel", "r123"),
            Arc::clone(&store),
        );

        let outcome = pipeline
            .process_object(SOURCE_BUCKET, SOURCE_KEY)
            .await
            .unwrap();
        assert!(matches!(outcome, IngestOutcome::Indexed { .. }));

        // Transformed record lands in the destination bucket under
        // `<key>.txt`, tags copied verbatim.
        let destination_key = format!("{}.txt", SOURCE_KEY);
        let body = store
            .get_object("fieldfare-transformed", &destination_key)
            .unwrap();
        let record: IndexedRecord = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            record.field_str("reviewBody"),
            Some("a gripping detective novel")
        );
        assert_eq!(record.field_str("reviewid"), Some("r123"));
        assert_eq!(
            record.embedding("reviewBody_embeddings").map(|v| v.len()),
            Some(512)
        );

        let tags = store
            .get_tags("fieldfare-transformed", &destination_key)
            .unwrap();
        assert_eq!(tags.get("department").map(String::as_str), Some("books"));

        assert_eq!(pipeline.index().count("content-repo-search").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_indexed_document_carries_tags_as_fields() {
        let store = Arc::new(MemoryObjectStore::new());
        seed_source(&store, Some("books"));

        let pipeline = make_pipeline(
            review_blocks("a gripping detective novel", "r123"),
            Arc::clone(&store),
        );
        pipeline
            .process_object(SOURCE_BUCKET, SOURCE_KEY)
            .await
            .unwrap();

        // The tag value is queryable as an exact-match filter attribute.
        let query = MockEmbedding::new()
            .embed("a gripping detective novel")
            .await
            .unwrap();
        let response = pipeline
            .index()
            .query_knn(
                "content-repo-search",
                &query,
                3,
                Some(("department", "books")),
            )
            .unwrap();
        assert_eq!(response.hits.len(), 1);
        assert!((response.hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_process_batch_isolates_malformed_records() {
        let store = Arc::new(MemoryObjectStore::new());
        seed_source(&store, None);

        let pipeline = make_pipeline(
            review_blocks("sturdy bookshelf", "r123"),
            Arc::clone(&store),
        );

        let mut batch = TriggerBatch::for_object(SOURCE_BUCKET, SOURCE_KEY);
        batch.records.insert(
            0,
            crate::events::TriggerRecord {
                body: "not json".to_string(),
            },
        );

        let outcomes = pipeline.process_batch(&batch).await;
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], IngestOutcome::Malformed { .. }));
        assert!(matches!(outcomes[1], IngestOutcome::Indexed { .. }));
        assert_eq!(pipeline.index().count("content-repo-search").unwrap(), 1);
    }

    /// Embedder that counts how often it is called.
    #[derive(Clone, Default)]
    struct CountingEmbedding {
        calls: Arc<AtomicUsize>,
    }

    impl EmbeddingService for CountingEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, FieldfareError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            MockEmbedding::new().embed(text).await
        }

        fn dimensions(&self) -> usize {
            512
        }
    }

    #[tokio::test]
    async fn test_analysis_empty_skips_without_embedding() {
        let store = Arc::new(MemoryObjectStore::new());
        seed_source(&store, None);

        // Only the id field resolves; the embedding source is absent.
        let embedder = CountingEmbedding::default();
        let calls = Arc::clone(&embedder.calls);
        let pipeline = DocumentPipeline::new(
            Box::new(MockAnalysisService::with_blocks(field_blocks(
                0, "ReviewID", "r123",
            ))),
            Box::new(embedder),
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            SimilarityIndex::new(),
            &FieldfareConfig::default(),
        );

        let outcome = pipeline
            .process_object(SOURCE_BUCKET, SOURCE_KEY)
            .await
            .unwrap();
        assert!(matches!(outcome, IngestOutcome::AnalysisEmpty { .. }));

        // No embedding call, no destination object, nothing indexed.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let destination_key = format!("{}.txt", SOURCE_KEY);
        assert!(store
            .get_object("fieldfare-transformed", &destination_key)
            .is_err());
        assert_eq!(pipeline.index().count("content-repo-search").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_source_value_skips() {
        let store = Arc::new(MemoryObjectStore::new());
        seed_source(&store, None);

        // The value block for ReviewBody has no children, so its text
        // resolves to the empty string.
        let mut blocks = vec![
            Block::word("kw0", "ReviewBody"),
            Block::key(
                "k0",
                vec![
                    Relationship::value(vec!["v0".to_string()]),
                    Relationship::child(vec!["kw0".to_string()]),
                ],
            ),
            Block::value("v0", vec![]),
        ];
        blocks.extend(field_blocks(1, "ReviewID", "r123"));

        let pipeline = make_pipeline(blocks, Arc::clone(&store));
        let outcome = pipeline
            .process_object(SOURCE_BUCKET, SOURCE_KEY)
            .await
            .unwrap();
        assert!(matches!(outcome, IngestOutcome::AnalysisEmpty { .. }));
    }

    #[tokio::test]
    async fn test_id_fallback_from_object_key() {
        let store = Arc::new(MemoryObjectStore::new());
        store
            .put_object(SOURCE_BUCKET, "incoming/r999.pdf", b"scan")
            .unwrap();

        // Only the review body resolves; the id must come from the key.
        let pipeline = make_pipeline(
            field_blocks(0, "ReviewBody", "works great"),
            Arc::clone(&store),
        );

        pipeline
            .process_object(SOURCE_BUCKET, "incoming/r999.pdf")
            .await
            .unwrap();

        let body = store
            .get_object("fieldfare-transformed", "incoming/r999.pdf.txt")
            .unwrap();
        let record: IndexedRecord = serde_json::from_slice(&body).unwrap();
        assert_eq!(record.field_str("reviewid"), Some("r999"));
        assert_eq!(record.field_str("reviewBody"), Some("works great"));
    }

    #[tokio::test]
    async fn test_missing_source_object_fails_record_only() {
        let store = Arc::new(MemoryObjectStore::new());
        // Seed only the second object.
        store
            .put_object(SOURCE_BUCKET, "incoming/r2.pdf", b"scan")
            .unwrap();

        let pipeline = make_pipeline(
            review_blocks("decent value for money", "r2"),
            Arc::clone(&store),
        );

        let mut batch = TriggerBatch::for_object(SOURCE_BUCKET, "incoming/missing.pdf");
        batch
            .records
            .extend(TriggerBatch::for_object(SOURCE_BUCKET, "incoming/r2.pdf").records);

        let outcomes = pipeline.process_batch(&batch).await;
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], IngestOutcome::Failed { .. }));
        assert!(matches!(outcomes[1], IngestOutcome::Indexed { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_ingestion_creates_duplicate_documents() {
        let store = Arc::new(MemoryObjectStore::new());
        seed_source(&store, None);

        let pipeline = make_pipeline(
            review_blocks("arrived on time", "r123"),
            Arc::clone(&store),
        );

        let first = pipeline
            .process_object(SOURCE_BUCKET, SOURCE_KEY)
            .await
            .unwrap();
        let second = pipeline
            .process_object(SOURCE_BUCKET, SOURCE_KEY)
            .await
            .unwrap();

        let (IngestOutcome::Indexed { doc_id: id1, .. }, IngestOutcome::Indexed { doc_id: id2, .. }) =
            (first, second)
        else {
            panic!("both runs should index");
        };
        assert_ne!(id1, id2);
        assert_eq!(pipeline.index().count("content-repo-search").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_predictions_fails_record() {
        let store = Arc::new(MemoryObjectStore::new());
        seed_source(&store, None);

        let pipeline = DocumentPipeline::new(
            Box::new(MockAnalysisService::with_blocks(review_blocks(
                "good product",
                "r123",
            ))),
            Box::new(EndpointEmbedding::new(
                MockEndpointInvoker::empty(),
                "test-endpoint",
                512,
            )),
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            SimilarityIndex::new(),
            &FieldfareConfig::default(),
        );

        let batch = TriggerBatch::for_object(SOURCE_BUCKET, SOURCE_KEY);
        let outcomes = pipeline.process_batch(&batch).await;

        assert_eq!(outcomes.len(), 1);
        let IngestOutcome::Failed { reason, .. } = &outcomes[0] else {
            panic!("expected a failed outcome");
        };
        assert!(reason.contains("empty predictions"));
    }

    #[test]
    fn test_id_from_key() {
        assert_eq!(id_from_key("incoming/r999.pdf"), "r999");
        assert_eq!(id_from_key("r999.pdf"), "r999");
        assert_eq!(id_from_key("r999"), "r999");
        assert_eq!(id_from_key("a/b/c/r999.tar.gz"), "r999");
    }
}

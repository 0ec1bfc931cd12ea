//! Embedding service trait and implementations.
//!
//! - `EndpointEmbedding` calls a hosted inference endpoint through an
//!   [`EndpointInvoker`] transport, wrapping text in the `{"key": ...}`
//!   request shape the model server expects and unwrapping the
//!   `predictions` array it returns. This is the production backend.
//! - `MockEmbedding` provides deterministic hash-based vectors for testing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::Deserialize;
use tracing::debug;

use fieldfare_core::error::FieldfareError;

/// Service for generating text embeddings.
///
/// Implementations convert text into fixed-dimensional vectors that capture
/// semantic meaning. Used for both ingestion (indexing) and search (query).
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, FieldfareError>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// Because `EmbeddingService::embed` returns `impl Future` it is not
/// object-safe. This trait uses a boxed future instead, allowing
/// `Box<dyn DynEmbeddingService>` to be stored in structs without generics.
///
/// A blanket implementation is provided so that every `EmbeddingService`
/// automatically implements `DynEmbeddingService`.
pub trait DynEmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text (boxed future).
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, FieldfareError>> + Send + 'a>,
    >;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Blanket impl: any `EmbeddingService` automatically implements `DynEmbeddingService`.
impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, FieldfareError>> + Send + 'a>,
    > {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// EndpointInvoker - transport to the hosted model server
// ---------------------------------------------------------------------------

/// Transport that delivers a serialized payload to a named model endpoint
/// and returns the raw response body.
///
/// Separated from [`EndpointEmbedding`] so the request/response packaging
/// can be tested without a live model server.
pub trait EndpointInvoker: Send + Sync {
    /// Invoke the endpoint with a JSON payload, returning the response body.
    fn invoke(
        &self,
        endpoint: &str,
        payload: &str,
    ) -> impl std::future::Future<Output = Result<String, FieldfareError>> + Send;
}

/// Invoker that POSTs to a hosted model server over HTTP.
///
/// Requests go to `{service_url}/endpoints/{endpoint}/invocations`, the
/// invocation path convention of managed inference services.
#[derive(Debug, Clone)]
pub struct HttpEndpointInvoker {
    client: reqwest::Client,
    service_url: String,
}

impl HttpEndpointInvoker {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            service_url: service_url.into(),
        }
    }
}

impl EndpointInvoker for HttpEndpointInvoker {
    async fn invoke(&self, endpoint: &str, payload: &str) -> Result<String, FieldfareError> {
        let url = format!("{}/endpoints/{}/invocations", self.service_url, endpoint);

        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| FieldfareError::Embedding(format!("Endpoint request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FieldfareError::Embedding(format!(
                "Endpoint '{}' returned status {}",
                endpoint,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| FieldfareError::Embedding(format!("Endpoint response read failed: {}", e)))
    }
}

// ---------------------------------------------------------------------------
// EndpointEmbedding - hosted inference endpoint adapter
// ---------------------------------------------------------------------------

/// Wire shape of the model server response.
#[derive(Debug, Deserialize)]
struct PredictionResponse {
    predictions: Vec<Vec<f32>>,
}

/// Embedding service backed by a hosted inference endpoint.
///
/// The endpoint identifier is resolved from the parameter store once at
/// startup and fixed for the life of the service. Each call sends
/// `{"key": <text>}` and takes the first element of the returned
/// `predictions` array as the vector. An empty array is reported as
/// [`FieldfareError::EmptyPredictions`] rather than a panic, so one bad
/// model response cannot take down a whole ingest batch.
#[derive(Debug, Clone)]
pub struct EndpointEmbedding<I> {
    invoker: I,
    endpoint: String,
    dimensions: usize,
}

impl<I: EndpointInvoker> EndpointEmbedding<I> {
    pub fn new(invoker: I, endpoint: impl Into<String>, dimensions: usize) -> Self {
        Self {
            invoker,
            endpoint: endpoint.into(),
            dimensions,
        }
    }
}

impl<I: EndpointInvoker> EmbeddingService for EndpointEmbedding<I> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, FieldfareError> {
        if text.is_empty() {
            return Err(FieldfareError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }

        let payload = serde_json::json!({ "key": text }).to_string();
        let raw = self.invoker.invoke(&self.endpoint, &payload).await?;

        let response: PredictionResponse = serde_json::from_str(&raw).map_err(|e| {
            FieldfareError::Embedding(format!("Malformed endpoint response: {}", e))
        })?;

        let embedding = response
            .predictions
            .into_iter()
            .next()
            .ok_or(FieldfareError::EmptyPredictions)?;

        debug!(
            endpoint = %self.endpoint,
            dimensions = embedding.len(),
            "Generated embedding"
        );
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// Mocks - deterministic doubles for testing
// ---------------------------------------------------------------------------

/// Mock invoker that answers with hash-derived predictions.
///
/// The prediction vector is a function of the payload, so identical requests
/// produce identical responses. `empty()` builds an invoker that always
/// answers with an empty predictions array, for exercising the degraded
/// model-server path.
#[derive(Debug, Clone)]
pub struct MockEndpointInvoker {
    dimensions: usize,
    empty: bool,
}

impl MockEndpointInvoker {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            empty: false,
        }
    }

    /// Answer every invocation with `{"predictions": []}`.
    pub fn empty() -> Self {
        Self {
            dimensions: 0,
            empty: true,
        }
    }
}

impl EndpointInvoker for MockEndpointInvoker {
    async fn invoke(&self, _endpoint: &str, payload: &str) -> Result<String, FieldfareError> {
        if self.empty {
            return Ok(r#"{"predictions": []}"#.to_string());
        }

        let mut values = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let mut hasher = DefaultHasher::new();
            payload.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            values.push(val as f32);
        }

        Ok(serde_json::json!({ "predictions": [values] }).to_string())
    }
}

/// Mock embedding service that returns deterministic 512-dimensional vectors.
///
/// The output is derived from a hash of the input text, so identical inputs
/// always produce identical outputs. This allows testing indexing and
/// search without a model server.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedding;

impl MockEmbedding {
    pub fn new() -> Self {
        Self
    }

    fn hash_to_vector(text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(512);
        for i in 0..512 {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        // L2-normalize to unit vectors so cosine scores use the full range.
        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, FieldfareError> {
        if text.is_empty() {
            return Err(FieldfareError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }
        Ok(Self::hash_to_vector(text))
    }

    fn dimensions(&self) -> usize {
        512
    }
}

//! Document analysis service trait and implementations.
//!
//! - `RemoteAnalysisService` calls an HTTP form-analysis engine. This is the
//!   production backend.
//! - `MockAnalysisService` returns a fixed block set for testing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use fieldfare_core::error::FieldfareError;
use fieldfare_core::types::Block;

/// Output of one analysis pass over a stored document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    #[serde(rename = "Blocks", default)]
    pub blocks: Vec<Block>,
}

/// Service that runs form analysis over an object in the store.
///
/// Implementations fetch the object at `bucket`/`key`, run form-field
/// detection, and return the raw block set for resolution.
pub trait AnalysisService: Send + Sync {
    /// Analyze the object at `bucket`/`key` with form-field detection.
    fn analyze(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<AnalysisOutput, FieldfareError>> + Send;
}

/// Object-safe version of [`AnalysisService`] for dynamic dispatch.
///
/// Because `AnalysisService::analyze` returns `impl Future` it is not
/// object-safe. This trait uses a boxed future instead, allowing
/// `Box<dyn DynAnalysisService>` to be stored in structs without generics.
///
/// A blanket implementation is provided so that every `AnalysisService`
/// automatically implements `DynAnalysisService`.
pub trait DynAnalysisService: Send + Sync {
    /// Analyze the object at `bucket`/`key` (boxed future).
    fn analyze_boxed<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<AnalysisOutput, FieldfareError>> + Send + 'a>,
    >;
}

/// Blanket impl: any `AnalysisService` automatically implements `DynAnalysisService`.
impl<T: AnalysisService> DynAnalysisService for T {
    fn analyze_boxed<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<AnalysisOutput, FieldfareError>> + Send + 'a>,
    > {
        Box::pin(self.analyze(bucket, key))
    }
}

// ---------------------------------------------------------------------------
// RemoteAnalysisService - HTTP form-analysis engine client
// ---------------------------------------------------------------------------

/// Client for an HTTP form-analysis engine.
///
/// Sends `POST {engine_url}/analyze` with the object reference and the
/// FORMS feature flag, and expects the engine's `{"Blocks": [...]}` wire
/// shape back.
#[derive(Debug, Clone)]
pub struct RemoteAnalysisService {
    client: reqwest::Client,
    engine_url: String,
}

impl RemoteAnalysisService {
    pub fn new(engine_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            engine_url: engine_url.into(),
        }
    }
}

impl AnalysisService for RemoteAnalysisService {
    async fn analyze(&self, bucket: &str, key: &str) -> Result<AnalysisOutput, FieldfareError> {
        let request = serde_json::json!({
            "Document": { "Bucket": bucket, "Name": key },
            "FeatureTypes": ["FORMS"],
        });

        let response = self
            .client
            .post(format!("{}/analyze", self.engine_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| FieldfareError::Analysis(format!("Engine request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FieldfareError::Analysis(format!(
                "Engine returned status {}",
                response.status()
            )));
        }

        let output: AnalysisOutput = response
            .json()
            .await
            .map_err(|e| FieldfareError::Analysis(format!("Invalid engine response: {}", e)))?;

        debug!(bucket = %bucket, key = %key, blocks = output.blocks.len(), "Analysis complete");
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// MockAnalysisService - fixed block set for testing
// ---------------------------------------------------------------------------

/// Mock analysis service returning a configured block set for any object.
#[derive(Debug, Clone, Default)]
pub struct MockAnalysisService {
    blocks: Vec<Block>,
}

impl MockAnalysisService {
    /// Returns the given blocks for every analyze call.
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Returns no blocks, mimicking a document with nothing detected.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl AnalysisService for MockAnalysisService {
    async fn analyze(&self, _bucket: &str, _key: &str) -> Result<AnalysisOutput, FieldfareError> {
        Ok(AnalysisOutput {
            blocks: self.blocks.clone(),
        })
    }
}

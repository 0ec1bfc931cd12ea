use thiserror::Error;

/// Top-level error type for the Fieldfare system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for
/// FieldfareError` so that the `?` operator works seamlessly across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FieldfareError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding service returned an empty predictions array")]
    EmptyPredictions,

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index error: {0}")]
    Index(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Parameter error: {0}")]
    Parameter(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for FieldfareError {
    fn from(err: toml::de::Error) -> Self {
        FieldfareError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for FieldfareError {
    fn from(err: toml::ser::Error) -> Self {
        FieldfareError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for FieldfareError {
    fn from(err: serde_json::Error) -> Self {
        FieldfareError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Fieldfare operations.
pub type Result<T> = std::result::Result<T, FieldfareError>;

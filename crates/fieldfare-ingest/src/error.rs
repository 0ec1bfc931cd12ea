//! Error types for the ingest pipeline.

use crate::state::DocumentState;
use fieldfare_core::error::FieldfareError;

/// Errors from document lifecycle management.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Invalid state transition: {0} -> {1}")]
    InvalidTransition(DocumentState, DocumentState),
    #[error("Malformed trigger record: {0}")]
    MalformedRecord(String),
    #[error("Storage error: {0}")]
    Storage(#[from] FieldfareError),
}

impl From<IngestError> for FieldfareError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Storage(inner) => inner,
            other => FieldfareError::Ingest(other.to_string()),
        }
    }
}

//! Document state machine with validated transitions.
//!
//! Enforces the allowed state transitions for the ingest lifecycle:
//! Received -> Analyzed -> FieldSelected -> Embedded -> Persisted -> Indexed
//! Analyzed -> AnalysisEmpty

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Lifecycle states for one document moving through the pipeline.
///
/// `AnalysisEmpty` is terminal: the embedding source field had no usable
/// value and the document is skipped, not retried. `IndexUnavailable` is a
/// search-time condition (the index does not exist yet, answered with an
/// empty result set); no ingest transition leads into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    Received,
    Analyzed,
    FieldSelected,
    Embedded,
    Persisted,
    Indexed,
    AnalysisEmpty,
    IndexUnavailable,
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentState::Received => write!(f, "received"),
            DocumentState::Analyzed => write!(f, "analyzed"),
            DocumentState::FieldSelected => write!(f, "field_selected"),
            DocumentState::Embedded => write!(f, "embedded"),
            DocumentState::Persisted => write!(f, "persisted"),
            DocumentState::Indexed => write!(f, "indexed"),
            DocumentState::AnalysisEmpty => write!(f, "analysis_empty"),
            DocumentState::IndexUnavailable => write!(f, "index_unavailable"),
        }
    }
}

impl std::str::FromStr for DocumentState {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(DocumentState::Received),
            "analyzed" => Ok(DocumentState::Analyzed),
            "field_selected" => Ok(DocumentState::FieldSelected),
            "embedded" => Ok(DocumentState::Embedded),
            "persisted" => Ok(DocumentState::Persisted),
            "indexed" => Ok(DocumentState::Indexed),
            "analysis_empty" => Ok(DocumentState::AnalysisEmpty),
            "index_unavailable" => Ok(DocumentState::IndexUnavailable),
            _ => Err(format!("Unknown document state: {}", s)),
        }
    }
}

/// Validate that a state transition is allowed.
///
/// Valid transitions:
/// - Received -> Analyzed
/// - Analyzed -> FieldSelected
/// - Analyzed -> AnalysisEmpty (terminal skip)
/// - FieldSelected -> Embedded
/// - Embedded -> Persisted
/// - Persisted -> Indexed
pub fn validate_transition(from: DocumentState, to: DocumentState) -> Result<(), IngestError> {
    let valid = matches!(
        (from, to),
        (DocumentState::Received, DocumentState::Analyzed)
            | (DocumentState::Analyzed, DocumentState::FieldSelected)
            | (DocumentState::Analyzed, DocumentState::AnalysisEmpty)
            | (DocumentState::FieldSelected, DocumentState::Embedded)
            | (DocumentState::Embedded, DocumentState::Persisted)
            | (DocumentState::Persisted, DocumentState::Indexed)
    );

    if valid {
        Ok(())
    } else {
        Err(IngestError::InvalidTransition(from, to))
    }
}

/// Validate a transition and return the new state.
pub fn advance(from: DocumentState, to: DocumentState) -> Result<DocumentState, IngestError> {
    validate_transition(from, to)?;
    Ok(to)
}

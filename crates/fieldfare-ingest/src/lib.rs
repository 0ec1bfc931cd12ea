//! Fieldfare Ingest crate - trigger events, document lifecycle, and the
//! ingestion pipeline.
//!
//! Turns storage-notification batches into indexed documents: each record is
//! analyzed, resolved to fields, embedded, persisted, and indexed, with the
//! lifecycle tracked by an explicit state machine.

pub mod error;
pub mod events;
pub mod pipeline;
pub mod state;

pub use error::IngestError;
pub use events::{StorageEvent, TriggerBatch, TriggerRecord};
pub use pipeline::{DocumentPipeline, IngestOutcome};
pub use state::{advance, validate_transition, DocumentState};

//! Trigger-batch wire types.
//!
//! Ingestion is driven by notification batches. Each batch record carries a
//! JSON string `body` holding a storage event, whose first record points at
//! the source bucket and key. The double encoding matches the
//! queue-delivery format the notifications arrive in, so a captured event
//! can be replayed through `/ingest` or `--ingest` verbatim.

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// A batch of trigger records, the unit of one pipeline invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<TriggerRecord>,
}

/// One queued notification; the storage event is JSON-encoded in `body`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub body: String,
}

/// Storage event carried inside a trigger record body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StorageRecord>,
}

/// One record of a storage event, pointing at the object that changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecord {
    #[serde(rename = "s3")]
    pub object_ref: ObjectRef,
}

/// Bucket/key reference nested inside a storage record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: BucketRef,
    pub object: KeyRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyRef {
    pub key: String,
}

impl TriggerBatch {
    /// Build a single-record batch for the given source object.
    pub fn for_object(bucket: &str, key: &str) -> Self {
        let event = serde_json::json!({
            "Records": [{
                "s3": {
                    "bucket": { "name": bucket },
                    "object": { "key": key },
                },
            }],
        });
        Self {
            records: vec![TriggerRecord {
                body: event.to_string(),
            }],
        }
    }
}

impl TriggerRecord {
    /// Extract the source bucket and key from the encoded storage event.
    ///
    /// Only the first storage record is consulted, matching the upstream
    /// convention of one object per notification. A body that is not a
    /// storage event, or an event without records, is a malformed record.
    pub fn source(&self) -> Result<(String, String), IngestError> {
        let event: StorageEvent = serde_json::from_str(&self.body)
            .map_err(|e| IngestError::MalformedRecord(e.to_string()))?;

        let record = event.records.into_iter().next().ok_or_else(|| {
            IngestError::MalformedRecord("no storage records in event".to_string())
        })?;

        Ok((record.object_ref.bucket.name, record.object_ref.object.key))
    }
}

//! Object store trait and implementations.
//!
//! - `SqliteObjectStore` persists objects and their tags in the local
//!   database. This is the production backend.
//! - `MemoryObjectStore` keeps everything in a HashMap for testing.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use rusqlite::OptionalExtension;
use tracing::debug;

use fieldfare_core::error::FieldfareError;
use fieldfare_core::types::ObjectTags;

use crate::db::Database;

/// Bucket/key addressed blob storage with per-object tags.
///
/// Tags carry the access-control attributes; they are read from source
/// objects and copied verbatim onto transformed ones. A body overwrite
/// resets tags, matching a fresh put.
pub trait ObjectStore: Send + Sync {
    /// Read an object's body.
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FieldfareError>;

    /// Write an object's body, replacing any existing object at the key.
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), FieldfareError>;

    /// Read an object's tags.
    fn get_tags(&self, bucket: &str, key: &str) -> Result<ObjectTags, FieldfareError>;

    /// Replace an object's tags.
    fn put_tags(&self, bucket: &str, key: &str, tags: &ObjectTags) -> Result<(), FieldfareError>;
}

// ---------------------------------------------------------------------------
// SqliteObjectStore - database-backed objects
// ---------------------------------------------------------------------------

/// Object store persisting bodies and tags in the local SQLite database.
#[derive(Debug)]
pub struct SqliteObjectStore {
    db: Database,
}

impl SqliteObjectStore {
    /// Open (or create) the backing database at the given path.
    pub fn new(path: &Path) -> Result<Self, FieldfareError> {
        Ok(Self {
            db: Database::new(path)?,
        })
    }

    /// In-memory store for testing.
    pub fn in_memory() -> Result<Self, FieldfareError> {
        Ok(Self {
            db: Database::in_memory()?,
        })
    }
}

impl ObjectStore for SqliteObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FieldfareError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT body FROM objects WHERE bucket = ?1 AND key = ?2",
                [bucket, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| FieldfareError::Storage(format!("Failed to read object: {}", e)))?
            .ok_or_else(|| FieldfareError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
        })
    }

    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), FieldfareError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO objects (bucket, key, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT (bucket, key) DO UPDATE SET
                     body = excluded.body,
                     tags = '{}',
                     updated_at = strftime('%s', 'now')",
                rusqlite::params![bucket, key, body],
            )
            .map_err(|e| FieldfareError::Storage(format!("Failed to write object: {}", e)))?;
            debug!(bucket = %bucket, key = %key, bytes = body.len(), "Object written");
            Ok(())
        })
    }

    fn get_tags(&self, bucket: &str, key: &str) -> Result<ObjectTags, FieldfareError> {
        self.db.with_conn(|conn| {
            let raw: String = conn
                .query_row(
                    "SELECT tags FROM objects WHERE bucket = ?1 AND key = ?2",
                    [bucket, key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| FieldfareError::Storage(format!("Failed to read tags: {}", e)))?
                .ok_or_else(|| FieldfareError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })?;
            let tags: ObjectTags = serde_json::from_str(&raw)?;
            Ok(tags)
        })
    }

    fn put_tags(&self, bucket: &str, key: &str, tags: &ObjectTags) -> Result<(), FieldfareError> {
        let raw = serde_json::to_string(tags)?;
        self.db.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE objects SET tags = ?3, updated_at = strftime('%s', 'now')
                     WHERE bucket = ?1 AND key = ?2",
                    rusqlite::params![bucket, key, raw],
                )
                .map_err(|e| FieldfareError::Storage(format!("Failed to write tags: {}", e)))?;
            if updated == 0 {
                return Err(FieldfareError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                });
            }
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryObjectStore - HashMap-backed objects for testing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct StoredObject {
    body: Vec<u8>,
    tags: ObjectTags,
}

/// In-memory object store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across all buckets.
    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FieldfareError> {
        let objects = self
            .objects
            .read()
            .map_err(|e| FieldfareError::Storage(format!("Lock poisoned: {}", e)))?;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|obj| obj.body.clone())
            .ok_or_else(|| FieldfareError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), FieldfareError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|e| FieldfareError::Storage(format!("Lock poisoned: {}", e)))?;
        objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.to_vec(),
                tags: ObjectTags::new(),
            },
        );
        Ok(())
    }

    fn get_tags(&self, bucket: &str, key: &str) -> Result<ObjectTags, FieldfareError> {
        let objects = self
            .objects
            .read()
            .map_err(|e| FieldfareError::Storage(format!("Lock poisoned: {}", e)))?;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|obj| obj.tags.clone())
            .ok_or_else(|| FieldfareError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn put_tags(&self, bucket: &str, key: &str, tags: &ObjectTags) -> Result<(), FieldfareError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|e| FieldfareError::Storage(format!("Lock poisoned: {}", e)))?;
        let object = objects
            .get_mut(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| FieldfareError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        object.tags = tags.clone();
        Ok(())
    }
}

//! Database schema migrations.
//!
//! Applies the initial schema: the objects table backing the bucket/key
//! object store, plus the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use fieldfare_core::error::FieldfareError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental changes.
pub fn run_migrations(conn: &Connection) -> Result<(), FieldfareError> {
    // Create the migrations tracking table first.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| FieldfareError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| FieldfareError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), FieldfareError> {
    conn.execute_batch(
        "
        -- Stored objects, addressed by (bucket, key). Tags are a JSON
        -- object of string pairs, reset on body overwrite like a fresh put.
        CREATE TABLE IF NOT EXISTS objects (
            bucket      TEXT NOT NULL,
            key         TEXT NOT NULL,
            body        BLOB NOT NULL,
            tags        TEXT NOT NULL DEFAULT '{}',
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            PRIMARY KEY (bucket, key)
        );

        CREATE INDEX IF NOT EXISTS idx_objects_bucket
            ON objects (bucket, updated_at DESC);

        -- Record migration.
        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| FieldfareError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        // Running again should be idempotent.
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_objects_table_exists() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO objects (bucket, key, body) VALUES ('reports', 'review-7.pdf', x'00')",
            [],
        )
        .unwrap();

        let tags: String = conn
            .query_row(
                "SELECT tags FROM objects WHERE bucket = 'reports' AND key = 'review-7.pdf'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tags, "{}");
    }

    #[test]
    fn test_objects_primary_key_is_bucket_and_key() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO objects (bucket, key, body) VALUES ('a', 'same', x'01')",
            [],
        )
        .unwrap();
        // Same key under a different bucket is a distinct object.
        conn.execute(
            "INSERT INTO objects (bucket, key, body) VALUES ('b', 'same', x'02')",
            [],
        )
        .unwrap();
        // Same bucket and key collides.
        let result = conn.execute(
            "INSERT INTO objects (bucket, key, body) VALUES ('a', 'same', x'03')",
            [],
        );
        assert!(result.is_err());
    }
}

//! Fieldfare Store crate - object store and parameter store.
//!
//! Provides the bucket/key object store trait with SQLite-backed and
//! in-memory implementations, and the parameter store used to resolve
//! deployment settings at startup.

pub mod db;
pub mod migrations;
pub mod object;
pub mod params;

pub use db::Database;
pub use object::{MemoryObjectStore, ObjectStore, SqliteObjectStore};
pub use params::{EnvParameterStore, MemoryParameterStore, ParameterStore};

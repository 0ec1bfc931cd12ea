//! Parameter store trait and implementations.
//!
//! Deployment-level settings (the embedding endpoint identifier) live in a
//! parameter store rather than the config file. Parameters are resolved
//! once at process start; a failure there is fatal.

use std::collections::HashMap;

use fieldfare_core::error::FieldfareError;

/// Named-parameter lookup.
pub trait ParameterStore: Send + Sync {
    /// Resolve a parameter by name.
    fn get_parameter(&self, name: &str) -> Result<String, FieldfareError>;
}

/// Parameter store backed by process environment variables.
///
/// A parameter name is mapped to its variable by uppercasing and replacing
/// `-`, `.`, and `/` with `_`: `embedding-endpoint` reads
/// `EMBEDDING_ENDPOINT`.
#[derive(Debug, Clone, Default)]
pub struct EnvParameterStore;

impl EnvParameterStore {
    pub fn new() -> Self {
        Self
    }

    fn variable_name(name: &str) -> String {
        name.replace(['-', '.', '/'], "_").to_uppercase()
    }
}

impl ParameterStore for EnvParameterStore {
    fn get_parameter(&self, name: &str) -> Result<String, FieldfareError> {
        let var = Self::variable_name(name);
        std::env::var(&var).map_err(|_| {
            FieldfareError::Parameter(format!("Parameter '{}' not set (env {})", name, var))
        })
    }
}

/// In-memory parameter store for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryParameterStore {
    values: HashMap<String, String>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.set(name, value);
        store
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}

impl ParameterStore for MemoryParameterStore {
    fn get_parameter(&self, name: &str) -> Result<String, FieldfareError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| FieldfareError::Parameter(format!("Parameter '{}' not set", name)))
    }
}

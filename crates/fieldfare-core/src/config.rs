use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FieldfareError, Result};

/// Top-level configuration for the Fieldfare application.
///
/// Loaded from `~/.fieldfare/config.toml` by default. Each section corresponds
/// to one pipeline stage or cross-cutting concern. The whole struct is read
/// once at startup and passed around immutably.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldfareConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub fields: FieldsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for FieldfareConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            analysis: AnalysisConfig::default(),
            embedding: EmbeddingConfig::default(),
            fields: FieldsConfig::default(),
            store: StoreConfig::default(),
            index: IndexConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl FieldfareConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FieldfareConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| FieldfareError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite object store.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// API server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.fieldfare/data".to_string(),
            log_level: "info".to_string(),
            port: 3030,
        }
    }
}

/// Document analysis engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Base URL of the form-analysis engine.
    pub engine_url: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            engine_url: "http://127.0.0.1:8780".to_string(),
        }
    }
}

/// Embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding inference service.
    pub service_url: String,
    /// Parameter-store name holding the endpoint identifier, resolved once
    /// at startup.
    pub endpoint_parameter: String,
    /// Embedding vector dimension.
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:8781".to_string(),
            endpoint_parameter: "embedding-endpoint".to_string(),
            dimension: 512,
        }
    }
}

/// Which resolved form fields drive the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    /// Field whose text is embedded (fuzzy-matched against resolved names).
    pub source_field: String,
    /// Field holding the document identifier, recoverable from the object
    /// key when the form analysis misses it.
    pub id_field: String,
}

impl FieldsConfig {
    /// Name of the vector field in persisted records and the index schema.
    pub fn vector_field(&self) -> String {
        format!("{}_embeddings", self.source_field)
    }

    /// The pass-through fields copied into every persisted record.
    pub fn pass_through(&self) -> [&str; 2] {
        [self.source_field.as_str(), self.id_field.as_str()]
    }
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            source_field: "reviewBody".to_string(),
            id_field: "reviewid".to_string(),
        }
    }
}

/// Object store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bucket receiving transformed records.
    pub destination_bucket: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            destination_bucket: "fieldfare-transformed".to_string(),
        }
    }
}

/// Similarity index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index name.
    pub name: String,
    /// Neighbor graph connectivity (HNSW `m`).
    pub connectivity: usize,
    /// Candidate list breadth during graph construction (HNSW
    /// `ef_construction`).
    pub build_breadth: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: "content-repo-search".to_string(),
            connectivity: 16,
            build_breadth: 512,
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of nearest neighbors returned per query.
    pub k: usize,
    /// Record attribute the caller scope is filtered on.
    pub scope_attribute: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k: 3,
            scope_attribute: "department".to_string(),
        }
    }
}

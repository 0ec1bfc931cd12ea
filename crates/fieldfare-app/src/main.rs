//! Fieldfare application binary - composition root.
//!
//! Ties together all Fieldfare crates into a single executable:
//! 1. Load configuration from TOML and apply CLI overrides
//! 2. Resolve the embedding endpoint from the parameter store (fatal if unset)
//! 3. Open the SQLite object store
//! 4. Build the ingestion pipeline and query engine over one shared index
//! 5. Optionally process a trigger-batch file (`--ingest`)
//! 6. Start the axum REST API server

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use fieldfare_api::routes;
use fieldfare_api::state::AppState;
use fieldfare_core::config::FieldfareConfig;
use fieldfare_forms::RemoteAnalysisService;
use fieldfare_ingest::{DocumentPipeline, TriggerBatch};
use fieldfare_store::{EnvParameterStore, ObjectStore, ParameterStore, SqliteObjectStore};
use fieldfare_vector::{EndpointEmbedding, HttpEndpointInvoker, QueryEngine, SimilarityIndex};

use cli::CliArgs;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if let Some(rest) = data_dir.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(data_dir)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config loads before tracing so the log filter can fall back to its
    // log_level; load_or_default's own logging is lost, the path is logged
    // again below.
    let config_file = args.resolve_config_path();
    let mut config = FieldfareConfig::load_or_default(&config_file);
    config.general.port = args.resolve_port(config.general.port);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }

    // Tracing. Priority: --log-level flag > RUST_LOG > config file value.
    let filter = match args.resolve_log_level() {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(config.general.log_level.clone())
        }),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Fieldfare v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // The embedding endpoint identifier lives in the parameter store and is
    // resolved once at startup. Nothing can be embedded without it, so a
    // missing parameter is fatal.
    let params = EnvParameterStore::new();
    let endpoint = match params.get_parameter(&config.embedding.endpoint_parameter) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            tracing::error!(
                parameter = %config.embedding.endpoint_parameter,
                error = %e,
                "Failed to resolve embedding endpoint"
            );
            return Err(e.into());
        }
    };
    tracing::info!(endpoint = %endpoint, "Embedding endpoint resolved");

    // Object store.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }
    let db_path = data_dir.join("fieldfare.db");
    let store: Arc<dyn ObjectStore> = Arc::new(SqliteObjectStore::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite object store opened");

    // One similarity index shared by the pipeline and the query engine, so
    // documents become searchable the moment they are indexed.
    let index = SimilarityIndex::new();

    let analysis = RemoteAnalysisService::new(config.analysis.engine_url.clone());
    let embedder = EndpointEmbedding::new(
        HttpEndpointInvoker::new(config.embedding.service_url.clone()),
        endpoint,
        config.embedding.dimension,
    );

    let pipeline = DocumentPipeline::new(
        Box::new(analysis),
        Box::new(embedder.clone()),
        Arc::clone(&store),
        index.clone(),
        &config,
    );
    let engine = QueryEngine::new(Arc::new(index), embedder, &config.index, &config.search);
    tracing::info!(index = %config.index.name, "Ingestion pipeline and query engine ready");

    // Optional batch-file ingestion, processed before the server comes up.
    if let Some(ref path) = args.ingest {
        let contents = std::fs::read_to_string(path)?;
        let batch: TriggerBatch = serde_json::from_str(&contents)?;
        tracing::info!(
            path = %path.display(),
            records = batch.records.len(),
            "Ingesting trigger batch file"
        );
        for outcome in pipeline.process_batch(&batch).await {
            tracing::info!(outcome = ?outcome, "Batch record processed");
        }
    }

    let state = AppState::new(config.clone(), engine, pipeline);

    routes::start_server(&config, state).await?;

    Ok(())
}

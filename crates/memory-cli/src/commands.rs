//! Command implementations for vector-memory.
//!
//! Each command opens the configured backend, runs one store operation and
//! prints the result as JSON on stdout. Logs go to stderr.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use memory_qdrant::{QdrantClient, QdrantConfig};
use memory_store::{MemoryStore, StoreConfig};
use memory_types::{BackendKind, Embedding, MemoryRecord, Settings};
use memory_vector::{LocalVectorDb, VectorDbClient};

use crate::cli::{Cli, CollectionCommands, Commands};

/// Load settings and apply CLI overrides (highest precedence).
///
/// Validation runs once, after the overrides.
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    backend_override: Option<BackendKind>,
) -> Result<Settings> {
    let mut settings =
        Settings::load_unvalidated(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(backend) = backend_override {
        settings.backend = backend;
    }

    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Open the backend selected in `settings`.
pub fn open_client(settings: &Settings) -> Result<Arc<dyn VectorDbClient>> {
    match settings.backend {
        BackendKind::Local => {
            let db_path = settings.expanded_db_path();
            info!("Opening local database at {:?}", db_path);
            fs::create_dir_all(&db_path).context("Failed to create database directory")?;
            let db = LocalVectorDb::open(&db_path).context("Failed to open local database")?;
            Ok(Arc::new(db))
        }
        BackendKind::Qdrant => {
            info!("Connecting to Qdrant at {}", settings.qdrant.url);
            let client = QdrantClient::new(QdrantConfig::from(&settings.qdrant))
                .context("Failed to create Qdrant client")?;
            Ok(Arc::new(client))
        }
    }
}

/// Cancel `token` on Ctrl+C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling...");
            token.cancel();
        }
    });
}

/// Entry point used by the binary.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref(),
        cli.backend.map(BackendKind::from),
    )?;
    init_logging(&settings.log_level)?;

    let client = open_client(&settings)?;
    let store = MemoryStore::new(client, StoreConfig::from(&settings.store))
        .context("Invalid store configuration")?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let output = execute(&store, cli.command, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Run one command against `store` and return its JSON output.
pub async fn execute<C: VectorDbClient + ?Sized>(
    store: &MemoryStore<C>,
    command: Commands,
    cancel: &CancellationToken,
) -> Result<Value> {
    match command {
        Commands::Collections { command } => handle_collections(store, command, cancel).await,
        Commands::Get {
            collection,
            ids,
            with_embeddings,
        } => {
            let records = store
                .get_batch(&collection, &ids, with_embeddings, cancel)
                .await
                .context("Failed to get records")?;
            Ok(serde_json::to_value(records)?)
        }
        Commands::GetKey {
            collection,
            keys,
            with_embeddings,
        } => {
            let records = store
                .get_with_key_batch(&collection, &keys, with_embeddings, cancel)
                .await
                .context("Failed to get records by key")?;
            Ok(serde_json::to_value(records)?)
        }
        Commands::Remove { collection, ids } => {
            store
                .remove_batch(&collection, &ids, cancel)
                .await
                .context("Failed to remove records")?;
            Ok(json!({ "removed": ids }))
        }
        Commands::RemoveKey { collection, keys } => {
            store
                .remove_with_key_batch(&collection, &keys, cancel)
                .await
                .context("Failed to remove records by key")?;
            Ok(json!({ "removed": keys }))
        }
        Commands::Upsert { collection, file } => {
            let records = read_records(&file)?;
            let keys = store
                .upsert_batch(&collection, &records, cancel)
                .await
                .context("Failed to upsert records")?;
            Ok(json!({ "keys": keys }))
        }
        Commands::Search {
            collection,
            embedding,
            limit,
            min_score,
            with_embeddings,
        } => {
            let matches = store
                .get_nearest_matches(
                    &collection,
                    &Embedding::new(embedding),
                    limit,
                    min_score,
                    with_embeddings,
                    cancel,
                )
                .await
                .context("Search failed")?;
            let results: Vec<Value> = matches
                .into_iter()
                .map(|(record, score)| json!({ "record": record, "score": score }))
                .collect();
            Ok(Value::Array(results))
        }
    }
}

async fn handle_collections<C: VectorDbClient + ?Sized>(
    store: &MemoryStore<C>,
    command: CollectionCommands,
    cancel: &CancellationToken,
) -> Result<Value> {
    match command {
        CollectionCommands::List => {
            let names = store
                .get_collections(cancel)
                .await
                .context("Failed to list collections")?;
            Ok(json!(names))
        }
        CollectionCommands::Create { name, vector_size } => {
            store
                .create_collection(&name, vector_size, cancel)
                .await
                .context("Failed to create collection")?;
            Ok(json!({ "created": name }))
        }
        CollectionCommands::Delete { name } => {
            store
                .delete_collection(&name, cancel)
                .await
                .context("Failed to delete collection")?;
            Ok(json!({ "deleted": name }))
        }
        CollectionCommands::Exists { name } => {
            let exists = store
                .does_collection_exist(&name, cancel)
                .await
                .context("Failed to check collection")?;
            Ok(json!({ "name": name, "exists": exists }))
        }
    }
}

/// Read a JSON array of records.
pub fn read_records(path: &Path) -> Result<Vec<MemoryRecord>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file {:?}", path))?;
    let records: Vec<MemoryRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse records file {:?}", path))?;
    Ok(records)
}

//! CLI argument parsing for vector-memory.
//!
//! CLI flags override all other config sources.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use memory_types::BackendKind;

/// Vector Memory
///
/// Store, fetch and search embedding records in a vector database.
#[derive(Parser, Debug)]
#[command(name = "vector-memory")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/vector-memory/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Backend to use (overrides config)
    #[arg(short, long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    /// Embedded RocksDB database
    Local,
    /// Qdrant server
    Qdrant,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Local => BackendKind::Local,
            BackendArg::Qdrant => BackendKind::Qdrant,
        }
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage collections
    Collections {
        #[command(subcommand)]
        command: CollectionCommands,
    },

    /// Get records by metadata id
    Get {
        collection: String,

        #[arg(required = true)]
        ids: Vec<String>,

        /// Include embeddings in the output
        #[arg(long)]
        with_embeddings: bool,
    },

    /// Get records by backend key
    GetKey {
        collection: String,

        #[arg(required = true)]
        keys: Vec<String>,

        /// Include embeddings in the output
        #[arg(long)]
        with_embeddings: bool,
    },

    /// Remove records by metadata id
    Remove {
        collection: String,

        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Remove records by backend key
    RemoveKey {
        collection: String,

        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Insert or replace records from a JSON file holding an array of records
    Upsert {
        collection: String,

        file: PathBuf,
    },

    /// Find the records nearest to an embedding
    Search {
        collection: String,

        /// Comma-separated query vector, e.g. 0.1,0.2,0.3
        #[arg(long, required = true, value_delimiter = ',', allow_hyphen_values = true)]
        embedding: Vec<f32>,

        /// Maximum results
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Minimum relevance score
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        min_score: f64,

        /// Include embeddings in the output
        #[arg(long)]
        with_embeddings: bool,
    },
}

/// Collection subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum CollectionCommands {
    /// List collection names
    List,

    /// Create a collection (no-op if it exists)
    Create {
        name: String,

        /// Vector size (default from config)
        #[arg(long)]
        vector_size: Option<usize>,
    },

    /// Delete a collection and its records
    Delete { name: String },

    /// Check whether a collection exists
    Exists { name: String },
}

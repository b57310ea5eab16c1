//! Configuration loading for vector-memory.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/vector-memory/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::MemoryError;

/// Which vector database backs the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Embedded RocksDB backend (default)
    #[default]
    Local,
    /// Remote Qdrant server over REST
    Qdrant,
}

/// How a fan-out remove-by-id batch reacts to individual failures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemoveBatchMode {
    /// Issue every delete; log failures and report success.
    #[default]
    BestEffort,
    /// Stop issuing deletes at the first failure and return it.
    FailFast,
}

/// Settings for the embedded backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSettings {
    /// Path to the RocksDB directory
    #[serde(default = "default_local_db_path")]
    pub db_path: String,
}

fn default_local_db_path() -> String {
    ProjectDirs::from("", "", "vector-memory")
        .map(|p| p.data_local_dir().join("points"))
        .unwrap_or_else(|| PathBuf::from("./points"))
        .to_string_lossy()
        .to_string()
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            db_path: default_local_db_path(),
        }
    }
}

/// Settings for the Qdrant backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantSettings {
    /// Base URL of the Qdrant REST API
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    /// API key (prefer the VECTOR_MEMORY_QDRANT__API_KEY env var over the config file)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_qdrant_timeout")]
    pub timeout_secs: u64,
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_qdrant_timeout() -> u64 {
    30
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
            timeout_secs: default_qdrant_timeout(),
        }
    }
}

/// Memory store behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub remove_batch_mode: RemoveBatchMode,

    /// Upper bound on concurrent backend calls during fan-out batches
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Vector size used when a collection is created without an explicit size
    #[serde(default = "default_vector_size")]
    pub default_vector_size: usize,
}

fn default_max_concurrency() -> usize {
    8
}

fn default_vector_size() -> usize {
    1536
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            remove_batch_mode: RemoveBatchMode::default(),
            max_concurrency: default_max_concurrency(),
            default_vector_size: default_vector_size(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Backend selected at construction time
    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default)]
    pub local: LocalSettings,

    #[serde(default)]
    pub qdrant: QdrantSettings,

    #[serde(default)]
    pub store: StoreSettings,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            local: LocalSettings::default(),
            qdrant: QdrantSettings::default(),
            store: StoreSettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/vector-memory/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (VECTOR_MEMORY_*, `__` between nested keys)
    ///
    /// The result is validated. Callers that apply CLI flags on top should
    /// use [`Settings::load_unvalidated`] and call [`Settings::validate`] last.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, MemoryError> {
        let settings = Self::load_unvalidated(cli_config_path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Layer the same sources as [`Settings::load`] without validating.
    pub fn load_unvalidated(cli_config_path: Option<&str>) -> Result<Self, MemoryError> {
        let config_dir = ProjectDirs::from("", "", "vector-memory")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(|e| MemoryError::Config(e.to_string()))?
            .set_default("local.db_path", default_local_db_path())
            .map_err(|e| MemoryError::Config(e.to_string()))?
            .set_default("qdrant.url", default_qdrant_url())
            .map_err(|e| MemoryError::Config(e.to_string()))?
            .set_default("qdrant.timeout_secs", default_qdrant_timeout() as i64)
            .map_err(|e| MemoryError::Config(e.to_string()))?
            .set_default("store.max_concurrency", default_max_concurrency() as i64)
            .map_err(|e| MemoryError::Config(e.to_string()))?
            .set_default("store.default_vector_size", default_vector_size() as i64)
            .map_err(|e| MemoryError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // e.g. VECTOR_MEMORY_BACKEND=qdrant, VECTOR_MEMORY_QDRANT__URL=http://qdrant:6333
        builder = builder.add_source(
            Environment::with_prefix("VECTOR_MEMORY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| MemoryError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| MemoryError::Config(e.to_string()))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), MemoryError> {
        if self.store.max_concurrency == 0 {
            return Err(MemoryError::Config(
                "store.max_concurrency must be > 0".to_string(),
            ));
        }
        if self.store.default_vector_size == 0 {
            return Err(MemoryError::Config(
                "store.default_vector_size must be > 0".to_string(),
            ));
        }
        if self.qdrant.timeout_secs == 0 {
            return Err(MemoryError::Config(
                "qdrant.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.backend == BackendKind::Qdrant && self.qdrant.url.trim().is_empty() {
            return Err(MemoryError::Config(
                "qdrant.url is required for the qdrant backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Expand ~ in the local db path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        if let Some(rest) = self.local.db_path.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.local.db_path)
    }
}

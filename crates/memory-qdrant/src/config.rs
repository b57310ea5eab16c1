//! Qdrant client configuration.

use std::time::Duration;

use secrecy::SecretString;

use memory_types::QdrantSettings;

/// Configuration for the Qdrant REST client.
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// API base URL (e.g., "http://localhost:6333")
    pub base_url: String,

    /// API key, sent as the `api-key` header when set
    pub api_key: Option<SecretString>,

    /// Request timeout
    pub timeout: Duration,
}

impl QdrantConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&QdrantSettings> for QdrantConfig {
    fn from(settings: &QdrantSettings) -> Self {
        let config = QdrantConfig::new(settings.url.clone())
            .with_timeout(Duration::from_secs(settings.timeout_secs));
        match &settings.api_key {
            Some(key) if !key.is_empty() => config.with_api_key(key.clone()),
            _ => config,
        }
    }
}

//! Store configuration.

use memory_types::StoreSettings;

pub use memory_types::RemoveBatchMode;

use crate::error::StoreError;

/// Configuration for `MemoryStore`.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Failure policy for `remove_batch`
    pub remove_batch_mode: RemoveBatchMode,

    /// Upper bound on backend calls in flight during fan-out batches
    pub max_concurrency: usize,

    /// Vector size used by `create_collection` when none is given
    pub default_vector_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            remove_batch_mode: RemoveBatchMode::BestEffort,
            max_concurrency: 8,
            default_vector_size: 1536,
        }
    }
}

impl StoreConfig {
    pub fn with_remove_batch_mode(mut self, mode: RemoveBatchMode) -> Self {
        self.remove_batch_mode = mode;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_default_vector_size(mut self, size: usize) -> Self {
        self.default_vector_size = size;
        self
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.max_concurrency == 0 {
            return Err(StoreError::InvalidInput(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }
        if self.default_vector_size == 0 {
            return Err(StoreError::InvalidInput(
                "default_vector_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&StoreSettings> for StoreConfig {
    fn from(settings: &StoreSettings) -> Self {
        Self {
            remove_batch_mode: settings.remove_batch_mode,
            max_concurrency: settings.max_concurrency,
            default_vector_size: settings.default_vector_size,
        }
    }
}

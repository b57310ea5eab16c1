//! Store error types.

use thiserror::Error;

use memory_types::MemoryError;
use memory_vector::VectorDbError;

/// Errors returned by `MemoryStore` operations.
///
/// Absence is never an error: single lookups return `Ok(None)` and batch
/// lookups omit missing items.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure, passed through unmodified
    #[error("Backend error: {0}")]
    Backend(#[from] VectorDbError),

    /// The caller's cancellation token fired before the operation finished
    #[error("Operation cancelled")]
    Cancelled,

    /// A stored payload could not be read back as record metadata
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<MemoryError> for StoreError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::InvalidInput(msg) | MemoryError::Config(msg) => {
                StoreError::InvalidInput(msg)
            }
            MemoryError::Serialization(e) => StoreError::Serialization(e.to_string()),
        }
    }
}

impl StoreError {
    /// True when the backend could not be reached or faulted.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Backend(VectorDbError::Unavailable(_)))
    }
}

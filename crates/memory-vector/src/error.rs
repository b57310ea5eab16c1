//! Backend client error types.

use thiserror::Error;

/// Errors a vector database backend can report.
#[derive(Debug, Error)]
pub enum VectorDbError {
    /// The backend or collection could not be reached, or it answered with a fault
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// RocksDB error
    #[error("Database error: {0}")]
    Database(String),

    /// Request the backend cannot accept (bad key, name or size)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<serde_json::Error> for VectorDbError {
    fn from(err: serde_json::Error) -> Self {
        VectorDbError::Serialization(err.to_string())
    }
}

#[cfg(feature = "local")]
impl From<rocksdb::Error> for VectorDbError {
    fn from(err: rocksdb::Error) -> Self {
        VectorDbError::Database(err.to_string())
    }
}

impl From<memory_types::MemoryError> for VectorDbError {
    fn from(err: memory_types::MemoryError) -> Self {
        VectorDbError::Serialization(err.to_string())
    }
}

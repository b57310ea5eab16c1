//! # memory-types
//!
//! Shared domain types for vector-memory.
//!
//! This crate defines the data structures every other crate speaks:
//! - Records: normalized memory records with dual addressing (metadata id and backend key)
//! - Metadata codec: the lossless JSON encoding stored in a backend payload
//! - Embeddings: caller-supplied float vectors
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use memory_types::{Embedding, MemoryRecord};
//!
//! let record = MemoryRecord::local_record("Id", "text", "description", Embedding::new(vec![1.0, 1.0, 1.0]));
//! assert!(record.key.is_none());
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod record;

pub use config::{BackendKind, LocalSettings, QdrantSettings, RemoveBatchMode, Settings, StoreSettings};
pub use embedding::Embedding;
pub use error::MemoryError;
pub use record::{MemoryRecord, MemoryRecordMetadata};

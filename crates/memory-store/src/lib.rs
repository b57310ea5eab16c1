//! # memory-store
//!
//! Backend-agnostic memory store for vector-memory.
//!
//! `MemoryStore` wraps any `VectorDbClient` and exposes record lookups by
//! metadata id or by backend key, batch removal, upserts with key
//! resolution, similarity search and collection management. Every
//! operation accepts a `CancellationToken`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use memory_store::{MemoryStore, StoreConfig};
//! use memory_vector::LocalVectorDb;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Arc::new(LocalVectorDb::open("/tmp/vector-memory")?);
//! let store = MemoryStore::new(db, StoreConfig::default())?;
//! let cancel = CancellationToken::new();
//!
//! store.create_collection("docs", Some(3), &cancel).await?;
//! let record = store.get("docs", "Id", false, &cancel).await?;
//! assert!(record.is_none());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod store;

pub use config::{RemoveBatchMode, StoreConfig};
pub use error::StoreError;
pub use store::MemoryStore;

//! # memory-qdrant
//!
//! Qdrant backend for vector-memory, speaking Qdrant's REST API.
//!
//! Records are stored as points keyed by UUID strings. The serialized record
//! metadata is the point payload, so metadata-id lookups filter on the
//! payload `id` field.
//!
//! # Example
//!
//! ```rust,no_run
//! use memory_qdrant::{QdrantClient, QdrantConfig};
//! use memory_vector::VectorDbClient;
//!
//! # async fn run() -> Result<(), memory_vector::VectorDbError> {
//! let client = QdrantClient::new(QdrantConfig::new("http://localhost:6333"))?;
//! client.create_collection("docs", 1536).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
mod wire;

pub use client::QdrantClient;
pub use config::QdrantConfig;

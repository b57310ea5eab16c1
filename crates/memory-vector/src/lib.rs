//! # memory-vector
//!
//! Backend client interface for vector-memory.
//!
//! This crate defines what a vector database driver must provide and ships
//! one embedded implementation.
//!
//! ## Features
//! - `VectorDbClient`: async capability trait (point CRUD, payload-id lookup,
//!   key batches, nearest-neighbour search, collection management)
//! - `VectorRecord`: a point (key, vector, JSON payload)
//! - `LocalVectorDb`: RocksDB-backed backend (feature `local`, on by default)

pub mod client;
pub mod error;
#[cfg(feature = "local")]
pub mod local;
pub mod record;

pub use client::{PointStream, VectorDbClient};
pub use error::VectorDbError;
#[cfg(feature = "local")]
pub use local::{LocalVectorDb, CF_COLLECTIONS, CF_POINTS};
pub use record::{VectorRecord, PAYLOAD_ID_FIELD, PAYLOAD_TIMESTAMP_FIELD};

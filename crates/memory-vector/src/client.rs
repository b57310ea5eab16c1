//! Backend client trait.
//!
//! Defines the capability contract every vector database driver satisfies.
//! One implementation exists per backend and is chosen when the store is
//! constructed.

use async_trait::async_trait;
use futures::stream::BoxStream;

use memory_types::Embedding;

use crate::error::VectorDbError;
use crate::record::VectorRecord;

/// Lazily streamed points returned by key lookups.
pub type PointStream<'a> = BoxStream<'a, Result<VectorRecord, VectorDbError>>;

/// Trait for vector database backends.
///
/// Implementations must be safe for concurrent use from many tasks.
#[async_trait]
pub trait VectorDbClient: Send + Sync {
    /// Get the single point whose payload `id` equals `id`.
    ///
    /// Returns `Ok(None)` when nothing matches. A collection that cannot be
    /// reached yields `VectorDbError::Unavailable`.
    async fn get_by_payload_id(
        &self,
        collection: &str,
        id: &str,
        with_embedding: bool,
    ) -> Result<Option<VectorRecord>, VectorDbError>;

    /// Stream the points stored under `keys`.
    ///
    /// Keys with no point are skipped rather than reported.
    fn get_by_keys<'a>(
        &'a self,
        collection: &'a str,
        keys: &'a [String],
        with_embeddings: bool,
    ) -> PointStream<'a>;

    /// Delete the point whose payload `id` equals `id`. Deleting nothing is not an error.
    async fn delete_by_payload_id(&self, collection: &str, id: &str) -> Result<(), VectorDbError>;

    /// Delete all points stored under `keys` in one call.
    async fn delete_by_keys(&self, collection: &str, keys: &[String]) -> Result<(), VectorDbError>;

    /// Insert or replace points by key.
    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>)
        -> Result<(), VectorDbError>;

    /// Nearest neighbours of `query` by cosine similarity.
    /// Returns at most `limit` results with score >= `min_score`, best first.
    async fn search(
        &self,
        collection: &str,
        query: &Embedding,
        limit: usize,
        min_score: f64,
        with_embeddings: bool,
    ) -> Result<Vec<(VectorRecord, f64)>, VectorDbError>;

    /// Create a collection for vectors of `vector_size` dimensions.
    async fn create_collection(&self, name: &str, vector_size: usize)
        -> Result<(), VectorDbError>;

    /// Check whether a collection exists
    async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError>;

    /// List collection names
    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError>;

    /// Delete a collection and all of its points
    async fn delete_collection(&self, name: &str) -> Result<(), VectorDbError>;
}

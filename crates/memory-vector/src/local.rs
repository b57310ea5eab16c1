//! Embedded backend storing points in RocksDB.
//!
//! Column families:
//! - collections: collection name -> vector size (u64, big-endian)
//! - points: `{collection}\0{key}` -> JSON-encoded point
//!
//! Payload-id lookups and search scan the collection's key prefix. This keeps
//! the backend dependency-free beyond RocksDB and is adequate for
//! development and single-node use.

use std::path::Path;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use tracing::{debug, info};

use memory_types::Embedding;

use crate::client::{PointStream, VectorDbClient};
use crate::error::VectorDbError;
use crate::record::VectorRecord;

/// Column family name for collection definitions
pub const CF_COLLECTIONS: &str = "collections";

/// Column family name for stored points
pub const CF_POINTS: &str = "points";

const KEY_SEPARATOR: u8 = 0;

/// RocksDB-backed vector database.
pub struct LocalVectorDb {
    db: DB,
}

impl LocalVectorDb {
    /// Open or create a database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VectorDbError> {
        let path = path.as_ref();

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_COLLECTIONS, Options::default()),
            ColumnFamilyDescriptor::new(CF_POINTS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        info!(path = ?path, "Opened local vector database");
        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, VectorDbError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| VectorDbError::Database(format!("column family missing: {}", name)))
    }

    fn collection_prefix(collection: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(collection.len() + 1);
        prefix.extend_from_slice(collection.as_bytes());
        prefix.push(KEY_SEPARATOR);
        prefix
    }

    fn point_key(collection: &str, key: &str) -> Vec<u8> {
        let mut bytes = Self::collection_prefix(collection);
        bytes.extend_from_slice(key.as_bytes());
        bytes
    }

    fn validate_name(name: &str) -> Result<(), VectorDbError> {
        if name.is_empty() || name.as_bytes().contains(&KEY_SEPARATOR) {
            return Err(VectorDbError::InvalidRequest(format!(
                "invalid collection name: {:?}",
                name
            )));
        }
        Ok(())
    }

    /// Vector size of an existing collection.
    fn require_collection(&self, collection: &str) -> Result<usize, VectorDbError> {
        match self.db.get_cf(self.cf(CF_COLLECTIONS)?, collection.as_bytes())? {
            Some(bytes) => {
                let size: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    VectorDbError::Database(format!("corrupt collection entry: {}", collection))
                })?;
                Ok(u64::from_be_bytes(size) as usize)
            }
            None => Err(VectorDbError::Unavailable(format!(
                "collection not found: {}",
                collection
            ))),
        }
    }

    fn decode(bytes: &[u8], with_embedding: bool) -> Result<VectorRecord, VectorDbError> {
        let mut point: VectorRecord = serde_json::from_slice(bytes)?;
        if !with_embedding {
            point.embedding = Embedding::empty();
        }
        Ok(point)
    }

    fn read_point(
        &self,
        collection: &str,
        key: &str,
        with_embedding: bool,
    ) -> Result<Option<VectorRecord>, VectorDbError> {
        match self
            .db
            .get_cf(self.cf(CF_POINTS)?, Self::point_key(collection, key))?
        {
            Some(bytes) => Ok(Some(Self::decode(&bytes, with_embedding)?)),
            None => Ok(None),
        }
    }

    /// All points of a collection, in key order.
    fn scan(&self, collection: &str) -> Result<Vec<VectorRecord>, VectorDbError> {
        let prefix = Self::collection_prefix(collection);
        let iter = self.db.iterator_cf(
            self.cf(CF_POINTS)?,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut points = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            points.push(Self::decode(&value, true)?);
        }
        Ok(points)
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, VectorDbError> {
        let iter = self.db.iterator_cf(
            self.cf(CF_POINTS)?,
            IteratorMode::From(prefix, Direction::Forward),
        );

        let mut keys = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_vec());
        }
        Ok(keys)
    }
}

#[async_trait]
impl VectorDbClient for LocalVectorDb {
    async fn get_by_payload_id(
        &self,
        collection: &str,
        id: &str,
        with_embedding: bool,
    ) -> Result<Option<VectorRecord>, VectorDbError> {
        self.require_collection(collection)?;

        let found = self
            .scan(collection)?
            .into_iter()
            .find(|p| p.payload_id() == Some(id))
            .map(|mut p| {
                if !with_embedding {
                    p.embedding = Embedding::empty();
                }
                p
            });

        debug!(collection, id, found = found.is_some(), "Payload id lookup");
        Ok(found)
    }

    fn get_by_keys<'a>(
        &'a self,
        collection: &'a str,
        keys: &'a [String],
        with_embeddings: bool,
    ) -> PointStream<'a> {
        if let Err(e) = self.require_collection(collection) {
            return stream::once(futures::future::ready(Err(e))).boxed();
        }

        stream::iter(keys.iter())
            .filter_map(move |key| {
                futures::future::ready(self.read_point(collection, key, with_embeddings).transpose())
            })
            .boxed()
    }

    async fn delete_by_payload_id(&self, collection: &str, id: &str) -> Result<(), VectorDbError> {
        self.require_collection(collection)?;

        let points = self.cf(CF_POINTS)?;
        let mut batch = WriteBatch::default();
        let mut deleted = 0usize;
        for point in self.scan(collection)? {
            if point.payload_id() == Some(id) {
                batch.delete_cf(points, Self::point_key(collection, &point.key));
                deleted += 1;
            }
        }
        self.db.write(batch)?;

        debug!(collection, id, deleted, "Deleted by payload id");
        Ok(())
    }

    async fn delete_by_keys(&self, collection: &str, keys: &[String]) -> Result<(), VectorDbError> {
        self.require_collection(collection)?;

        let points = self.cf(CF_POINTS)?;
        let mut batch = WriteBatch::default();
        for key in keys {
            batch.delete_cf(points, Self::point_key(collection, key));
        }
        self.db.write(batch)?;

        debug!(collection, count = keys.len(), "Deleted by keys");
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        records: Vec<VectorRecord>,
    ) -> Result<(), VectorDbError> {
        let dimension = self.require_collection(collection)?;

        // Validate everything first so the batch is all-or-nothing
        for record in &records {
            if record.key.is_empty() {
                return Err(VectorDbError::InvalidRequest("empty point key".to_string()));
            }
            if record.embedding.dimension() != dimension {
                return Err(VectorDbError::DimensionMismatch {
                    expected: dimension,
                    actual: record.embedding.dimension(),
                });
            }
        }

        let points = self.cf(CF_POINTS)?;
        let mut batch = WriteBatch::default();
        for record in &records {
            batch.put_cf(
                points,
                Self::point_key(collection, &record.key),
                serde_json::to_vec(record)?,
            );
        }
        self.db.write(batch)?;

        debug!(collection, count = records.len(), "Upserted points");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &Embedding,
        limit: usize,
        min_score: f64,
        with_embeddings: bool,
    ) -> Result<Vec<(VectorRecord, f64)>, VectorDbError> {
        let dimension = self.require_collection(collection)?;
        if query.dimension() != dimension {
            return Err(VectorDbError::DimensionMismatch {
                expected: dimension,
                actual: query.dimension(),
            });
        }

        let mut scored: Vec<(VectorRecord, f64)> = self
            .scan(collection)?
            .into_iter()
            .filter_map(|p| {
                let score = query.cosine_similarity(&p.embedding)?;
                (score >= min_score).then_some((p, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        if !with_embeddings {
            for (point, _) in scored.iter_mut() {
                point.embedding = Embedding::empty();
            }
        }

        debug!(collection, limit, found = scored.len(), "Search complete");
        Ok(scored)
    }

    async fn create_collection(
        &self,
        name: &str,
        vector_size: usize,
    ) -> Result<(), VectorDbError> {
        Self::validate_name(name)?;
        if vector_size == 0 {
            return Err(VectorDbError::InvalidRequest(
                "vector size must be > 0".to_string(),
            ));
        }

        let collections = self.cf(CF_COLLECTIONS)?;
        if self.db.get_cf(collections, name.as_bytes())?.is_some() {
            debug!(name, "Collection already exists");
            return Ok(());
        }

        self.db
            .put_cf(collections, name.as_bytes(), (vector_size as u64).to_be_bytes())?;
        info!(name, vector_size, "Created collection");
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError> {
        Ok(self
            .db
            .get_cf(self.cf(CF_COLLECTIONS)?, name.as_bytes())?
            .is_some())
    }

    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError> {
        let iter = self
            .db
            .iterator_cf(self.cf(CF_COLLECTIONS)?, IteratorMode::Start);

        let mut names = Vec::new();
        for item in iter {
            let (key, _) = item?;
            names.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(names)
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorDbError> {
        // Collect keys first to avoid iterator invalidation
        let keys = self.keys_with_prefix(&Self::collection_prefix(name))?;

        let points = self.cf(CF_POINTS)?;
        let mut batch = WriteBatch::default();
        for key in &keys {
            batch.delete_cf(points, key);
        }
        batch.delete_cf(self.cf(CF_COLLECTIONS)?, name.as_bytes());
        self.db.write(batch)?;

        info!(name, points = keys.len(), "Deleted collection");
        Ok(())
    }
}

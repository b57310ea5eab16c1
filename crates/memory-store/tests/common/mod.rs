//! Recording in-memory backend for store tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use memory_types::{Embedding, MemoryRecord};
use memory_vector::{PointStream, VectorDbClient, VectorDbError, VectorRecord};

/// One backend call as observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetByPayloadId { collection: String, id: String },
    GetByKeys { collection: String, keys: Vec<String> },
    DeleteByPayloadId { collection: String, id: String },
    DeleteByKeys { collection: String, keys: Vec<String> },
    Upsert { collection: String, keys: Vec<String> },
    Search { collection: String, limit: usize },
    CreateCollection { name: String, vector_size: usize },
    CollectionExists { name: String },
    ListCollections,
    DeleteCollection { name: String },
}

/// Backend double that stores points in memory and records every call.
///
/// Points live in a single implicit collection; the collection argument is
/// only recorded.
#[derive(Default)]
pub struct MockVectorDbClient {
    points: Mutex<Vec<VectorRecord>>,
    collections: Mutex<HashMap<String, usize>>,
    failing_ids: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    unavailable: Mutex<bool>,
    calls: Mutex<Vec<Call>>,
}

impl MockVectorDbClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points(points: Vec<VectorRecord>) -> Self {
        let mock = Self::new();
        *mock.points.lock().unwrap() = points;
        mock
    }

    pub fn with_collection(self, name: &str, vector_size: usize) -> Self {
        self.collections
            .lock()
            .unwrap()
            .insert(name.to_string(), vector_size);
        self
    }

    /// Calls that name `id` fail with `Unavailable`.
    pub fn fail_on_id(self, id: &str) -> Self {
        self.failing_ids.lock().unwrap().insert(id.to_string());
        self
    }

    /// Calls that name `id` wait for `delay` before answering.
    pub fn delay_on_id(self, id: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(id.to_string(), delay);
        self
    }

    /// Every call fails with `Unavailable`.
    pub fn unavailable(self) -> Self {
        *self.unavailable.lock().unwrap() = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stored_keys(&self) -> Vec<String> {
        self.points
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.key.clone())
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_available(&self) -> Result<(), VectorDbError> {
        if *self.unavailable.lock().unwrap() {
            return Err(VectorDbError::Unavailable("mock backend down".to_string()));
        }
        Ok(())
    }

    async fn check_id(&self, id: &str) -> Result<(), VectorDbError> {
        let delay = self.delays.lock().unwrap().get(id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_available()?;
        if self.failing_ids.lock().unwrap().contains(id) {
            return Err(VectorDbError::Unavailable(format!("mock failure for {}", id)));
        }
        Ok(())
    }

    fn shaped(point: &VectorRecord, with_embedding: bool) -> VectorRecord {
        let mut point = point.clone();
        if !with_embedding {
            point.embedding = Embedding::empty();
        }
        point
    }
}

#[async_trait]
impl VectorDbClient for MockVectorDbClient {
    async fn get_by_payload_id(
        &self,
        collection: &str,
        id: &str,
        with_embedding: bool,
    ) -> Result<Option<VectorRecord>, VectorDbError> {
        self.record(Call::GetByPayloadId {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self.check_id(id).await?;

        let points = self.points.lock().unwrap();
        Ok(points
            .iter()
            .find(|p| p.payload_id() == Some(id))
            .map(|p| Self::shaped(p, with_embedding)))
    }

    fn get_by_keys<'a>(
        &'a self,
        collection: &'a str,
        keys: &'a [String],
        with_embeddings: bool,
    ) -> PointStream<'a> {
        self.record(Call::GetByKeys {
            collection: collection.to_string(),
            keys: keys.to_vec(),
        });
        if let Err(e) = self.check_available() {
            return stream::once(async move { Err(e) }).boxed();
        }

        let points = self.points.lock().unwrap();
        let found: Vec<Result<VectorRecord, VectorDbError>> = keys
            .iter()
            .filter_map(|key| points.iter().find(|p| &p.key == key))
            .map(|p| Ok(Self::shaped(p, with_embeddings)))
            .collect();
        stream::iter(found).boxed()
    }

    async fn delete_by_payload_id(&self, collection: &str, id: &str) -> Result<(), VectorDbError> {
        self.record(Call::DeleteByPayloadId {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self.check_id(id).await?;

        self.points
            .lock()
            .unwrap()
            .retain(|p| p.payload_id() != Some(id));
        Ok(())
    }

    async fn delete_by_keys(&self, collection: &str, keys: &[String]) -> Result<(), VectorDbError> {
        self.record(Call::DeleteByKeys {
            collection: collection.to_string(),
            keys: keys.to_vec(),
        });
        self.check_available()?;

        self.points
            .lock()
            .unwrap()
            .retain(|p| !keys.contains(&p.key));
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        records: Vec<VectorRecord>,
    ) -> Result<(), VectorDbError> {
        self.record(Call::Upsert {
            collection: collection.to_string(),
            keys: records.iter().map(|r| r.key.clone()).collect(),
        });
        self.check_available()?;

        let mut points = self.points.lock().unwrap();
        for record in records {
            match points.iter_mut().find(|p| p.key == record.key) {
                Some(existing) => *existing = record,
                None => points.push(record),
            }
        }
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
        self.record(Call::Search {
            collection: collection.to_string(),
            limit,
        });
        self.check_available()?;

        let points = self.points.lock().unwrap();
        let mut scored: Vec<(VectorRecord, f64)> = points
            .iter()
            .filter_map(|p| {
                query
                    .cosine_similarity(&p.embedding)
                    .filter(|score| *score >= min_score)
                    .map(|score| (Self::shaped(p, with_embeddings), score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn create_collection(
        &self,
        name: &str,
        vector_size: usize,
    ) -> Result<(), VectorDbError> {
        self.record(Call::CreateCollection {
            name: name.to_string(),
            vector_size,
        });
        self.check_available()?;
        self.collections
            .lock()
            .unwrap()
            .insert(name.to_string(), vector_size);
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError> {
        self.record(Call::CollectionExists {
            name: name.to_string(),
        });
        self.check_available()?;
        Ok(self.collections.lock().unwrap().contains_key(name))
    }

    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError> {
        self.record(Call::ListCollections);
        self.check_available()?;
        let mut names: Vec<String> = self.collections.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorDbError> {
        self.record(Call::DeleteCollection {
            name: name.to_string(),
        });
        self.check_available()?;
        self.collections.lock().unwrap().remove(name);
        Ok(())
    }
}

/// A stored point for record `id` under `key`.
pub fn point(id: &str, key: &str, values: Vec<f32>) -> VectorRecord {
    let record = MemoryRecord::local_record(
        id,
        format!("text for {}", id),
        format!("description for {}", id),
        Embedding::new(values),
    );
    VectorRecord::from_memory_record(&record, key).unwrap()
}

/// The three-record fixture: `Id`, `Id2`, `Id3` stored under `key1`..`key3`.
pub fn three_points() -> Vec<VectorRecord> {
    vec![
        point("Id", "key1", vec![1.0, 1.0, 1.0]),
        point("Id2", "key2", vec![1.0, 0.0, 0.0]),
        point("Id3", "key3", vec![0.0, 1.0, 0.0]),
    ]
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

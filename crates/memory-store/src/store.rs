//! Memory store over a vector database backend.
//!
//! Records are addressed two ways: by the caller-assigned metadata id stored
//! in the payload, or by the backend key. The two families of operations are
//! kept separate. Batch-by-id operations fan out one backend call per id;
//! batch-by-key operations are a single backend call.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use memory_types::{Embedding, MemoryRecord};
use memory_vector::{VectorDbClient, VectorDbError, VectorRecord};

use crate::config::{RemoveBatchMode, StoreConfig};
use crate::error::StoreError;

/// Race `fut` against `cancel`.
///
/// An already-cancelled token wins without polling `fut`, so no backend call
/// is issued. On cancellation in-flight work is dropped.
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        result = fut => result,
    }
}

fn into_record(point: VectorRecord) -> Result<MemoryRecord, StoreError> {
    point.into_memory_record().map_err(|e| match e {
        VectorDbError::Serialization(msg) => StoreError::Serialization(msg),
        other => StoreError::Backend(other),
    })
}

/// Keep the last record per metadata id.
///
/// Returns the surviving records in first-seen id order and, for every input
/// position, the index of its survivor.
fn latest_per_id(
    records: &[MemoryRecord],
) -> Result<(Vec<&MemoryRecord>, Vec<usize>), StoreError> {
    let mut slot_of: HashMap<&str, usize> = HashMap::new();
    let mut winners: Vec<&MemoryRecord> = Vec::new();
    let mut slots = Vec::with_capacity(records.len());

    for record in records {
        if record.id().is_empty() {
            return Err(StoreError::InvalidInput(
                "record metadata id must not be empty".to_string(),
            ));
        }
        let slot = match slot_of.entry(record.id()) {
            Entry::Occupied(entry) => {
                let slot = *entry.get();
                winners[slot] = record;
                slot
            }
            Entry::Vacant(entry) => {
                winners.push(record);
                *entry.insert(winners.len() - 1)
            }
        };
        slots.push(slot);
    }
    Ok((winners, slots))
}

/// Memory store bound to one backend client.
///
/// Holds no state besides the client and its config, so it can be cloned
/// freely and shared across tasks.
pub struct MemoryStore<C: VectorDbClient + ?Sized> {
    client: Arc<C>,
    config: StoreConfig,
}

impl<C: VectorDbClient + ?Sized> Clone for MemoryStore<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
        }
    }
}

impl<C: VectorDbClient + ?Sized> MemoryStore<C> {
    pub fn new(client: Arc<C>, config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        Ok(Self { client, config })
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ===== Lookups by metadata id =====

    /// Get the record whose metadata id is `id`.
    pub async fn get(
        &self,
        collection: &str,
        id: &str,
        with_embedding: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<MemoryRecord>, StoreError> {
        cancellable(cancel, self.fetch_by_id(collection, id, with_embedding)).await
    }

    /// Get the records for `ids`, one backend lookup per id.
    ///
    /// Ids with no record are left out. The result follows input order.
    pub async fn get_batch(
        &self,
        collection: &str,
        ids: &[String],
        with_embeddings: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        cancellable(cancel, async {
            let found: Vec<Option<MemoryRecord>> = stream::iter(ids)
                .map(|id| self.fetch_by_id(collection, id, with_embeddings))
                .buffered(self.config.max_concurrency)
                .try_collect()
                .await?;

            let records: Vec<MemoryRecord> = found.into_iter().flatten().collect();
            debug!(
                collection,
                requested = ids.len(),
                found = records.len(),
                "Batch get by id"
            );
            Ok(records)
        })
        .await
    }

    async fn fetch_by_id(
        &self,
        collection: &str,
        id: &str,
        with_embedding: bool,
    ) -> Result<Option<MemoryRecord>, StoreError> {
        self.client
            .get_by_payload_id(collection, id, with_embedding)
            .await?
            .map(into_record)
            .transpose()
    }

    // ===== Lookups by backend key =====

    /// Get the record stored under `key`.
    pub async fn get_with_key(
        &self,
        collection: &str,
        key: &str,
        with_embedding: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<MemoryRecord>, StoreError> {
        cancellable(cancel, async {
            let keys = [key.to_string()];
            let mut points = self.client.get_by_keys(collection, &keys, with_embedding);
            match points.try_next().await? {
                Some(point) => into_record(point).map(Some),
                None => Ok(None),
            }
        })
        .await
    }

    /// Get the records stored under `keys` in one backend call.
    ///
    /// Missing keys are left out; order is whatever the backend returns.
    pub async fn get_with_key_batch(
        &self,
        collection: &str,
        keys: &[String],
        with_embeddings: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        cancellable(cancel, async {
            self.client
                .get_by_keys(collection, keys, with_embeddings)
                .map_err(StoreError::from)
                .and_then(|point| future::ready(into_record(point)))
                .try_collect()
                .await
        })
        .await
    }

    // ===== Removal =====

    /// Remove the record whose metadata id is `id`. Removing nothing succeeds.
    pub async fn remove(
        &self,
        collection: &str,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        cancellable(cancel, async {
            self.client.delete_by_payload_id(collection, id).await?;
            Ok(())
        })
        .await
    }

    /// Remove the records for `ids`, one backend delete per id.
    ///
    /// There is no rollback. In `BestEffort` mode every delete is issued and
    /// failures are only logged. In `FailFast` mode the first failure stops
    /// further deletes and is returned; deletes already in flight still run.
    pub async fn remove_batch(
        &self,
        collection: &str,
        ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        cancellable(cancel, async {
            let deletes = stream::iter(ids).map(|id| async move {
                (id, self.client.delete_by_payload_id(collection, id).await)
            });

            match self.config.remove_batch_mode {
                RemoveBatchMode::BestEffort => {
                    let results: Vec<_> = deletes
                        .buffer_unordered(self.config.max_concurrency)
                        .collect()
                        .await;

                    let mut failed = 0usize;
                    for (id, result) in results {
                        if let Err(e) = result {
                            failed += 1;
                            warn!(collection, id = %id, error = %e, "Failed to remove record");
                        }
                    }
                    debug!(collection, count = ids.len(), failed, "Batch remove by id");
                    Ok(())
                }
                RemoveBatchMode::FailFast => {
                    deletes
                        .buffered(self.config.max_concurrency)
                        .map(|(_, result)| result.map_err(StoreError::from))
                        .try_for_each(|()| future::ready(Ok::<_, StoreError>(())))
                        .await?;
                    debug!(collection, count = ids.len(), "Batch remove by id");
                    Ok(())
                }
            }
        })
        .await
    }

    /// Remove the record stored under `key`.
    pub async fn remove_with_key(
        &self,
        collection: &str,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        cancellable(cancel, async {
            self.client
                .delete_by_keys(collection, &[key.to_string()])
                .await?;
            Ok(())
        })
        .await
    }

    /// Remove the records stored under `keys` in one backend call.
    pub async fn remove_with_key_batch(
        &self,
        collection: &str,
        keys: &[String],
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        cancellable(cancel, async {
            self.client.delete_by_keys(collection, keys).await?;
            Ok(())
        })
        .await
    }

    // ===== Writes =====

    /// Insert or replace a record, returning the key it is stored under.
    pub async fn upsert(
        &self,
        collection: &str,
        record: &MemoryRecord,
        cancel: &CancellationToken,
    ) -> Result<String, StoreError> {
        let mut keys = self
            .upsert_batch(collection, std::slice::from_ref(record), cancel)
            .await?;
        keys.pop()
            .ok_or_else(|| StoreError::InvalidInput("upsert produced no key".to_string()))
    }

    /// Insert or replace records in one backend call.
    ///
    /// A metadata id maps to at most one stored point. Within a batch the last
    /// record for an id wins and every position for that id gets the same key.
    /// A record keeps its key when it has one; otherwise the key of the stored
    /// point with the same id is reused, and failing that a new UUID is
    /// assigned. When an explicit key replaces a different stored key, the old
    /// point is deleted after the write. Returns the keys in input order.
    pub async fn upsert_batch(
        &self,
        collection: &str,
        records: &[MemoryRecord],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, StoreError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let (winners, slots) = latest_per_id(records)?;

        cancellable(cancel, async {
            let resolved: Vec<(String, Option<String>)> = stream::iter(&winners)
                .map(|record| self.resolve_key(collection, record))
                .buffered(self.config.max_concurrency)
                .try_collect()
                .await?;

            let points = winners
                .iter()
                .zip(&resolved)
                .map(|(record, (key, _))| {
                    VectorRecord::from_memory_record(record, key.clone()).map_err(|e| match e {
                        VectorDbError::Serialization(msg) => StoreError::Serialization(msg),
                        other => StoreError::Backend(other),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            self.client.upsert(collection, points).await?;

            let written: HashSet<&str> = resolved.iter().map(|(key, _)| key.as_str()).collect();
            let stale: Vec<String> = resolved
                .iter()
                .filter_map(|(_, old)| old.clone())
                .filter(|old| !written.contains(old.as_str()))
                .collect();
            if !stale.is_empty() {
                self.client.delete_by_keys(collection, &stale).await?;
                debug!(collection, count = stale.len(), "Removed points replaced under new keys");
            }

            info!(
                collection,
                count = records.len(),
                written = resolved.len(),
                "Upserted records"
            );
            Ok(slots.iter().map(|&slot| resolved[slot].0.clone()).collect())
        })
        .await
    }

    /// Resolve the key to write `record` under, plus any stored key it replaces.
    async fn resolve_key(
        &self,
        collection: &str,
        record: &MemoryRecord,
    ) -> Result<(String, Option<String>), StoreError> {
        let existing = self
            .client
            .get_by_payload_id(collection, record.id(), false)
            .await?
            .map(|point| point.key);
        let explicit = record.key.as_deref().filter(|k| !k.is_empty());

        Ok(match (explicit, existing) {
            (Some(key), Some(old)) if old != key => (key.to_string(), Some(old)),
            (Some(key), _) => (key.to_string(), None),
            (None, Some(old)) => (old, None),
            (None, None) => (Uuid::new_v4().to_string(), None),
        })
    }

    // ===== Search =====

    /// Nearest records to `embedding`, best first.
    pub async fn get_nearest_matches(
        &self,
        collection: &str,
        embedding: &Embedding,
        limit: usize,
        min_relevance_score: f64,
        with_embeddings: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<(MemoryRecord, f64)>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        if embedding.is_empty() {
            return Err(StoreError::InvalidInput(
                "query embedding must not be empty".to_string(),
            ));
        }

        cancellable(cancel, async {
            let matches = self
                .client
                .search(collection, embedding, limit, min_relevance_score, with_embeddings)
                .await?;
            matches
                .into_iter()
                .map(|(point, score)| into_record(point).map(|record| (record, score)))
                .collect()
        })
        .await
    }

    /// The single nearest record to `embedding`, if any scores high enough.
    pub async fn get_nearest_match(
        &self,
        collection: &str,
        embedding: &Embedding,
        min_relevance_score: f64,
        with_embedding: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<(MemoryRecord, f64)>, StoreError> {
        let matches = self
            .get_nearest_matches(
                collection,
                embedding,
                1,
                min_relevance_score,
                with_embedding,
                cancel,
            )
            .await?;
        Ok(matches.into_iter().next())
    }

    // ===== Collections =====

    /// Create a collection unless it already exists.
    ///
    /// `vector_size` falls back to the configured default.
    pub async fn create_collection(
        &self,
        name: &str,
        vector_size: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        let size = vector_size.unwrap_or(self.config.default_vector_size);
        if size == 0 {
            return Err(StoreError::InvalidInput(
                "vector size must be greater than 0".to_string(),
            ));
        }

        cancellable(cancel, async {
            if self.client.collection_exists(name).await? {
                debug!(name, "Collection already exists");
                return Ok(());
            }
            self.client.create_collection(name, size).await?;
            info!(name, vector_size = size, "Created collection");
            Ok(())
        })
        .await
    }

    pub async fn does_collection_exist(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, StoreError> {
        cancellable(cancel, async { Ok(self.client.collection_exists(name).await?) }).await
    }

    pub async fn get_collections(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, StoreError> {
        cancellable(cancel, async { Ok(self.client.list_collections().await?) }).await
    }

    pub async fn delete_collection(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        cancellable(cancel, async {
            self.client.delete_collection(name).await?;
            info!(name, "Deleted collection");
            Ok(())
        })
        .await
    }
}

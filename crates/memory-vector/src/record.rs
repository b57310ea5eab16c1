//! Point representation shared by all backends.
//!
//! A point is a vector plus a JSON payload, addressed by a backend key.
//! The payload holds the serialized record metadata; backends filter on its
//! `id` field for metadata-id lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use memory_types::{Embedding, MemoryRecord, MemoryRecordMetadata};

use crate::error::VectorDbError;

/// Payload field holding the caller-assigned record id
pub const PAYLOAD_ID_FIELD: &str = "id";

/// Payload field holding the record timestamp (RFC 3339)
pub const PAYLOAD_TIMESTAMP_FIELD: &str = "timestamp";

/// A stored vector with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Backend key
    pub key: String,
    /// Stored vector; empty when fetched without vectors
    pub embedding: Embedding,
    /// Metadata bag
    pub payload: Map<String, Value>,
}

impl VectorRecord {
    pub fn new(key: impl Into<String>, embedding: Embedding, payload: Map<String, Value>) -> Self {
        Self {
            key: key.into(),
            embedding,
            payload,
        }
    }

    /// Build a point from a serialized metadata object.
    pub fn from_json(
        key: impl Into<String>,
        embedding: Embedding,
        json: &str,
    ) -> Result<Self, VectorDbError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(payload) => Ok(Self::new(key, embedding, payload)),
            other => Err(VectorDbError::Serialization(format!(
                "payload must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Build a point for a memory record stored under `key`.
    pub fn from_memory_record(
        record: &MemoryRecord,
        key: impl Into<String>,
    ) -> Result<Self, VectorDbError> {
        let mut payload = record.metadata.to_payload()?;
        if let Some(ts) = record.timestamp {
            payload.insert(
                PAYLOAD_TIMESTAMP_FIELD.to_string(),
                Value::String(ts.to_rfc3339()),
            );
        }
        Ok(Self::new(key, record.embedding.clone(), payload))
    }

    /// Payload serialized back to JSON text.
    pub fn payload_json(&self) -> Result<String, VectorDbError> {
        Ok(serde_json::to_string(&self.payload)?)
    }

    /// The caller-assigned id stored in the payload, if any.
    pub fn payload_id(&self) -> Option<&str> {
        self.payload.get(PAYLOAD_ID_FIELD).and_then(Value::as_str)
    }

    /// Timestamp stored in the payload, if present and well-formed.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.payload
            .get(PAYLOAD_TIMESTAMP_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Normalize into a memory record carrying this point's key.
    pub fn into_memory_record(self) -> Result<MemoryRecord, VectorDbError> {
        let metadata = MemoryRecordMetadata::from_payload(&self.payload)?;
        let timestamp = self.timestamp();
        Ok(MemoryRecord {
            metadata,
            embedding: self.embedding,
            key: Some(self.key),
            timestamp,
        })
    }
}

//! Memory record model.
//!
//! A record is addressed two ways:
//! - `metadata.id`: caller-assigned, stable, used for application-level lookup
//! - `key`: backend-assigned point key, only meaningful once persisted
//!
//! The metadata serializes to a flat JSON object which backends store as the
//! point payload. Decoding ignores unknown fields, so backends may add their
//! own payload entries alongside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::embedding::Embedding;
use crate::error::MemoryError;

/// Metadata carried in a backend payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecordMetadata {
    /// Whether the record points at data held elsewhere
    #[serde(default)]
    pub is_reference: bool,

    /// Name of the external source; empty for local records
    #[serde(default)]
    pub external_source_name: String,

    /// Caller-assigned identifier, unique within a collection
    pub id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub text: String,

    /// Free-form caller data, opaque to the store
    #[serde(default)]
    pub additional_metadata: String,
}

impl MemoryRecordMetadata {
    /// Decode metadata from its JSON text form.
    pub fn from_json(json: &str) -> Result<Self, MemoryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode metadata from a payload object.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, MemoryError> {
        Ok(serde_json::from_value(Value::Object(payload.clone()))?)
    }

    /// Encode metadata to its JSON text form.
    pub fn to_json(&self) -> Result<String, MemoryError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode metadata as a payload object.
    pub fn to_payload(&self) -> Result<Map<String, Value>, MemoryError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(MemoryError::InvalidInput(format!(
                "metadata encoded to non-object: {}",
                other
            ))),
        }
    }
}

/// A normalized memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub metadata: MemoryRecordMetadata,

    pub embedding: Embedding,

    /// Backend-assigned key; `None` until persisted
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MemoryRecord {
    /// Create a record for data owned by the caller.
    pub fn local_record(
        id: impl Into<String>,
        text: impl Into<String>,
        description: impl Into<String>,
        embedding: Embedding,
    ) -> Self {
        Self {
            metadata: MemoryRecordMetadata {
                is_reference: false,
                external_source_name: String::new(),
                id: id.into(),
                description: description.into(),
                text: text.into(),
                additional_metadata: String::new(),
            },
            embedding,
            key: None,
            timestamp: None,
        }
    }

    /// Create a record pointing at data in an external source.
    pub fn reference_record(
        external_id: impl Into<String>,
        source_name: impl Into<String>,
        description: impl Into<String>,
        embedding: Embedding,
    ) -> Self {
        Self {
            metadata: MemoryRecordMetadata {
                is_reference: true,
                external_source_name: source_name.into(),
                id: external_id.into(),
                description: description.into(),
                text: String::new(),
                additional_metadata: String::new(),
            },
            embedding,
            key: None,
            timestamp: None,
        }
    }

    /// Build a record from serialized metadata.
    pub fn from_json_metadata(
        json: &str,
        embedding: Embedding,
        key: Option<String>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Self, MemoryError> {
        Ok(Self {
            metadata: MemoryRecordMetadata::from_json(json)?,
            embedding,
            key,
            timestamp,
        })
    }

    /// Set the backend key (builder pattern).
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the timestamp (builder pattern).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the free-form caller metadata (builder pattern).
    pub fn with_additional_metadata(mut self, additional: impl Into<String>) -> Self {
        self.metadata.additional_metadata = additional.into();
        self
    }

    /// Serialized metadata as stored in a backend payload.
    pub fn serialize_metadata(&self) -> Result<String, MemoryError> {
        self.metadata.to_json()
    }

    /// Convenience accessor for the metadata id.
    pub fn id(&self) -> &str {
        &self.metadata.id
    }
}

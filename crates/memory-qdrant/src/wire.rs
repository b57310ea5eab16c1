//! Request and response bodies for Qdrant's REST API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use memory_types::Embedding;
use memory_vector::{VectorRecord, PAYLOAD_ID_FIELD};

/// Standard response envelope: `{"result": ..., "status": "ok", "time": ...}`
#[derive(Debug, Deserialize)]
pub(crate) struct QdrantResponse<T> {
    pub result: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Point {
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoredPoint {
    pub id: Value,
    pub score: f64,
    #[serde(default)]
    pub vector: Option<Value>,
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrollResult {
    pub points: Vec<Point>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionsResult {
    pub collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionDescription {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Filter {
    pub must: Vec<FieldCondition>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FieldCondition {
    pub key: String,
    #[serde(rename = "match")]
    pub match_value: MatchValue,
}

#[derive(Debug, Serialize)]
pub(crate) struct MatchValue {
    pub value: String,
}

impl Filter {
    /// Filter matching points whose payload `id` equals `id`.
    pub fn payload_id(id: &str) -> Self {
        Self {
            must: vec![FieldCondition {
                key: PAYLOAD_ID_FIELD.to_string(),
                match_value: MatchValue {
                    value: id.to_string(),
                },
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ScrollRequest {
    pub filter: Filter,
    pub limit: usize,
    pub with_payload: bool,
    pub with_vector: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetPointsRequest {
    pub ids: Vec<Value>,
    pub with_payload: bool,
    pub with_vector: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum DeleteRequest {
    Points { points: Vec<Value> },
    Filter { filter: Filter },
}

#[derive(Debug, Serialize)]
pub(crate) struct UpsertRequest {
    pub points: Vec<Point>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest<'a> {
    pub vector: &'a [f32],
    pub limit: usize,
    pub with_payload: bool,
    pub with_vector: bool,
    pub score_threshold: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCollectionRequest {
    pub vectors: VectorParams,
}

#[derive(Debug, Serialize)]
pub(crate) struct VectorParams {
    pub size: usize,
    pub distance: &'static str,
}

/// Point ids are UUID strings or unsigned integers.
fn key_from_id(id: Value) -> String {
    match id {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Inverse of `key_from_id`: canonical decimal keys go back as integers.
pub(crate) fn id_from_key(key: &str) -> Value {
    match key.parse::<u64>() {
        Ok(n) if n.to_string() == key => Value::from(n),
        _ => Value::String(key.to_string()),
    }
}

pub(crate) fn ids_from_keys(keys: &[String]) -> Vec<Value> {
    keys.iter().map(|k| id_from_key(k)).collect()
}

/// Plain (unnamed) vectors only; anything else reads as empty.
fn embedding_from_vector(vector: Option<Value>) -> Embedding {
    match vector {
        Some(Value::Array(values)) => Embedding::new(
            values
                .iter()
                .filter_map(Value::as_f64)
                .map(|v| v as f32)
                .collect(),
        ),
        _ => Embedding::empty(),
    }
}

impl From<Point> for VectorRecord {
    fn from(point: Point) -> Self {
        VectorRecord::new(
            key_from_id(point.id),
            embedding_from_vector(point.vector),
            point.payload.unwrap_or_default(),
        )
    }
}

impl From<ScoredPoint> for (VectorRecord, f64) {
    fn from(point: ScoredPoint) -> Self {
        let record = VectorRecord::new(
            key_from_id(point.id),
            embedding_from_vector(point.vector),
            point.payload.unwrap_or_default(),
        );
        (record, point.score)
    }
}

impl From<VectorRecord> for Point {
    fn from(record: VectorRecord) -> Self {
        let vector = record
            .embedding
            .values
            .iter()
            .map(|v| Value::from(*v as f64))
            .collect();
        Point {
            id: id_from_key(&record.key),
            vector: Some(Value::Array(vector)),
            payload: Some(record.payload),
        }
    }
}

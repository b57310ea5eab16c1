//! Qdrant REST client.
//!
//! Each trait operation maps to one HTTP request. No retries are made here;
//! transport failures and server faults surface as `VectorDbError::Unavailable`.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;

use memory_types::Embedding;
use memory_vector::{PointStream, VectorDbClient, VectorDbError, VectorRecord};

use crate::config::QdrantConfig;
use crate::wire::{
    ids_from_keys, CollectionsResult, CreateCollectionRequest, DeleteRequest, Filter,
    GetPointsRequest, Point, QdrantResponse, ScoredPoint, ScrollRequest, ScrollResult,
    SearchRequest, UpsertRequest, VectorParams,
};

/// Qdrant backend implementation.
pub struct QdrantClient {
    client: Client,
    base_url: Url,
    config: QdrantConfig,
}

impl QdrantClient {
    /// Create a new client. No request is made until the first operation.
    pub fn new(config: QdrantConfig) -> Result<Self, VectorDbError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| VectorDbError::InvalidRequest(format!("invalid base url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(VectorDbError::InvalidRequest(format!(
                "invalid base url: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VectorDbError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Build `{base}/{segments...}`, optionally with `?wait=true`.
    fn url(&self, segments: &[&str], wait: bool) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if wait {
            url.query_pairs_mut().append_pair("wait", "true");
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.config.api_key {
            Some(key) => builder.header("api-key", key.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and map transport and status failures.
    async fn send(
        &self,
        builder: RequestBuilder,
        collection: Option<&str>,
    ) -> Result<Response, VectorDbError> {
        let response = Self::transmit(builder).await?;
        Self::check_status(response, collection).await
    }

    async fn transmit(builder: RequestBuilder) -> Result<Response, VectorDbError> {
        builder
            .send()
            .await
            .map_err(|e| VectorDbError::Unavailable(e.to_string()))
    }

    /// Pass successful responses through; map everything else to an error.
    async fn check_status(
        response: Response,
        collection: Option<&str>,
    ) -> Result<Response, VectorDbError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match (status, collection) {
            (StatusCode::NOT_FOUND, Some(name)) => {
                VectorDbError::Unavailable(format!("collection not found: {}", name))
            }
            (s, _) if s.is_server_error() => {
                VectorDbError::Unavailable(format!("HTTP {}: {}", s, body))
            }
            (s, _) => VectorDbError::InvalidRequest(format!("HTTP {}: {}", s, body)),
        })
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, VectorDbError> {
        let envelope: QdrantResponse<T> = response
            .json()
            .await
            .map_err(|e| VectorDbError::Serialization(e.to_string()))?;
        Ok(envelope.result)
    }

    async fn fetch_points(
        &self,
        collection: &str,
        keys: &[String],
        with_embeddings: bool,
    ) -> Result<Vec<VectorRecord>, VectorDbError> {
        let url = self.url(&["collections", collection, "points"], false);
        let body = GetPointsRequest {
            ids: ids_from_keys(keys),
            with_payload: true,
            with_vector: with_embeddings,
        };

        let response = self
            .send(self.request(Method::POST, url).json(&body), Some(collection))
            .await?;
        let points: Vec<Point> = Self::parse(response).await?;

        debug!(collection, requested = keys.len(), found = points.len(), "Fetched points by key");
        Ok(points.into_iter().map(VectorRecord::from).collect())
    }
}

#[async_trait]
impl VectorDbClient for QdrantClient {
    async fn get_by_payload_id(
        &self,
        collection: &str,
        id: &str,
        with_embedding: bool,
    ) -> Result<Option<VectorRecord>, VectorDbError> {
        let url = self.url(&["collections", collection, "points", "scroll"], false);
        let body = ScrollRequest {
            filter: Filter::payload_id(id),
            limit: 1,
            with_payload: true,
            with_vector: with_embedding,
        };

        let response = self
            .send(self.request(Method::POST, url).json(&body), Some(collection))
            .await?;
        let result: ScrollResult = Self::parse(response).await?;

        debug!(collection, id, found = !result.points.is_empty(), "Payload id lookup");
        Ok(result.points.into_iter().next().map(VectorRecord::from))
    }

    fn get_by_keys<'a>(
        &'a self,
        collection: &'a str,
        keys: &'a [String],
        with_embeddings: bool,
    ) -> PointStream<'a> {
        if keys.is_empty() {
            return stream::empty().boxed();
        }

        stream::once(self.fetch_points(collection, keys, with_embeddings))
            .map_ok(|points| stream::iter(points.into_iter().map(Ok::<_, VectorDbError>)))
            .try_flatten()
            .boxed()
    }

    async fn delete_by_payload_id(&self, collection: &str, id: &str) -> Result<(), VectorDbError> {
        let url = self.url(&["collections", collection, "points", "delete"], true);
        let body = DeleteRequest::Filter {
            filter: Filter::payload_id(id),
        };

        self.send(self.request(Method::POST, url).json(&body), Some(collection))
            .await?;
        debug!(collection, id, "Deleted by payload id");
        Ok(())
    }

    async fn delete_by_keys(&self, collection: &str, keys: &[String]) -> Result<(), VectorDbError> {
        if keys.is_empty() {
            return Ok(());
        }

        let url = self.url(&["collections", collection, "points", "delete"], true);
        let body = DeleteRequest::Points {
            points: ids_from_keys(keys),
        };

        self.send(self.request(Method::POST, url).json(&body), Some(collection))
            .await?;
        debug!(collection, count = keys.len(), "Deleted by keys");
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        records: Vec<VectorRecord>,
    ) -> Result<(), VectorDbError> {
        if records.is_empty() {
            return Ok(());
        }

        let count = records.len();
        let url = self.url(&["collections", collection, "points"], true);
        let body = UpsertRequest {
            points: records.into_iter().map(Point::from).collect(),
        };

        self.send(self.request(Method::PUT, url).json(&body), Some(collection))
            .await?;
        debug!(collection, count, "Upserted points");
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
        let url = self.url(&["collections", collection, "points", "search"], false);
        let body = SearchRequest {
            vector: &query.values,
            limit,
            with_payload: true,
            with_vector: with_embeddings,
            score_threshold: min_score,
        };

        let response = self
            .send(self.request(Method::POST, url).json(&body), Some(collection))
            .await?;
        let points: Vec<ScoredPoint> = Self::parse(response).await?;

        debug!(collection, limit, found = points.len(), "Search complete");
        Ok(points.into_iter().map(Into::into).collect())
    }

    async fn create_collection(
        &self,
        name: &str,
        vector_size: usize,
    ) -> Result<(), VectorDbError> {
        let url = self.url(&["collections", name], false);
        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: vector_size,
                distance: "Cosine",
            },
        };

        self.send(self.request(Method::PUT, url).json(&body), None)
            .await?;
        debug!(name, vector_size, "Created collection");
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError> {
        let url = self.url(&["collections", name], false);
        let response = Self::transmit(self.request(Method::GET, url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check_status(response, Some(name)).await?;
        Ok(true)
    }

    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError> {
        let url = self.url(&["collections"], false);
        let response = self.send(self.request(Method::GET, url), None).await?;
        let result: CollectionsResult = Self::parse(response).await?;
        Ok(result.collections.into_iter().map(|c| c.name).collect())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorDbError> {
        let url = self.url(&["collections", name], false);
        self.send(self.request(Method::DELETE, url), None).await?;
        debug!(name, "Deleted collection");
        Ok(())
    }
}

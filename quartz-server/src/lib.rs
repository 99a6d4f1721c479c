//! QuartzDB HTTP API Server Library
//!
//! This module provides a REST API for QuartzDB's key/value store and its
//! layered ANN vector index (`annidx-core`/`annidx-store`).
//!
//! This crate is the one place in the workspace that plays the "external
//! collaborator" role `annidx-core` assumes throughout: it owns scalar-vector
//! (de)serialization (`encode_vector`/`decode_vector` below, plain JSON of
//! `f32`s — `annidx_core::wire` is test-only scaffolding, not this), and it
//! writes each base vector at `(predicate, id)` itself before calling
//! `annidx_core::insert`, which never does so.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use annidx_core::filter::AcceptAll;
use annidx_core::keys::data_key;
use annidx_core::{IndexConfig, IndexError};
use annidx_store::MemPostingStore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// Entity id type used by the vector index, matching `annidx_core`.
pub type VectorId = u64;

/// The distance metric an index was declared with. `annidx-core` only
/// implements Euclidean distance (spec Non-goal: "tuning of distance
/// metrics beyond Euclidean"); this is accepted and stored purely for API
/// compatibility and is surfaced back unchanged in responses — it never
/// changes how a search actually orders candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    Cosine,
    Euclidean,
    DotProduct,
}

impl DistanceMetric {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Some(Self::Cosine),
            "euclidean" => Some(Self::Euclidean),
            "dotproduct" | "dot_product" => Some(Self::DotProduct),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::DotProduct => "dotproduct",
        }
    }
}

/// Per-named-index configuration and bookkeeping. The index itself has no
/// persistent object — `annidx-core` is a set of free functions over the
/// shared store — so this is just the metadata a caller needs to drive it.
pub struct IndexMeta {
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub config: IndexConfig,
    pub num_vectors: AtomicUsize,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemPostingStore>,
    pub indexes: Arc<RwLock<HashMap<String, IndexMeta>>>,
    pub next_vector_ids: Arc<RwLock<HashMap<String, VectorId>>>,
    pub vector_metadata: Arc<RwLock<HashMap<(String, VectorId), String>>>,
    pub rng: Arc<Mutex<ChaCha8Rng>>,
}

impl AppState {
    pub fn new(store: Arc<MemPostingStore>) -> Self {
        Self {
            store,
            indexes: Arc::new(RwLock::new(HashMap::new())),
            next_vector_ids: Arc::new(RwLock::new(HashMap::new())),
            vector_metadata: Arc::new(RwLock::new(HashMap::new())),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(rand::random()))),
        }
    }
}

/// Base-vector wire encoding this server owns end to end: plain JSON of
/// `f32`s, decoded to `f64` only at the `annidx-core` call boundary.
fn encode_vector(v: &[f32]) -> Vec<u8> {
    serde_json::to_vec(v).expect("serializing a &[f32] to JSON cannot fail")
}

fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::BadRequest(format!("corrupt vector record: {e}")))
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("storage error: {0}")]
    Store(#[from] annidx_store::StoreError),

    #[error("vector index error: {0}")]
    Index(#[from] IndexError),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("vector not found: {0}")]
    VectorNotFound(u64),

    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                e.to_string(),
            ),
            ApiError::Index(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "vector_error",
                e.to_string(),
            ),
            ApiError::NotFound(key) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Key '{}' not found", key),
            ),
            ApiError::VectorNotFound(id) => (
                StatusCode::NOT_FOUND,
                "vector_not_found",
                format!("Vector with id {} not found", id),
            ),
            ApiError::IndexNotFound(name) => (
                StatusCode::NOT_FOUND,
                "index_not_found",
                format!("Index '{}' not found", name),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Request body for PUT operations
#[derive(Debug, Deserialize)]
pub struct PutRequest {
    pub value: String,
}

/// Response for GET operations
#[derive(Debug, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: String,
}

/// Response for PUT operations
#[derive(Debug, Serialize)]
pub struct PutResponse {
    pub key: String,
    pub message: String,
}

/// Response for DELETE operations
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub key: String,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Stats response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub backend: String,
    pub read_ts: u64,
    pub num_indexes: usize,
}

/// GET /api/v1/kv/{key} - Retrieve a value by key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>, ApiError> {
    let value = state.store.get_latest(key.as_bytes()).await?;

    match value {
        Some(v) => {
            let value_str = String::from_utf8_lossy(&v).to_string();
            Ok(Json(GetResponse {
                key,
                value: value_str,
            }))
        }
        None => Err(ApiError::NotFound(key)),
    }
}

/// PUT /api/v1/kv/{key} - Store a key-value pair
pub async fn put_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<PutRequest>,
) -> Result<Json<PutResponse>, ApiError> {
    if key.is_empty() {
        return Err(ApiError::BadRequest("Key cannot be empty".to_string()));
    }

    state
        .store
        .put(key.as_bytes(), payload.value.into_bytes())
        .await?;

    Ok(Json(PutResponse {
        key,
        message: "Value stored successfully".to_string(),
    }))
}

/// DELETE /api/v1/kv/{key} - Delete a key-value pair
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let exists = state.store.get_latest(key.as_bytes()).await?.is_some();

    if !exists {
        return Err(ApiError::NotFound(key));
    }

    state.store.delete(key.as_bytes()).await?;

    Ok(Json(DeleteResponse {
        key,
        message: "Key deleted successfully".to_string(),
    }))
}

/// GET /api/v1/health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/v1/stats - Get storage statistics
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let num_indexes = state.indexes.read().await.len();
    Json(StatsResponse {
        backend: "annidx-store in-memory MVCC".to_string(),
        read_ts: state.store.latest_ts(),
        num_indexes,
    })
}

// ============================================================================
// Vector Search API Types and Handlers
// ============================================================================

/// Request to initialize vector index
#[derive(Debug, Deserialize)]
pub struct InitVectorIndexRequest {
    pub dimension: usize,
    #[serde(default = "default_distance_metric")]
    pub metric: String,
    #[serde(default)]
    pub m: Option<usize>,
    #[serde(default)]
    pub ef_construction: Option<usize>,
}

fn default_distance_metric() -> String {
    "cosine".to_string()
}

/// Response for vector index initialization
#[derive(Debug, Serialize)]
pub struct InitVectorIndexResponse {
    pub message: String,
    pub dimension: usize,
    pub metric: String,
}

/// Request to insert a vector
#[derive(Debug, Deserialize)]
pub struct InsertVectorRequest {
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: Option<String>,
}

/// Response for vector insertion
#[derive(Debug, Serialize)]
pub struct InsertVectorResponse {
    pub id: VectorId,
    pub message: String,
}

/// Request to search for similar vectors
#[derive(Debug, Deserialize)]
pub struct SearchVectorsRequest {
    pub vector: Vec<f32>,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    10
}

/// Response for vector search
#[derive(Debug, Serialize)]
pub struct SearchVectorsResponse {
    pub results: Vec<VectorSearchResult>,
}

#[derive(Debug, Serialize)]
pub struct VectorSearchResult {
    pub id: VectorId,
    pub distance: f32,
    pub vector: Vec<f32>,
    pub metadata: Option<String>,
}

/// Response for vector retrieval
#[derive(Debug, Serialize)]
pub struct GetVectorResponse {
    pub id: VectorId,
    pub vector: Vec<f32>,
    pub metadata: Option<String>,
}

/// Response for vector deletion
#[derive(Debug, Serialize)]
pub struct DeleteVectorResponse {
    pub id: VectorId,
    pub message: String,
}

/// POST /api/v1/indexes/{name} - Initialize or open a named vector index
pub async fn init_vector_index_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<InitVectorIndexRequest>,
) -> Result<Json<InitVectorIndexResponse>, ApiError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return Err(ApiError::BadRequest("Invalid index name".to_string()));
    }

    let metric = DistanceMetric::parse(&req.metric).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid distance metric: {}. Must be one of: cosine, euclidean, dotproduct",
            req.metric
        ))
    })?;

    let mut indexes = state.indexes.write().await;
    if let Some(existing) = indexes.get(&name) {
        if existing.dimension != req.dimension {
            return Err(ApiError::BadRequest(format!(
                "Index '{}' already exists with dimension {} (requested: {}). Please delete the existing index or use the existing configuration.",
                name, existing.dimension, req.dimension
            )));
        }
        if existing.metric != metric {
            return Err(ApiError::BadRequest(format!(
                "Index '{}' already exists with metric {:?} (requested: {:?}). Please delete the existing index or use the existing configuration.",
                name, existing.metric, metric
            )));
        }
        tracing::info!(index = %name, "reopened existing vector index");
    } else {
        let config = IndexConfig {
            max_levels: IndexConfig::default().max_levels,
            ef_construction: req.ef_construction.unwrap_or(IndexConfig::default().ef_construction),
            ef_search: IndexConfig::default().ef_search,
            max_neighbors: req.m,
        };
        tracing::info!(index = %name, dimension = req.dimension, metric = metric.as_str(), "created vector index");
        indexes.insert(
            name.clone(),
            IndexMeta {
                dimension: req.dimension,
                metric,
                config,
                num_vectors: AtomicUsize::new(0),
            },
        );
        state.next_vector_ids.write().await.entry(name.clone()).or_insert(1);
    }

    Ok(Json(InitVectorIndexResponse {
        message: format!("Vector index '{}' initialized successfully", name),
        dimension: req.dimension,
        metric: metric.as_str().to_string(),
    }))
}

/// POST /api/v1/indexes/{name}/vectors - Insert a vector into a named index
pub async fn insert_vector_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<InsertVectorRequest>,
) -> Result<Json<InsertVectorResponse>, ApiError> {
    let dimension = {
        let indexes = state.indexes.read().await;
        let meta = indexes.get(&name).ok_or_else(|| ApiError::IndexNotFound(name.clone()))?;
        meta.dimension
    };
    if req.vector.len() != dimension {
        return Err(ApiError::BadRequest(format!(
            "vector has dimension {} but index '{}' expects {}",
            req.vector.len(),
            name,
            dimension
        )));
    }

    let id = {
        let mut next_ids = state.next_vector_ids.write().await;
        let id = next_ids.entry(name.clone()).or_insert(1);
        let current = *id;
        *id += 1;
        current
    };

    let vec64: Vec<f64> = req.vector.iter().map(|&x| x as f64).collect();

    // The index core never writes the base vector itself — this crate
    // owns that, as the external caller `annidx-core` expects.
    state
        .store
        .put(&data_key(&name, id), encode_vector(&req.vector))
        .await?;

    {
        let indexes = state.indexes.read().await;
        let meta = indexes.get(&name).ok_or_else(|| ApiError::IndexNotFound(name.clone()))?;
        let txn = state.store.begin();
        let mut rng = state.rng.lock().await;
        annidx_core::insert(
            &state.store,
            &txn,
            &name,
            id,
            &vec64,
            &meta.config,
            &mut *rng,
            &CancellationToken::new(),
        )
        .await?;
        txn.commit().await?;
        meta.num_vectors.fetch_add(1, Ordering::Relaxed);
    }

    if let Some(metadata) = req.metadata {
        state.vector_metadata.write().await.insert((name.clone(), id), metadata);
    }

    Ok(Json(InsertVectorResponse {
        id,
        message: format!("Vector inserted into index '{}' successfully", name),
    }))
}

/// POST /api/v1/indexes/{name}/vectors/search - Search for similar vectors in a named index
pub async fn search_vectors_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<SearchVectorsRequest>,
) -> Result<Json<SearchVectorsResponse>, ApiError> {
    let config = {
        let indexes = state.indexes.read().await;
        let meta = indexes.get(&name).ok_or_else(|| ApiError::IndexNotFound(name.clone()))?;
        meta.config.clone()
    };

    let query64: Vec<f64> = req.vector.iter().map(|&x| x as f64).collect();
    let read_ts = state.store.latest_ts();

    let ids = annidx_core::search(
        &state.store,
        &name,
        &query64,
        config.max_levels,
        read_ts,
        req.k,
        config.ef_search,
        &AcceptAll,
        &CancellationToken::new(),
    )
    .await?;

    let metadata_map = state.vector_metadata.read().await;
    let mut results = Vec::with_capacity(ids.len());
    for id in ids {
        let raw = state.store.get_latest(&data_key(&name, id)).await?;
        let Some(raw) = raw else { continue };
        let vector = decode_vector(&raw)?;
        let vector64: Vec<f64> = vector.iter().map(|&x| x as f64).collect();
        let distance = annidx_core::distance::dist(&vector64, &query64)?;
        results.push(VectorSearchResult {
            id,
            distance: distance as f32,
            vector,
            metadata: metadata_map.get(&(name.clone(), id)).cloned(),
        });
    }

    Ok(Json(SearchVectorsResponse { results }))
}

/// GET /api/v1/indexes/{name}/vectors/{id} - Retrieve a vector by ID from a named index
pub async fn get_vector_handler(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, VectorId)>,
) -> Result<Json<GetVectorResponse>, ApiError> {
    {
        let indexes = state.indexes.read().await;
        indexes.get(&name).ok_or_else(|| ApiError::IndexNotFound(name.clone()))?;
    }

    let raw = state
        .store
        .get_latest(&data_key(&name, id))
        .await?
        .ok_or(ApiError::VectorNotFound(id))?;
    let vector = decode_vector(&raw)?;
    let metadata = state.vector_metadata.read().await.get(&(name.clone(), id)).cloned();

    Ok(Json(GetVectorResponse { id, vector, metadata }))
}

/// DELETE /api/v1/indexes/{name}/vectors/{id} - Delete a vector from a named index
///
/// The index has no first-class delete (spec Non-goal): this tombstones
/// the base vector at the store level, exactly scenario 6 of the spec's
/// testable properties. Any adjacency entries still pointing at `id` are
/// pruned lazily, the next time a layer search tries to read through them
/// and logs `id` to the dead-node log.
pub async fn delete_vector_handler(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, VectorId)>,
) -> Result<Json<DeleteVectorResponse>, ApiError> {
    {
        let indexes = state.indexes.read().await;
        let meta = indexes.get(&name).ok_or_else(|| ApiError::IndexNotFound(name.clone()))?;
        let existed = state.store.get_latest(&data_key(&name, id)).await?.is_some();
        if !existed {
            return Err(ApiError::VectorNotFound(id));
        }
        state.store.delete(&data_key(&name, id)).await?;
        meta.num_vectors.fetch_sub(1, Ordering::Relaxed);
    }
    state.vector_metadata.write().await.remove(&(name.clone(), id));

    Ok(Json(DeleteVectorResponse {
        id,
        message: format!("Vector deleted from index '{}' successfully", name),
    }))
}

/// Index information response
#[derive(Debug, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    pub num_vectors: usize,
}

/// Response for listing indexes
#[derive(Debug, Serialize)]
pub struct ListIndexesResponse {
    pub indexes: Vec<IndexInfo>,
}

/// GET /api/v1/indexes - List all vector indexes
pub async fn list_indexes_handler(State(state): State<AppState>) -> Json<ListIndexesResponse> {
    let indexes_guard = state.indexes.read().await;

    let mut indexes = Vec::new();
    for (name, meta) in indexes_guard.iter() {
        indexes.push(IndexInfo {
            name: name.clone(),
            dimension: meta.dimension,
            metric: meta.metric.as_str().to_string(),
            num_vectors: meta.num_vectors.load(Ordering::Relaxed),
        });
    }

    Json(ListIndexesResponse { indexes })
}

/// Response for deleting an index
#[derive(Debug, Serialize)]
pub struct DeleteIndexResponse {
    pub name: String,
    pub message: String,
}

/// DELETE /api/v1/indexes/{name} - Delete a vector index
pub async fn delete_index_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DeleteIndexResponse>, ApiError> {
    let mut indexes = state.indexes.write().await;
    indexes.remove(&name).ok_or_else(|| ApiError::IndexNotFound(name.clone()))?;
    state.next_vector_ids.write().await.remove(&name);
    state.vector_metadata.write().await.retain(|(index, _), _| index != &name);

    Ok(Json(DeleteIndexResponse {
        name: name.clone(),
        message: format!("Index '{}' deleted successfully", name),
    }))
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Key-value endpoints
        .route("/api/v1/kv/{key}", get(get_handler))
        .route("/api/v1/kv/{key}", post(put_handler))
        .route("/api/v1/kv/{key}", delete(delete_handler))
        // Health and stats
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/stats", get(stats_handler))
        // Vector search endpoints (named indexes)
        .route("/api/v1/indexes", get(list_indexes_handler))
        .route("/api/v1/indexes/{name}", post(init_vector_index_handler))
        .route("/api/v1/indexes/{name}", delete(delete_index_handler))
        .route(
            "/api/v1/indexes/{name}/vectors",
            post(insert_vector_handler),
        )
        .route(
            "/api/v1/indexes/{name}/vectors/search",
            post(search_vectors_handler),
        )
        .route(
            "/api/v1/indexes/{name}/vectors/{id}",
            get(get_vector_handler),
        )
        .route(
            "/api/v1/indexes/{name}/vectors/{id}",
            delete(delete_vector_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        AppState::new(Arc::new(MemPostingStore::new()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use sitedex_core::{DocId, FsBackend, IndexReader, ValueCounts};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<DocId>,
}

#[derive(Deserialize)]
pub struct PropertyParams {
    pub name: String,
}

#[derive(Deserialize)]
pub struct ReferenceParams {
    pub name: String,
    pub value: String,
}

#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<IndexReader<FsBackend>>,
}

type HandlerError = (StatusCode, String);

/// What the server publishes and which browser origins may read it.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Root holding `fullText/`, `propertyValues/`, `propertyReferences/` and `medias/`.
    pub assets_root: PathBuf,
    /// Comma-separated origins allowed to fetch shards and query results
    /// cross-origin. Unset, or nothing parsable, allows any origin.
    pub allow_origins: Option<String>,
}

impl ServeConfig {
    pub fn new<P: Into<PathBuf>>(assets_root: P) -> Self {
        Self { assets_root: assets_root.into(), allow_origins: None }
    }
}

/// Serve the published assets plus JSON query endpoints over them.
pub fn build_app(config: &ServeConfig) -> Result<Router> {
    let app_state = AppState { reader: Arc::new(IndexReader::from_assets(&config.assets_root)) };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/properties", get(properties_handler))
        .route("/references", get(references_handler))
        .nest_service("/assets", ServeDir::new(&config.assets_root))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(read_only_cors(config.allow_origins.as_deref()));
    Ok(app)
}

/// Everything served is read-only, so only GET and HEAD are allowed cross-origin.
pub fn read_only_cors(allow_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allow_origins
        .map(|list| list.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    let allow_origin = if origins.is_empty() { AllowOrigin::any() } else { AllowOrigin::list(origins) };
    CorsLayer::new().allow_origin(allow_origin).allow_methods([Method::GET, Method::HEAD])
}

/// Documents containing any of the whitespace-separated terms.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, HandlerError> {
    let start = std::time::Instant::now();
    let results = state.reader.search(&params.q).map_err(internal)?;
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

pub async fn properties_handler(
    State(state): State<AppState>,
    Query(params): Query<PropertyParams>,
) -> Result<Json<ValueCounts>, HandlerError> {
    state.reader.property_values(&params.name).map(Json).map_err(internal)
}

pub async fn references_handler(
    State(state): State<AppState>,
    Query(params): Query<ReferenceParams>,
) -> Result<Json<Vec<DocId>>, HandlerError> {
    state.reader.property_references(&params.name, &params.value).map(Json).map_err(internal)
}

fn internal(err: sitedex_core::Error) -> HandlerError {
    tracing::error!(error = %err, "index read failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

use anyhow::Result;
use axum::{extract::{Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use lexi_core::{Bm25Params, DocId, IndexHandle, Pipeline, PositionalIndex, SearchError, StopWords, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

type ApiError = (StatusCode, String);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub index_path: PathBuf,
    pub stopwords_path: PathBuf,
    pub bm25: Bm25Params,
    pub admin_token: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    pub k1: Option<f64>,
    pub b: Option<f64>,
}
fn default_strategy() -> String { "bm25".into() }

#[derive(Deserialize)]
pub struct PhraseParams {
    pub query: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub processed_query: Vec<String>,
    pub strategy: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
    pub postings_found: BTreeMap<String, Vec<DocId>>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Serialize)]
pub struct PhraseResponse {
    pub query: String,
    pub processed_query: Vec<String>,
    pub doc_ids: Vec<DocId>,
}

#[derive(Serialize)]
pub struct ReloadResponse {
    pub status: &'static str,
    pub docs: usize,
    pub terms: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<IndexHandle>,
    pub pipeline: Arc<Pipeline>,
    pub config: Arc<ServerConfig>,
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    // A missing snapshot is not fatal: searches report 503 until one is loaded.
    let index = Arc::new(IndexHandle::empty());
    if config.index_path.exists() {
        index.reload_from(&config.index_path)?;
    } else {
        tracing::warn!(path = %config.index_path.display(), "index snapshot not found; serving without an index");
    }
    let pipeline = Arc::new(Pipeline::new(StopWords::load(&config.stopwords_path)?));
    let app_state = AppState { index, pipeline, config: Arc::new(config) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/string_search", get(search_handler))
        .route("/phrase_search", get(phrase_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

fn error_response(err: SearchError) -> ApiError {
    match err {
        SearchError::IndexUnavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            "index not loaded; build it with `indexer build` and POST /index/reload".into(),
        ),
        other => {
            tracing::error!(error = %other, "index error");
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

/// Current snapshot, loading it from disk once if nothing is installed yet.
fn current_index(state: &AppState) -> Result<Arc<PositionalIndex>, ApiError> {
    match state.index.snapshot() {
        Ok(index) => Ok(index),
        Err(SearchError::IndexUnavailable) if state.config.index_path.exists() => {
            state.index.reload_from(&state.config.index_path).map_err(error_response)
        }
        Err(e) => Err(error_response(e)),
    }
}

fn resolve_strategy(state: &AppState, params: &SearchParams) -> Result<Strategy, ApiError> {
    let strategy = params.strategy.parse::<Strategy>().map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    Ok(match strategy {
        Strategy::Bm25(_) => Strategy::Bm25(Bm25Params {
            k1: params.k1.unwrap_or(state.config.bm25.k1),
            b: params.b.unwrap_or(state.config.bm25.b),
        }),
        other => other,
    })
}

fn require_query(q: &str) -> Result<(), ApiError> {
    if q.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "query must not be empty".into()));
    }
    Ok(())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    require_query(&params.query)?;
    let strategy = resolve_strategy(&state, &params)?;
    let index = current_index(&state)?;

    let processed_query = state.pipeline.process(&params.query);
    tracing::debug!(query = %params.query, ?processed_query, %strategy, "search");

    let ranked = strategy.rank(&processed_query, &index);
    let postings_found: BTreeMap<String, Vec<DocId>> = processed_query
        .iter()
        .map(|term| {
            let docs = index.postings(term).map(|p| p.keys().copied().collect::<Vec<_>>()).unwrap_or_default();
            (term.clone(), docs)
        })
        .collect();

    let results: Vec<SearchHit> = ranked.into_iter().map(|(doc_id, score)| SearchHit { doc_id, score }).collect();
    Ok(Json(SearchResponse {
        query: params.query,
        processed_query,
        strategy: strategy.to_string(),
        took_s: start.elapsed().as_secs_f64(),
        total_hits: results.len(),
        results,
        postings_found,
    }))
}

pub async fn phrase_handler(State(state): State<AppState>, Query(params): Query<PhraseParams>) -> Result<Json<PhraseResponse>, ApiError> {
    require_query(&params.query)?;
    let index = current_index(&state)?;
    let processed_query = state.pipeline.process(&params.query);
    let doc_ids = index.phrase_docs(&processed_query);
    Ok(Json(PhraseResponse { query: params.query, processed_query, doc_ids }))
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<ReloadResponse>, ApiError> {
    authorize(&state, &headers)?;
    let index = state.index.reload_from(&state.config.index_path).map_err(error_response)?;
    Ok(Json(ReloadResponse { status: "ok", docs: index.doc_count(), terms: index.term_count() }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.config.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

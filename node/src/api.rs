//! # HTTP API
//!
//! Builds the axum router that exposes the store service over HTTP.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path      | Description                                   |
//! |--------|-----------|-----------------------------------------------|
//! | GET    | `/health` | Liveness probe                                |
//! | GET    | `/info`   | Non-secret configuration summary              |
//! | POST   | `/ipfs`   | Store a file on IPFS and anchor it on the Tangle |
//!
//! `POST /ipfs` always answers 200. The `success` flag in the body carries
//! the outcome, and `message` carries the reason when it is `false`.

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tangle_store::config::MAX_UPLOAD_BYTES;
use tangle_store::ipfs::StorageClient;
use tangle_store::store::StoreOutcome;
use tangle_store::tangle::LedgerClient;
use tangle_store::{StoreConfig, StoreRequest, StoreRequestHandler, StoreResponse};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Store Service
// ---------------------------------------------------------------------------

/// Object-safe view of the store pipeline, so the router does not carry the
/// handler's client type parameters.
#[async_trait]
pub trait StoreService: Send + Sync {
    async fn execute(&self, request: &StoreRequest) -> StoreOutcome;
}

#[async_trait]
impl<L, S> StoreService for StoreRequestHandler<L, S>
where
    L: LedgerClient + 'static,
    S: StorageClient + 'static,
{
    async fn execute(&self, request: &StoreRequest) -> StoreOutcome {
        StoreRequestHandler::execute(self, request).await
    }
}

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared state available to every request handler.
///
/// Cheap to clone: everything behind an `Arc`. Nothing in here is mutated
/// by a request except the metric counters.
#[derive(Clone)]
pub struct AppState {
    /// Service version string.
    pub version: String,
    /// Loaded configuration. Only the non-secret parts leave the process.
    pub config: Arc<StoreConfig>,
    /// The store pipeline.
    pub store: Arc<dyn StoreService>,
    /// Prometheus metrics.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/ipfs", post(store_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response body for `GET /info`.
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub node_provider: String,
    pub depth: u32,
    pub mwm: u8,
    pub ipfs_provider: String,
    pub ipfs_authenticated: bool,
    pub max_upload_bytes: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the service is alive.
///
/// Does not reach out to the ledger node or IPFS; each store request checks
/// node availability itself.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /info`: configuration summary without the seed or the IPFS token.
async fn info_handler(State(state): State<AppState>) -> impl IntoResponse {
    let config = &state.config;
    Json(InfoResponse {
        version: state.version.clone(),
        node_provider: config.node.provider.clone(),
        depth: config.node.depth,
        mwm: config.node.mwm,
        ipfs_provider: config.ipfs.provider.clone(),
        ipfs_authenticated: config.ipfs.token().is_some(),
        max_upload_bytes: MAX_UPLOAD_BYTES,
    })
}

/// `POST /ipfs`: run the store pipeline for one file.
async fn store_handler(
    State(state): State<AppState>,
    body: Result<Json<StoreRequest>, JsonRejection>,
) -> Json<StoreResponse> {
    let Json(request) = match body {
        Ok(json) => json,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "rejected store request body");
            state.metrics.observe_rejection();
            return Json(StoreResponse::failure(format!(
                "The request body could not be read: {}",
                rejection.body_text()
            )));
        }
    };

    let started = Instant::now();
    let outcome = state.store.execute(&request).await;
    state
        .metrics
        .observe(&outcome, started.elapsed().as_secs_f64());

    Json(outcome.into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

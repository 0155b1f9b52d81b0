use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use ethers_core::types::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::eth::{normalize_block, EthClient};
use crate::models::{BlockSummary, MempoolStats, PriceInfo, Snapshot, TransactionDetail, WalletReport};
use crate::refresh::{Refresher, SNAPSHOT_MAX_AGE};
use crate::units::parse_block_number;

const DEFAULT_WALLET_LIMIT: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub refresher: Arc<Refresher>,
    pub eth: EthClient,
}

/// Every failure leaves this surface as a JSON object with an `error` field.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, (*msg).to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(err) => {
                tracing::error!("request failed: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/ethereum/snapshot", get(snapshot))
        .route("/api/ethereum/health", get(health))
        .route("/api/ethereum/mempool", get(mempool))
        .route("/api/ethereum/price", get(price))
        .route("/api/ethereum/transaction/:hash", get(transaction))
        .route("/api/ethereum/wallet/:address", get(wallet))
        .route("/api/ethereum/block/:number", get(block))
        .with_state(state)
}

pub async fn run_http_server(addr: &str, state: AppState) -> Result<()> {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Full aggregate, refreshed inline when older than [`SNAPSHOT_MAX_AGE`].
async fn snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.refresher.snapshot_fresh(SNAPSHOT_MAX_AGE).await)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    last_update: i64,
    block_number: u64,
}

/// Reports without forcing a refresh.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snap = state.refresher.cache().snapshot().await;
    Json(HealthResponse {
        status: "ok",
        last_update: snap.last_update,
        block_number: snap.block.number,
    })
}

async fn mempool(State(state): State<AppState>) -> Json<MempoolStats> {
    Json(state.refresher.cache().snapshot().await.mempool_stats)
}

async fn price(State(state): State<AppState>) -> Json<PriceInfo> {
    Json(state.refresher.cache().snapshot().await.eth_price)
}

async fn transaction(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<TransactionDetail>, ApiError> {
    let hash: H256 = hash
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid transaction hash {:?}", hash)))?;

    match state.eth.transaction_detail(hash).await? {
        Some(detail) => Ok(Json(detail)),
        None => Err(ApiError::NotFound("Transaction not found")),
    }
}

#[derive(Deserialize)]
struct WalletQuery {
    limit: Option<usize>,
}

async fn wallet(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<WalletReport>, ApiError> {
    let address: Address = address
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid address {:?}", address)))?;
    let limit = query.limit.unwrap_or(DEFAULT_WALLET_LIMIT).max(1);

    Ok(Json(state.eth.scan_wallet(address, limit).await?))
}

async fn block(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<BlockSummary>, ApiError> {
    let number = parse_block_number(&number)
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let Some(block) = state.eth.block_with_txs(number).await? else {
        return Err(ApiError::NotFound("Block not found"));
    };
    let summary =
        normalize_block(&block).ok_or(ApiError::NotFound("Block not found"))?;
    Ok(Json(summary))
}

//! Request Handlers
//!
//! Thin adapters from HTTP to the [`SlotMachine`] facade. Every core error is
//! mapped through [`ApiError::from_slot`] so clients can branch on its kind.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::{
    common::types::current_timestamp_secs,
    machine::{MachineStats, SlotMachine},
    pricing::{SpinCost, StaticPriceFeed},
    spins::{RandomWord, SpinResult},
};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::info;

/// Shared application state
pub struct AppState {
    pub machine: Arc<SlotMachine>,
    /// Present when prices are pushed through the API rather than read from an external feed
    pub price_feed: Option<Arc<StaticPriceFeed>>,
    pub version: String,
    /// Longest a request may wait for a spin to settle
    pub result_wait: Duration,
    pub vrf_public_key: Option<String>,
}

/// Health check handler
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
        server_time: Utc::now(),
        pending_requests: state.machine.pending_count(),
        vrf_public_key: state.vrf_public_key.clone(),
    })
}

/// Cost of every reel count
/// GET /pricing
pub async fn pricing_schedule_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SpinCost>>, ApiError> {
    state
        .machine
        .cost_schedule()
        .map(Json)
        .map_err(|e| ApiError::from_slot(request_id.0, e))
}

/// Pricing breakdown for one reel count
/// GET /pricing/:reels
pub async fn pricing_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(reels): Path<u8>,
) -> Result<Json<SpinCost>, ApiError> {
    state
        .machine
        .pricing_breakdown(reels)
        .map(Json)
        .map_err(|e| ApiError::from_slot(request_id.0, e))
}

/// Place a spin and, unless told otherwise, wait briefly for its settlement
/// POST /spins
pub async fn spin_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SpinRequest>,
) -> Result<Json<SpinResponse>, ApiError> {
    let spin_id = state
        .machine
        .spin(&body.player, body.reel_count, body.bet_amount)
        .map_err(|e| ApiError::from_slot(request_id.0.clone(), e))?;

    let wait = if body.wait.unwrap_or(true) {
        state.result_wait
    } else {
        Duration::ZERO
    };
    let result = wait_or_read(&state, spin_id, wait)
        .await
        .map_err(|e| ApiError::from_slot(request_id.0, e))?;

    Ok(Json(SpinResponse {
        request_id: spin_id,
        result,
    }))
}

/// Spin state, optionally waiting for settlement
/// GET /spins/:id?wait_ms={n}
pub async fn spin_result_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(spin_id): Path<u64>,
    Query(query): Query<SpinQuery>,
) -> Result<Json<SpinResult>, ApiError> {
    let wait = query
        .wait_ms
        .map(Duration::from_millis)
        .unwrap_or(Duration::ZERO)
        .min(state.result_wait);

    wait_or_read(&state, spin_id, wait)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_slot(request_id.0, e))
}

async fn wait_or_read(
    state: &AppState,
    spin_id: u64,
    wait: Duration,
) -> crate::errors::SlotResult<SpinResult> {
    if wait.is_zero() {
        state.machine.get_spin_result(spin_id)
    } else {
        state.machine.wait_for_result(spin_id, wait).await
    }
}

/// Randomness callback from an external oracle
/// POST /oracle/fulfill
pub async fn fulfill_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<FulfillRequest>,
) -> Result<Json<SpinResult>, ApiError> {
    let word = RandomWord::from_hex(&body.random_word)
        .map_err(|e| ApiError::from_slot(request_id.0.clone(), e))?;

    state
        .machine
        .fulfill(body.request_id, word)
        .map(Json)
        .map_err(|e| ApiError::from_slot(request_id.0, e))
}

/// Push a new price round into the in-process feed
/// POST /oracle/prices
pub async fn price_update_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<PriceUpdateRequest>,
) -> Result<Json<Vec<SpinCost>>, ApiError> {
    let Some(ref feed) = state.price_feed else {
        return Err(ApiError::bad_request(
            request_id.0,
            "prices come from an external feed".to_string(),
        ));
    };

    let updated_at = body.updated_at.unwrap_or_else(current_timestamp_secs);
    feed.set_price(body.asset, body.answer, updated_at)
        .map_err(|e| ApiError::from_slot(request_id.0.clone(), e))?;
    info!(asset = %body.asset, answer = %body.answer, updated_at, "Price round pushed");

    // A price that fails validation still lands in the feed; report it now
    state
        .machine
        .cost_schedule()
        .map(Json)
        .map_err(|e| ApiError::from_slot(request_id.0, e))
}

/// Balance, statistics and recent spins of one player
/// GET /players/:id?limit={n}
pub async fn player_handler(
    State(state): State<Arc<AppState>>,
    Path(player): Path<String>,
    Query(query): Query<PlayerQuery>,
) -> Json<PlayerResponse> {
    let limit = query.limit.min(100);
    Json(PlayerResponse {
        balance: state.machine.balance(&player),
        stats: state.machine.player_stats(&player),
        recent_spins: state.machine.player_spins(&player, limit),
        player,
    })
}

/// POST /players/:id/deposit
pub async fn deposit_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(player): Path<String>,
    Json(body): Json<AmountRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .machine
        .deposit(&player, body.amount)
        .map_err(|e| ApiError::from_slot(request_id.0, e))?;
    Ok(Json(BalanceResponse {
        player,
        balance,
        credits_minted: None,
    }))
}

/// POST /players/:id/withdraw
pub async fn withdraw_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(player): Path<String>,
    Json(body): Json<AmountRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .machine
        .withdraw(&player, body.amount)
        .map_err(|e| ApiError::from_slot(request_id.0, e))?;
    Ok(Json(BalanceResponse {
        player,
        balance,
        credits_minted: None,
    }))
}

/// Convert a base-asset deposit into credits
/// POST /players/:id/buy_credits
pub async fn buy_credits_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(player): Path<String>,
    Json(body): Json<BuyCreditsRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let minted = state
        .machine
        .buy_credits(&player, body.base_amount)
        .map_err(|e| ApiError::from_slot(request_id.0, e))?;
    Ok(Json(BalanceResponse {
        balance: state.machine.balance(&player),
        player,
        credits_minted: Some(minted),
    }))
}

/// POST /prize_pool/fund
pub async fn fund_prize_pool_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<AmountRequest>,
) -> Result<Json<FundResponse>, ApiError> {
    let balance = state
        .machine
        .fund_prize_pool(body.amount)
        .map_err(|e| ApiError::from_slot(request_id.0, e))?;
    Ok(Json(FundResponse {
        account: "prize_pool".to_string(),
        balance,
    }))
}

/// POST /house/fund
pub async fn fund_house_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<AmountRequest>,
) -> Result<Json<FundResponse>, ApiError> {
    let balance = state
        .machine
        .fund_house(body.amount)
        .map_err(|e| ApiError::from_slot(request_id.0, e))?;
    Ok(Json(FundResponse {
        account: "house".to_string(),
        balance,
    }))
}

/// Game-wide statistics and account totals
/// GET /stats
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<MachineStats> {
    Json(state.machine.stats())
}

/// Prometheus exposition
/// GET /metrics
pub async fn metrics_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let body = state
        .machine
        .metrics()
        .render()
        .map_err(|e| ApiError::internal_error(request_id.0, e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

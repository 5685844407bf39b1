//! API Request and Response Models

use crate::common::types::{Amount, AssetId, RequestId};
use crate::settlement::PlayerStats;
use crate::spins::SpinResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub server_time: DateTime<Utc>,
    pub pending_requests: usize,
    /// Key that verifies delivered random words, when the VRF oracle runs in-process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf_public_key: Option<String>,
}

/// POST /spins body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinRequest {
    pub player: String,
    pub reel_count: u8,
    /// Most the player is willing to pay for the spin
    pub bet_amount: Amount,
    /// Wait for settlement before answering (default true)
    #[serde(default)]
    pub wait: Option<bool>,
}

/// POST /spins response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinResponse {
    pub request_id: RequestId,
    pub result: SpinResult,
}

/// GET /spins/:id query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpinQuery {
    /// Milliseconds to wait for settlement, capped by the configured wait
    #[serde(default)]
    pub wait_ms: Option<u64>,
}

/// POST /oracle/fulfill body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillRequest {
    pub request_id: RequestId,
    /// Hex-encoded 256-bit word, `0x` prefix optional
    pub random_word: String,
}

/// POST /oracle/prices body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceUpdateRequest {
    pub asset: AssetId,
    /// USD price with 8 decimals
    pub answer: i128,
    /// Defaults to now
    #[serde(default)]
    pub updated_at: Option<u64>,
}

/// Body for deposits, withdrawals and funding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountRequest {
    pub amount: Amount,
}

/// POST /players/:id/buy_credits body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyCreditsRequest {
    /// Base-asset amount in base units (18 decimals)
    pub base_amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub player: String,
    pub balance: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits_minted: Option<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerQuery {
    #[serde(default = "default_history")]
    pub limit: usize,
}

fn default_history() -> usize {
    20
}

/// GET /players/:id response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerResponse {
    pub player: String,
    pub balance: Amount,
    pub stats: PlayerStats,
    pub recent_spins: Vec<SpinResult>,
}

/// Balance of a house-side account after funding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundResponse {
    pub account: String,
    pub balance: Amount,
}

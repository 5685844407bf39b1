//! Shared type definitions for the reelvault settlement core

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Settlement-currency amount in base units (18 decimals)
pub type Amount = u128;

/// Account identifier of a player
pub type PlayerId = String;

/// Correlation id assigned by the randomness oracle
pub type RequestId = u64;

/// Base units per whole settlement credit
pub const CREDIT_UNIT: Amount = 1_000_000_000_000_000_000;

/// Basis-point denominator
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Asset with an external USD price feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetId {
    /// Asset the settlement currency is minted against
    Base,
    /// Asset the randomness oracle charges its fee in
    Fee,
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetId::Base => write!(f, "base/USD"),
            AssetId::Fee => write!(f, "fee/USD"),
        }
    }
}

/// One round as reported by an external price feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRound {
    /// Signed answer with 8 decimals
    pub answer: i128,
    /// Unix seconds of the last update
    pub updated_at: u64,
    pub round_id: u128,
}

/// Outbound randomness request handed to the oracle service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessRequest {
    pub request_id: RequestId,
    /// Fee paid in fee-asset base units
    pub payment: Amount,
    pub num_words: u32,
}

/// Get current timestamp in seconds since Unix epoch
pub fn current_timestamp_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Apply a basis-point share to an amount, rounding down
pub fn apply_bps(amount: Amount, bps: u32) -> Amount {
    amount / BPS_DENOMINATOR * bps as u128 + amount % BPS_DENOMINATOR * bps as u128 / BPS_DENOMINATOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_bps() {
        assert_eq!(apply_bps(10_000, 9_500), 9_500);
        assert_eq!(apply_bps(CREDIT_UNIT, 2_500), CREDIT_UNIT / 4);
        assert_eq!(apply_bps(3, 5_000), 1);
        assert_eq!(apply_bps(0, 10_000), 0);
        assert_eq!(apply_bps(Amount::MAX, 10_000), Amount::MAX);
    }

    #[test]
    fn test_asset_display() {
        assert_eq!(AssetId::Base.to_string(), "base/USD");
        assert_eq!(AssetId::Fee.to_string(), "fee/USD");
    }
}

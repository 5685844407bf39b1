//! Configuration management with validation and defaults
//!
//! Every economic constant of the settlement core lives here so it can be
//! reviewed in one TOML file. Loading and environment overrides are handled
//! by [`crate::common::config::ConfigLoader`].

use crate::errors::ConfigurationError;
use crate::payouts::{MAX_REELS, MIN_REELS, SEVEN_REEL_CHUNKS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete service configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SlotConfig {
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub tables: TableConfig,
    #[serde(default)]
    pub randomness: RandomnessConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Spin pricing in USD cents
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PricingConfig {
    /// Cost of a 3-reel spin before the reel multiplier, in USD cents
    pub base_cost_cents: u64,
    /// Multiplier per reel count in basis points, index 0 = 3 reels
    pub reel_multiplier_bps: Vec<u32>,
    /// Randomness fee in fee-asset base units (18 decimals)
    pub fee_amount: u64,
    /// Whole credits minted per whole unit of the base asset
    pub credits_per_base_asset: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_cost_cents: 25,
            reel_multiplier_bps: vec![10_000, 15_000, 25_000, 40_000, 60_000],
            fee_amount: 20_000_000_000_000_000, // 0.02 fee-asset units
            credits_per_base_asset: 12_500,
        }
    }
}

/// Accepted price range for one asset, 8 decimals
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceBand {
    pub min_e8: u64,
    pub max_e8: u64,
}

impl PriceBand {
    pub fn contains(&self, value: u128) -> bool {
        value >= self.min_e8 as u128 && value <= self.max_e8 as u128
    }
}

/// Price feed validation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OracleConfig {
    pub max_staleness_secs: u64,
    pub base_band: PriceBand,
    pub fee_band: PriceBand,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_staleness_secs: 86_400,
            base_band: PriceBand {
                min_e8: 50 * 100_000_000,
                max_e8: 100_000 * 100_000_000,
            },
            fee_band: PriceBand {
                min_e8: 100_000_000,
                max_e8: 1_000 * 100_000_000,
            },
        }
    }
}

/// What settlement does when the pool or bankroll cannot cover a payout
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShortfallPolicy {
    /// Pay what is available and record the unpaid remainder
    Clamp,
    /// Fail the settlement
    Reject,
}

/// Bet multipliers for the fixed-multiplier tiers
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierMultipliers {
    pub small_win: u32,
    pub medium_win: u32,
    pub big_win: u32,
    pub mega_win: u32,
    pub ultra_win: u32,
    pub special_combo: u32,
}

impl Default for TierMultipliers {
    fn default() -> Self {
        Self {
            small_win: 2,
            medium_win: 5,
            big_win: 10,
            mega_win: 50,
            ultra_win: 100,
            special_combo: 20,
        }
    }
}

/// Ledger economics
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LedgerConfig {
    /// Share of every accepted spin credited to the prize pool
    pub prize_pool_bps: u32,
    /// Share of the prize pool paid on a jackpot
    pub jackpot_share_bps: u32,
    pub multipliers: TierMultipliers,
    pub shortfall_policy: ShortfallPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            prize_pool_bps: 9_500,
            jackpot_share_bps: 2_500,
            multipliers: TierMultipliers::default(),
            shortfall_policy: ShortfallPolicy::Clamp,
        }
    }
}

impl LedgerConfig {
    /// House edge in basis points
    pub fn house_edge_bps(&self) -> u32 {
        10_000u32.saturating_sub(self.prize_pool_bps)
    }
}

/// Payout lookup tables
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TableConfig {
    /// Largest number of entries one deployable shard may hold
    pub max_shard_entries: usize,
    /// Number of range chunks for the 7-reel table
    pub seven_reel_chunks: usize,
    /// Pre-generated bincode artefact; generated in-process when absent
    #[serde(default)]
    pub artefact_path: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_shard_entries: 2_048,
            seven_reel_chunks: SEVEN_REEL_CHUNKS,
            artefact_path: None,
        }
    }
}

/// In-process randomness oracle
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RandomnessConfig {
    pub channel_capacity: usize,
    /// Artificial delay before each fulfillment
    pub fulfillment_delay_ms: u64,
}

impl Default for RandomnessConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1_024,
            fulfillment_delay_ms: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Rocksdb,
}

/// Persistence of requests, balances and the prize pool
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Rocksdb,
            data_dir: "./reelvault_data".to_string(),
        }
    }
}

/// HTTP API server
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long `POST /spins` waits for settlement before answering pending
    pub result_wait_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
            result_wait_ms: 2_000,
        }
    }
}

impl SlotConfig {
    /// In-memory configuration for tests and local simulation
    pub fn testing() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }

    /// Durable configuration that refuses payouts it cannot cover in full
    pub fn production() -> Self {
        Self {
            ledger: LedgerConfig {
                shortfall_policy: ShortfallPolicy::Reject,
                ..LedgerConfig::default()
            },
            storage: StorageConfig {
                backend: StorageBackend::Rocksdb,
                data_dir: "/var/lib/reelvault".to_string(),
            },
            api: ApiConfig {
                allowed_origins: vec![],
                ..ApiConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let expected = (MAX_REELS - MIN_REELS + 1) as usize;
        let multipliers = &self.pricing.reel_multiplier_bps;
        if multipliers.len() != expected {
            return Err(invalid(
                "pricing.reel_multiplier_bps",
                format!("{:?}", multipliers),
                format!("expected {} entries, one per reel count", expected),
            ));
        }
        if multipliers.windows(2).any(|w| w[1] < w[0]) {
            return Err(invalid(
                "pricing.reel_multiplier_bps",
                format!("{:?}", multipliers),
                "multipliers must not decrease with reel count".to_string(),
            ));
        }
        if multipliers.iter().any(|m| *m == 0) {
            return Err(invalid(
                "pricing.reel_multiplier_bps",
                format!("{:?}", multipliers),
                "multipliers must be positive".to_string(),
            ));
        }
        if self.pricing.credits_per_base_asset == 0 {
            return Err(invalid(
                "pricing.credits_per_base_asset",
                "0".to_string(),
                "rate cannot be zero".to_string(),
            ));
        }

        for (field, band) in [
            ("oracle.base_band", self.oracle.base_band),
            ("oracle.fee_band", self.oracle.fee_band),
        ] {
            if band.min_e8 == 0 || band.min_e8 > band.max_e8 {
                return Err(invalid(
                    field,
                    format!("[{}, {}]", band.min_e8, band.max_e8),
                    "band must be positive and ordered".to_string(),
                ));
            }
        }

        for (field, bps) in [
            ("ledger.prize_pool_bps", self.ledger.prize_pool_bps),
            ("ledger.jackpot_share_bps", self.ledger.jackpot_share_bps),
        ] {
            if bps > 10_000 {
                return Err(invalid(field, bps.to_string(), "cannot exceed 10000 bps".to_string()));
            }
        }

        if self.tables.max_shard_entries == 0 {
            return Err(invalid(
                "tables.max_shard_entries",
                "0".to_string(),
                "shards must hold at least one entry".to_string(),
            ));
        }
        if self.tables.seven_reel_chunks != SEVEN_REEL_CHUNKS {
            return Err(invalid(
                "tables.seven_reel_chunks",
                self.tables.seven_reel_chunks.to_string(),
                format!("the 7-reel table is split into exactly {} chunks", SEVEN_REEL_CHUNKS),
            ));
        }

        if self.randomness.channel_capacity == 0 {
            return Err(invalid(
                "randomness.channel_capacity",
                "0".to_string(),
                "channel capacity cannot be zero".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Rocksdb && self.storage.data_dir.is_empty() {
            return Err(ConfigurationError::MissingRequired("storage.data_dir".to_string()));
        }

        if self.api.port == 0 {
            return Err(invalid("api.port", "0".to_string(), "port cannot be zero".to_string()));
        }
        if u128::from(self.api.result_wait_ms) >= u128::from(self.api.request_timeout_secs) * 1_000 {
            return Err(invalid(
                "api.result_wait_ms",
                self.api.result_wait_ms.to_string(),
                format!(
                    "must be shorter than the {}s request timeout",
                    self.api.request_timeout_secs
                ),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn result_wait(&self) -> Duration {
        Duration::from_millis(self.api.result_wait_ms)
    }

    pub fn fulfillment_delay(&self) -> Duration {
        Duration::from_millis(self.randomness.fulfillment_delay_ms)
    }
}

fn invalid(field: &str, value: String, reason: String) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value,
        reason,
    }
}

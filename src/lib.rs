//! Reelvault - wager settlement core of a reel slot machine
//!
//! Prices spins in USD through external price feeds, requests randomness
//! from an asynchronous oracle, classifies the resulting reel combination
//! into a payout tier, and settles the payout against player balances, the
//! house bankroll and a shared prize pool.
//!
//! [`SlotMachine`] is the entry point; [`SlotMachineFactory`] wires one with
//! storage and an in-process VRF oracle.

pub mod api;
pub mod common;
pub mod config;
pub mod errors;
pub mod factory;
pub mod machine;
pub mod metrics;
pub mod payouts;
pub mod pricing;
pub mod settlement;
pub mod spin_store;
pub mod spins;
pub mod storage;

pub use common::config::ConfigLoader;
pub use common::traits::{Clock, ManualClock, PriceFeed, RandomnessOracle, SystemClock};
pub use common::types::{Amount, AssetId, PlayerId, RequestId, CREDIT_UNIT};
pub use config::SlotConfig;
pub use errors::{ErrorKind, SlotError, SlotResult};
pub use factory::{SlotHandle, SlotMachineFactory};
pub use machine::{MachineStats, SlotMachine, SlotMachineBuilder};
pub use payouts::{Combination, PayoutClassifier, PayoutTier};
pub use pricing::{PricingCalculator, SpinCost, StaticPriceFeed};
pub use settlement::{GameStats, PlayerStats, SettlementLedger};
pub use spins::{RandomWord, SpinEvent, SpinResult, SpinStatus};
pub use storage::{KvStore, MemoryStorage, OptimizedStorage};

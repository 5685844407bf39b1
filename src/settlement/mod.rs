//! Settlement ledger: player balances, house bankroll and the prize pool

pub mod ledger;
pub mod prize_pool;
pub mod stats;

pub use ledger::{LedgerDelta, LedgerSnapshot, Payout, PayoutSource, SettlementLedger};
pub use prize_pool::PrizePool;
pub use stats::{GameStats, PlayerStats};

//! Payout classification
//!
//! A spin's reels are encoded as a [`Combination`] and classified into a
//! [`PayoutTier`]. Classification runs the closed-form [`fast_path`] first and
//! consults the per-reel-count lookup [`table`] only for combinations the
//! fast path defers. The tables are generated from the [`reference`] rules.

pub mod classifier;
pub mod fast_path;
pub mod reference;
pub mod table;
pub mod types;

pub use classifier::{Classification, PayoutClassifier, Resolution};
pub use fast_path::FastPath;
pub use table::{CoverageReport, LookupShard, PayoutTable, PayoutTables};
pub use types::{check_reel_count, Combination, PayoutTier, Symbol, SymbolCounts};

/// Fewest reels a spin may use
pub const MIN_REELS: u8 = 3;

/// Most reels a spin may use
pub const MAX_REELS: u8 = 7;

/// Range chunks the 7-reel table is split into
pub const SEVEN_REEL_CHUNKS: usize = 8;

/// Distinct reel symbols
pub const SYMBOL_COUNT: u8 = 6;

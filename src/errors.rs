//! Error types for the reelvault settlement core
//!
//! Errors are grouped by the category of failure (caller input, economics,
//! price data, callback protocol, storage, tables, configuration). Every
//! rejection maps to a distinct [`ErrorKind`] so callers can branch on it
//! without string matching.

use crate::common::types::{Amount, AssetId, RequestId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for reelvault operations
pub type SlotResult<T> = Result<T, SlotError>;

/// Root error type for all reelvault operations
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Economic error: {0}")]
    Economic(#[from] EconomicError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Payout table error: {0}")]
    Table(#[from] TableError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Caller mistakes, always rejected before any state mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("reel count {0} is outside [3, 7]")]
    InvalidReelCount(u8),

    #[error("digit {digit} at position {position} is outside [1, 6]")]
    InvalidDigit { position: usize, digit: u64 },

    #[error("combination {value} does not have exactly {reel_count} digits")]
    InvalidCombinationLength { reel_count: u8, value: u64 },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("player id must not be empty")]
    EmptyPlayerId,

    #[error("invalid random word: {0}")]
    InvalidRandomWord(String),
}

/// Balance and pool related rejections
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomicError {
    #[error("player {player} has {available} credits, {required} required")]
    InsufficientBalance {
        player: String,
        available: Amount,
        required: Amount,
    },

    #[error("prize pool holds {available}, payout of {requested} requested")]
    InsufficientPool { requested: Amount, available: Amount },

    #[error("house bankroll holds {available}, payout of {requested} requested")]
    InsufficientBankroll { requested: Amount, available: Amount },

    #[error("spin costs {cost}, above the caller limit of {limit}")]
    CostAboveLimit { cost: Amount, limit: Amount },

    #[error("amount overflow in {0}")]
    Overflow(&'static str),
}

/// Price feed data that cannot be used for pricing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("{asset} price is {age_secs}s old (max {max_secs}s)")]
    StalePrice {
        asset: AssetId,
        age_secs: u64,
        max_secs: u64,
    },

    #[error("{asset} price {value} outside sanity band [{min}, {max}]")]
    PriceOutOfRange {
        asset: AssetId,
        value: i128,
        min: u128,
        max: u128,
    },

    #[error("{asset} feed unavailable: {reason}")]
    FeedUnavailable { asset: AssetId, reason: String },
}

/// Randomness callback protocol violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("no spin request with id {0}")]
    UnknownRequest(RequestId),

    #[error("spin request {0} already fulfilled")]
    AlreadyFulfilled(RequestId),

    #[error("randomness oracle returned duplicate request id {0}")]
    DuplicateRequest(RequestId),

    #[error("randomness oracle unavailable: {0}")]
    RandomnessUnavailable(String),
}

/// Storage system errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("database open failed: {0}")]
    DatabaseOpenFailed(String),

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// Payout table generation and loading errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("{reel_count}-reel shard {shard} holds {entries} entries (max {max})")]
    TableTooLarge {
        reel_count: u8,
        shard: usize,
        entries: usize,
        max: usize,
    },

    #[error("malformed {reel_count}-reel table: {reason}")]
    Malformed { reel_count: u8, reason: String },

    #[error("table artefact could not be read: {0}")]
    Artefact(String),
}

/// Configuration and validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("missing required field: {0}")]
    MissingRequired(String),

    #[error("invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("failed to save configuration: {0}")]
    SaveFailed(String),
}

/// Machine-checkable error kind, stable across releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidReelCount,
    InvalidDigit,
    InvalidCombinationLength,
    ZeroAmount,
    EmptyPlayerId,
    InvalidRandomWord,
    InsufficientBalance,
    InsufficientPool,
    InsufficientBankroll,
    CostAboveLimit,
    Overflow,
    StalePrice,
    PriceOutOfRange,
    FeedUnavailable,
    UnknownRequest,
    AlreadyFulfilled,
    DuplicateRequest,
    RandomnessUnavailable,
    Storage,
    Table,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidReelCount => "INVALID_REEL_COUNT",
            ErrorKind::InvalidDigit => "INVALID_DIGIT",
            ErrorKind::InvalidCombinationLength => "INVALID_COMBINATION_LENGTH",
            ErrorKind::ZeroAmount => "ZERO_AMOUNT",
            ErrorKind::EmptyPlayerId => "EMPTY_PLAYER_ID",
            ErrorKind::InvalidRandomWord => "INVALID_RANDOM_WORD",
            ErrorKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorKind::InsufficientPool => "INSUFFICIENT_POOL",
            ErrorKind::InsufficientBankroll => "INSUFFICIENT_BANKROLL",
            ErrorKind::CostAboveLimit => "COST_ABOVE_LIMIT",
            ErrorKind::Overflow => "OVERFLOW",
            ErrorKind::StalePrice => "STALE_PRICE",
            ErrorKind::PriceOutOfRange => "PRICE_OUT_OF_RANGE",
            ErrorKind::FeedUnavailable => "FEED_UNAVAILABLE",
            ErrorKind::UnknownRequest => "UNKNOWN_REQUEST",
            ErrorKind::AlreadyFulfilled => "ALREADY_FULFILLED",
            ErrorKind::DuplicateRequest => "DUPLICATE_REQUEST",
            ErrorKind::RandomnessUnavailable => "RANDOMNESS_UNAVAILABLE",
            ErrorKind::Storage => "STORAGE",
            ErrorKind::Table => "TABLE",
            ErrorKind::Configuration => "CONFIGURATION",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SlotError {
    /// The machine-checkable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlotError::Input(e) => match e {
                InputError::InvalidReelCount(_) => ErrorKind::InvalidReelCount,
                InputError::InvalidDigit { .. } => ErrorKind::InvalidDigit,
                InputError::InvalidCombinationLength { .. } => ErrorKind::InvalidCombinationLength,
                InputError::ZeroAmount => ErrorKind::ZeroAmount,
                InputError::EmptyPlayerId => ErrorKind::EmptyPlayerId,
                InputError::InvalidRandomWord(_) => ErrorKind::InvalidRandomWord,
            },
            SlotError::Economic(e) => match e {
                EconomicError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
                EconomicError::InsufficientPool { .. } => ErrorKind::InsufficientPool,
                EconomicError::InsufficientBankroll { .. } => ErrorKind::InsufficientBankroll,
                EconomicError::CostAboveLimit { .. } => ErrorKind::CostAboveLimit,
                EconomicError::Overflow(_) => ErrorKind::Overflow,
            },
            SlotError::Oracle(e) => match e {
                OracleError::StalePrice { .. } => ErrorKind::StalePrice,
                OracleError::PriceOutOfRange { .. } => ErrorKind::PriceOutOfRange,
                OracleError::FeedUnavailable { .. } => ErrorKind::FeedUnavailable,
            },
            SlotError::Protocol(e) => match e {
                ProtocolError::UnknownRequest(_) => ErrorKind::UnknownRequest,
                ProtocolError::AlreadyFulfilled(_) => ErrorKind::AlreadyFulfilled,
                ProtocolError::DuplicateRequest(_) => ErrorKind::DuplicateRequest,
                ProtocolError::RandomnessUnavailable(_) => ErrorKind::RandomnessUnavailable,
            },
            SlotError::Storage(_) => ErrorKind::Storage,
            SlotError::Table(_) => ErrorKind::Table,
            SlotError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Whether the error was caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SlotError::Input(_) | SlotError::Economic(_) | SlotError::Protocol(_)
        )
    }
}

impl From<rocksdb::Error> for SlotError {
    fn from(err: rocksdb::Error) -> Self {
        SlotError::Storage(StorageError::WriteFailed(err.to_string()))
    }
}

impl From<serde_json::Error> for SlotError {
    fn from(err: serde_json::Error) -> Self {
        SlotError::Storage(StorageError::CorruptedData(err.to_string()))
    }
}

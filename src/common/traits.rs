//! Shared traits and interfaces
//!
//! The external collaborators the settlement core consumes: a wall clock,
//! USD price feeds, and the randomness oracle service.

use crate::common::types::{current_timestamp_secs, Amount, AssetId, RawRound, RequestId};
use crate::errors::SlotResult;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the current time in Unix seconds
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        current_timestamp_secs()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// External USD price feed service
pub trait PriceFeed: Send + Sync {
    /// Latest round reported for `asset`
    fn latest_round(&self, asset: AssetId) -> SlotResult<RawRound>;
}

/// External randomness oracle service
///
/// `request_randomness` is called synchronously while a spin is accepted.
/// The oracle later delivers the word through `SlotMachine::fulfill`.
pub trait RandomnessOracle: Send + Sync {
    fn request_randomness(&self, payment: Amount, num_words: u32) -> SlotResult<RequestId>;
}

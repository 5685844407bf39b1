use crate::common::types::Amount;
use crate::payouts::PayoutTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-player activity counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_spins: u64,
    pub total_wagered: Amount,
    pub total_won: Amount,
    pub jackpots_won: u64,
    pub last_spin_at: Option<u64>,
}

/// Machine-wide counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub total_spins: u64,
    pub settled_spins: u64,
    pub total_wagered: Amount,
    pub total_paid: Amount,
    pub total_shortfall: Amount,
    pub jackpots_paid: u64,
    pub tier_counts: BTreeMap<PayoutTier, u64>,
    /// External inflows: deposits, credit purchases and funding
    pub total_deposited: Amount,
    pub total_withdrawn: Amount,
}

impl GameStats {
    /// Value that external flows have put into the system
    pub fn net_external(&self) -> Amount {
        self.total_deposited.saturating_sub(self.total_withdrawn)
    }

    pub fn pending_spins(&self) -> u64 {
        self.total_spins.saturating_sub(self.settled_spins)
    }
}

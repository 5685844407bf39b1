use crate::common::types::{apply_bps, Amount};
use crate::errors::{EconomicError, SlotResult};
use serde::{Deserialize, Serialize};

/// Shared prize pool funded by a share of every bet
///
/// All pool movements go through this type so the balance can never go
/// negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizePool {
    balance: Amount,
}

impl PrizePool {
    pub fn new(balance: Amount) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn credit(&mut self, amount: Amount) -> SlotResult<()> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(EconomicError::Overflow("prize pool credit"))?;
        Ok(())
    }

    pub fn debit(&mut self, amount: Amount) -> SlotResult<()> {
        if amount > self.balance {
            return Err(EconomicError::InsufficientPool {
                requested: amount,
                available: self.balance,
            }
            .into());
        }
        self.balance -= amount;
        Ok(())
    }

    /// Jackpot owed right now for a pool share in basis points
    pub fn jackpot_payout(&self, share_bps: u32) -> Amount {
        apply_bps(self.balance, share_bps)
    }
}

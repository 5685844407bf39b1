//! Settlement ledger
//!
//! Owns player balances, the house bankroll and the prize pool. Every
//! operation is planned first: `plan_*` computes a [`LedgerDelta`] holding
//! the post-state of each touched account without mutating anything, the
//! caller makes the delta durable, then [`SettlementLedger::apply`] installs
//! it. A failed plan or commit therefore leaves no trace.

use crate::common::types::{apply_bps, Amount, PlayerId};
use crate::config::{LedgerConfig, ShortfallPolicy};
use crate::errors::{EconomicError, InputError, SlotResult};
use crate::payouts::PayoutTier;
use crate::settlement::prize_pool::PrizePool;
use crate::settlement::stats::{GameStats, PlayerStats};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Account a payout is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutSource {
    None,
    House,
    PrizePool,
}

/// Outcome of settling one spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub tier: PayoutTier,
    pub source: PayoutSource,
    /// Amount credited to the player
    pub amount: Amount,
    /// Owed but unpaid under the clamp policy
    pub shortfall: Amount,
}

/// Post-state of every account touched by one operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerDelta {
    pub balances: Vec<(PlayerId, Amount)>,
    pub player_stats: Vec<(PlayerId, PlayerStats)>,
    pub house: Option<Amount>,
    pub prize_pool: Option<Amount>,
    pub game_stats: Option<GameStats>,
}

impl LedgerDelta {
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
            && self.player_stats.is_empty()
            && self.house.is_none()
            && self.prize_pool.is_none()
            && self.game_stats.is_none()
    }

    /// Post-state balance of `player` if this delta touches it
    pub fn balance_of(&self, player: &str) -> Option<Amount> {
        self.balances
            .iter()
            .find(|(id, _)| id == player)
            .map(|(_, balance)| *balance)
    }
}

/// Full ledger state, as persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub balances: HashMap<PlayerId, Amount>,
    pub player_stats: HashMap<PlayerId, PlayerStats>,
    pub house: Amount,
    pub prize_pool: Amount,
    pub game_stats: GameStats,
}

pub struct SettlementLedger {
    config: LedgerConfig,
    balances: HashMap<PlayerId, Amount>,
    player_stats: HashMap<PlayerId, PlayerStats>,
    house: Amount,
    pool: PrizePool,
    game_stats: GameStats,
}

impl SettlementLedger {
    pub fn new(config: LedgerConfig, pool: PrizePool) -> Self {
        Self {
            config,
            balances: HashMap::new(),
            player_stats: HashMap::new(),
            house: 0,
            pool,
            game_stats: GameStats::default(),
        }
    }

    pub fn restore(config: LedgerConfig, snapshot: LedgerSnapshot) -> Self {
        Self {
            config,
            balances: snapshot.balances,
            player_stats: snapshot.player_stats,
            house: snapshot.house,
            pool: PrizePool::new(snapshot.prize_pool),
            game_stats: snapshot.game_stats,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn balance(&self, player: &str) -> Amount {
        self.balances.get(player).copied().unwrap_or(0)
    }

    pub fn house_balance(&self) -> Amount {
        self.house
    }

    pub fn prize_pool(&self) -> &PrizePool {
        &self.pool
    }

    pub fn player_stats(&self, player: &str) -> PlayerStats {
        self.player_stats.get(player).cloned().unwrap_or_default()
    }

    pub fn game_stats(&self) -> &GameStats {
        &self.game_stats
    }

    pub fn player_count(&self) -> usize {
        self.balances.len()
    }

    /// Sum of every account: players, house bankroll and prize pool
    pub fn total_supply(&self) -> Amount {
        self.balances
            .values()
            .fold(self.house.saturating_add(self.pool.balance()), |acc, b| {
                acc.saturating_add(*b)
            })
    }

    /// Total supply equals what external flows put in
    pub fn is_conserved(&self) -> bool {
        self.total_supply() == self.game_stats.net_external()
    }

    /// Debit the spin cost and split it between the pool and the house
    pub fn plan_accept(&self, player: &str, cost: Amount, now: u64) -> SlotResult<LedgerDelta> {
        check_player(player)?;
        if cost == 0 {
            return Err(InputError::ZeroAmount.into());
        }

        let available = self.balance(player);
        if available < cost {
            return Err(EconomicError::InsufficientBalance {
                player: player.to_string(),
                available,
                required: cost,
            }
            .into());
        }

        let pool_share = apply_bps(cost, self.config.prize_pool_bps);
        let house_share = cost - pool_share;

        let mut pool = self.pool;
        pool.credit(pool_share)?;
        let house = self
            .house
            .checked_add(house_share)
            .ok_or(EconomicError::Overflow("house bankroll"))?;

        let mut stats = self.player_stats(player);
        stats.total_spins += 1;
        stats.total_wagered = stats.total_wagered.saturating_add(cost);
        stats.last_spin_at = Some(now);

        let mut game_stats = self.game_stats.clone();
        game_stats.total_spins += 1;
        game_stats.total_wagered = game_stats.total_wagered.saturating_add(cost);

        Ok(LedgerDelta {
            balances: vec![(player.to_string(), available - cost)],
            player_stats: vec![(player.to_string(), stats)],
            house: Some(house),
            prize_pool: Some(pool.balance()),
            game_stats: Some(game_stats),
        })
    }

    /// What a tier is owed and which account pays it
    pub fn payout_owed(&self, bet_amount: Amount, tier: PayoutTier) -> SlotResult<(Amount, PayoutSource)> {
        let multiplier = match tier {
            PayoutTier::Lose => return Ok((0, PayoutSource::None)),
            PayoutTier::Jackpot => {
                return Ok((
                    self.pool.jackpot_payout(self.config.jackpot_share_bps),
                    PayoutSource::PrizePool,
                ))
            }
            PayoutTier::SmallWin => self.config.multipliers.small_win,
            PayoutTier::MediumWin => self.config.multipliers.medium_win,
            PayoutTier::BigWin => self.config.multipliers.big_win,
            PayoutTier::MegaWin => self.config.multipliers.mega_win,
            PayoutTier::UltraWin => self.config.multipliers.ultra_win,
            PayoutTier::SpecialCombo => self.config.multipliers.special_combo,
        };

        let owed = bet_amount
            .checked_mul(multiplier as u128)
            .ok_or(EconomicError::Overflow("payout multiplier"))?;
        Ok((owed, PayoutSource::House))
    }

    /// Credit the payout for a classified spin
    pub fn plan_settle(
        &self,
        player: &str,
        bet_amount: Amount,
        tier: PayoutTier,
    ) -> SlotResult<(LedgerDelta, Payout)> {
        check_player(player)?;
        let (owed, source) = self.payout_owed(bet_amount, tier)?;

        let available = match source {
            PayoutSource::None => 0,
            PayoutSource::House => self.house,
            PayoutSource::PrizePool => self.pool.balance(),
        };

        let (amount, shortfall) = if owed <= available {
            (owed, 0)
        } else {
            match (self.config.shortfall_policy, source) {
                (ShortfallPolicy::Clamp, _) => (available, owed - available),
                (ShortfallPolicy::Reject, PayoutSource::PrizePool) => {
                    return Err(EconomicError::InsufficientPool {
                        requested: owed,
                        available,
                    }
                    .into())
                }
                (ShortfallPolicy::Reject, _) => {
                    return Err(EconomicError::InsufficientBankroll {
                        requested: owed,
                        available,
                    }
                    .into())
                }
            }
        };

        let mut delta = LedgerDelta::default();
        match source {
            PayoutSource::None => {}
            PayoutSource::House => delta.house = Some(self.house - amount),
            PayoutSource::PrizePool => {
                let mut pool = self.pool;
                pool.debit(amount)?;
                delta.prize_pool = Some(pool.balance());
            }
        }

        let balance = self
            .balance(player)
            .checked_add(amount)
            .ok_or(EconomicError::Overflow("player balance"))?;
        delta.balances.push((player.to_string(), balance));

        let mut stats = self.player_stats(player);
        stats.total_won = stats.total_won.saturating_add(amount);
        if tier == PayoutTier::Jackpot {
            stats.jackpots_won += 1;
        }
        delta.player_stats.push((player.to_string(), stats));

        let mut game_stats = self.game_stats.clone();
        game_stats.settled_spins += 1;
        game_stats.total_paid = game_stats.total_paid.saturating_add(amount);
        game_stats.total_shortfall = game_stats.total_shortfall.saturating_add(shortfall);
        *game_stats.tier_counts.entry(tier).or_insert(0) += 1;
        if tier == PayoutTier::Jackpot {
            game_stats.jackpots_paid += 1;
        }
        delta.game_stats = Some(game_stats);

        Ok((
            delta,
            Payout {
                tier,
                source,
                amount,
                shortfall,
            },
        ))
    }

    /// External credit into a player account
    pub fn plan_deposit(&self, player: &str, amount: Amount) -> SlotResult<LedgerDelta> {
        check_player(player)?;
        if amount == 0 {
            return Err(InputError::ZeroAmount.into());
        }

        let balance = self
            .balance(player)
            .checked_add(amount)
            .ok_or(EconomicError::Overflow("player balance"))?;
        Ok(LedgerDelta {
            balances: vec![(player.to_string(), balance)],
            game_stats: Some(self.inflow(amount)?),
            ..LedgerDelta::default()
        })
    }

    /// External debit out of a player account
    pub fn plan_withdraw(&self, player: &str, amount: Amount) -> SlotResult<LedgerDelta> {
        check_player(player)?;
        if amount == 0 {
            return Err(InputError::ZeroAmount.into());
        }

        let available = self.balance(player);
        if available < amount {
            return Err(EconomicError::InsufficientBalance {
                player: player.to_string(),
                available,
                required: amount,
            }
            .into());
        }

        let mut game_stats = self.game_stats.clone();
        game_stats.total_withdrawn = game_stats.total_withdrawn.saturating_add(amount);
        Ok(LedgerDelta {
            balances: vec![(player.to_string(), available - amount)],
            game_stats: Some(game_stats),
            ..LedgerDelta::default()
        })
    }

    /// External top-up of the prize pool
    pub fn plan_fund_prize_pool(&self, amount: Amount) -> SlotResult<LedgerDelta> {
        if amount == 0 {
            return Err(InputError::ZeroAmount.into());
        }
        let mut pool = self.pool;
        pool.credit(amount)?;
        Ok(LedgerDelta {
            prize_pool: Some(pool.balance()),
            game_stats: Some(self.inflow(amount)?),
            ..LedgerDelta::default()
        })
    }

    /// External top-up of the house bankroll
    pub fn plan_fund_house(&self, amount: Amount) -> SlotResult<LedgerDelta> {
        if amount == 0 {
            return Err(InputError::ZeroAmount.into());
        }
        let house = self
            .house
            .checked_add(amount)
            .ok_or(EconomicError::Overflow("house bankroll"))?;
        Ok(LedgerDelta {
            house: Some(house),
            game_stats: Some(self.inflow(amount)?),
            ..LedgerDelta::default()
        })
    }

    fn inflow(&self, amount: Amount) -> SlotResult<GameStats> {
        let mut game_stats = self.game_stats.clone();
        game_stats.total_deposited = game_stats
            .total_deposited
            .checked_add(amount)
            .ok_or(EconomicError::Overflow("deposits"))?;
        Ok(game_stats)
    }

    /// Install a planned delta
    pub fn apply(&mut self, delta: LedgerDelta) {
        for (player, balance) in delta.balances {
            self.balances.insert(player, balance);
        }
        for (player, stats) in delta.player_stats {
            self.player_stats.insert(player, stats);
        }
        if let Some(house) = delta.house {
            self.house = house;
        }
        if let Some(pool) = delta.prize_pool {
            self.pool = PrizePool::new(pool);
        }
        if let Some(game_stats) = delta.game_stats {
            self.game_stats = game_stats;
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            balances: self.balances.clone(),
            player_stats: self.player_stats.clone(),
            house: self.house,
            prize_pool: self.pool.balance(),
            game_stats: self.game_stats.clone(),
        }
    }
}

fn check_player(player: &str) -> SlotResult<()> {
    if player.is_empty() {
        return Err(InputError::EmptyPlayerId.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::CREDIT_UNIT;
    use crate::errors::SlotError;

    fn ledger_with(policy: ShortfallPolicy) -> SettlementLedger {
        let config = LedgerConfig {
            shortfall_policy: policy,
            ..LedgerConfig::default()
        };
        SettlementLedger::new(config, PrizePool::default())
    }

    fn run(ledger: &mut SettlementLedger, delta: SlotResult<LedgerDelta>) {
        let delta = delta.unwrap();
        ledger.apply(delta);
    }

    #[test]
    fn test_accept_splits_cost() {
        let mut ledger = ledger_with(ShortfallPolicy::Clamp);
        let delta = ledger.plan_deposit("alice", 10 * CREDIT_UNIT);
        run(&mut ledger, delta);

        let delta = ledger.plan_accept("alice", 2 * CREDIT_UNIT, 50);
        run(&mut ledger, delta);
        assert_eq!(ledger.balance("alice"), 8 * CREDIT_UNIT);
        assert_eq!(ledger.prize_pool().balance(), 19 * CREDIT_UNIT / 10);
        assert_eq!(ledger.house_balance(), CREDIT_UNIT / 10);

        let stats = ledger.player_stats("alice");
        assert_eq!(stats.total_spins, 1);
        assert_eq!(stats.total_wagered, 2 * CREDIT_UNIT);
        assert_eq!(stats.last_spin_at, Some(50));
        assert!(ledger.is_conserved());
    }

    #[test]
    fn test_accept_insufficient_balance_changes_nothing() {
        let mut ledger = ledger_with(ShortfallPolicy::Clamp);
        let delta = ledger.plan_deposit("alice", 5);
        run(&mut ledger, delta);
        let before = ledger.snapshot();

        assert!(matches!(
            ledger.plan_accept("alice", 6, 0),
            Err(SlotError::Economic(EconomicError::InsufficientBalance {
                available: 5,
                required: 6,
                ..
            }))
        ));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_planning_does_not_mutate() {
        let mut ledger = ledger_with(ShortfallPolicy::Clamp);
        let delta = ledger.plan_deposit("alice", 100);
        run(&mut ledger, delta);
        let before = ledger.snapshot();

        let delta = ledger.plan_accept("alice", 40, 0).unwrap();
        assert_eq!(delta.balance_of("alice"), Some(60));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_multiplier_payout_from_house() {
        let mut ledger = ledger_with(ShortfallPolicy::Clamp);
        let delta = ledger.plan_fund_house(1_000);
        run(&mut ledger, delta);
        let delta = ledger.plan_deposit("bob", 100);
        run(&mut ledger, delta);
        let delta = ledger.plan_accept("bob", 10, 0);
        run(&mut ledger, delta);

        let (delta, payout) = ledger.plan_settle("bob", 10, PayoutTier::BigWin).unwrap();
        ledger.apply(delta);

        assert_eq!(payout.amount, 100);
        assert_eq!(payout.source, PayoutSource::House);
        assert_eq!(payout.shortfall, 0);
        assert_eq!(ledger.balance("bob"), 190);
        assert!(ledger.is_conserved());
    }

    #[test]
    fn test_jackpot_takes_quarter_of_pool() {
        let mut ledger = ledger_with(ShortfallPolicy::Clamp);
        let delta = ledger.plan_fund_prize_pool(4_000);
        run(&mut ledger, delta);
        let delta = ledger.plan_deposit("carol", 10);
        run(&mut ledger, delta);

        let (delta, payout) = ledger.plan_settle("carol", 10, PayoutTier::Jackpot).unwrap();
        ledger.apply(delta);

        assert_eq!(payout.amount, 1_000);
        assert_eq!(payout.source, PayoutSource::PrizePool);
        assert_eq!(ledger.prize_pool().balance(), 3_000);
        assert_eq!(ledger.player_stats("carol").jackpots_won, 1);
        assert_eq!(ledger.game_stats().jackpots_paid, 1);
        assert!(ledger.is_conserved());
    }

    #[test]
    fn test_lose_pays_nothing() {
        let mut ledger = ledger_with(ShortfallPolicy::Reject);
        let (delta, payout) = ledger.plan_settle("dave", 10, PayoutTier::Lose).unwrap();
        ledger.apply(delta);
        assert_eq!(payout.amount, 0);
        assert_eq!(payout.source, PayoutSource::None);
        assert_eq!(ledger.game_stats().tier_counts.get(&PayoutTier::Lose), Some(&1));
    }

    #[test]
    fn test_clamp_records_shortfall() {
        let mut ledger = ledger_with(ShortfallPolicy::Clamp);
        let delta = ledger.plan_fund_house(30);
        run(&mut ledger, delta);

        let (delta, payout) = ledger.plan_settle("erin", 10, PayoutTier::MegaWin).unwrap();
        ledger.apply(delta);

        assert_eq!(payout.amount, 30);
        assert_eq!(payout.shortfall, 470);
        assert_eq!(ledger.house_balance(), 0);
        assert_eq!(ledger.game_stats().total_shortfall, 470);
        assert!(ledger.is_conserved());
    }

    #[test]
    fn test_reject_policy() {
        let mut ledger = ledger_with(ShortfallPolicy::Reject);
        let delta = ledger.plan_fund_house(30);
        run(&mut ledger, delta);

        assert!(matches!(
            ledger.plan_settle("erin", 10, PayoutTier::MegaWin),
            Err(SlotError::Economic(EconomicError::InsufficientBankroll {
                requested: 500,
                available: 30
            }))
        ));
    }

    #[test]
    fn test_withdraw() {
        let mut ledger = ledger_with(ShortfallPolicy::Clamp);
        let delta = ledger.plan_deposit("frank", 50);
        run(&mut ledger, delta);
        let delta = ledger.plan_withdraw("frank", 20);
        run(&mut ledger, delta);
        assert_eq!(ledger.balance("frank"), 30);
        assert!(ledger.plan_withdraw("frank", 31).is_err());
        assert!(ledger.is_conserved());
    }

    #[test]
    fn test_input_validation() {
        let ledger = ledger_with(ShortfallPolicy::Clamp);
        assert!(matches!(
            ledger.plan_deposit("", 1),
            Err(SlotError::Input(InputError::EmptyPlayerId))
        ));
        assert!(matches!(
            ledger.plan_deposit("alice", 0),
            Err(SlotError::Input(InputError::ZeroAmount))
        ));
        assert!(ledger.plan_fund_house(0).is_err());
    }

    #[test]
    fn test_restore_from_snapshot() {
        let mut ledger = ledger_with(ShortfallPolicy::Clamp);
        let delta = ledger.plan_deposit("alice", 500);
        run(&mut ledger, delta);
        let delta = ledger.plan_accept("alice", 100, 7);
        run(&mut ledger, delta);

        let restored = SettlementLedger::restore(LedgerConfig::default(), ledger.snapshot());
        assert_eq!(restored.balance("alice"), 400);
        assert_eq!(restored.prize_pool().balance(), 95);
        assert_eq!(restored.house_balance(), 5);
        assert_eq!(restored.total_supply(), 500);
    }
}

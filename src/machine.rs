//! Slot machine service facade
//!
//! Composes pricing, the request correlator, the payout classifier and the
//! settlement ledger behind one mutex so every operation runs as a single
//! serialized unit. Each durable state transition is committed to the store
//! as one batch before it is applied in memory.

use crate::common::traits::{Clock, PriceFeed, RandomnessOracle, SystemClock};
use crate::common::types::{Amount, RandomnessRequest, RequestId};
use crate::config::SlotConfig;
use crate::errors::{EconomicError, InputError, ProtocolError, SlotResult};
use crate::metrics::SlotMetrics;
use crate::payouts::{check_reel_count, PayoutClassifier};
use crate::pricing::{PriceOracle, PricingCalculator, SpinCost};
use crate::settlement::{GameStats, LedgerDelta, PlayerStats, PrizePool, SettlementLedger};
use crate::spin_store;
use crate::spins::{
    RandomWord, RequestCorrelator, ResultWaiters, SpinEvent, SpinRecord, SpinResult,
    SpinSettlement,
};
use crate::storage::{KvStore, StoreBatch};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

struct MachineState {
    correlator: RequestCorrelator,
    ledger: SettlementLedger,
}

/// Machine-wide figures for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineStats {
    pub game: GameStats,
    pub prize_pool: Amount,
    pub house_bankroll: Amount,
    pub pending_requests: usize,
    pub players: usize,
    pub total_supply: Amount,
    pub conserved: bool,
}

/// Builder for [`SlotMachine`]
pub struct SlotMachineBuilder {
    config: SlotConfig,
    price_feed: Arc<dyn PriceFeed>,
    oracle: Arc<dyn RandomnessOracle>,
    clock: Arc<dyn Clock>,
    classifier: Option<PayoutClassifier>,
    store: Option<Arc<dyn KvStore>>,
}

impl SlotMachineBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn classifier(mut self, classifier: PayoutClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Persist every transition to `store` and restore existing state from it
    pub fn store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> SlotResult<SlotMachine> {
        self.config.validate()?;

        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => PayoutClassifier::from_config(&self.config.tables)?,
        };

        let (correlator, ledger) = match self.store {
            Some(ref store) => {
                let state = spin_store::load_state(store.as_ref())?;
                info!(
                    records = state.records.len(),
                    players = state.ledger.balances.len(),
                    prize_pool = %state.ledger.prize_pool,
                    "Restored slot machine state"
                );
                (
                    RequestCorrelator::restore(state.records),
                    SettlementLedger::restore(self.config.ledger.clone(), state.ledger),
                )
            }
            None => (
                RequestCorrelator::new(),
                SettlementLedger::new(self.config.ledger.clone(), PrizePool::default()),
            ),
        };

        let oracle = PriceOracle::new(self.price_feed, self.clock.clone(), self.config.oracle.clone());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let machine = SlotMachine {
            pricing: PricingCalculator::new(oracle, self.config.pricing.clone()),
            classifier,
            oracle: self.oracle,
            clock: self.clock,
            store: self.store,
            state: Mutex::new(MachineState { correlator, ledger }),
            waiters: ResultWaiters::new(),
            events,
            metrics: SlotMetrics::new()?,
        };

        let settled = machine.settle_outstanding();
        if settled > 0 {
            info!(settled, "Settled spins left fulfilled by a previous run");
        }
        machine.refresh_gauges(&machine.lock());

        Ok(machine)
    }
}

pub struct SlotMachine {
    pricing: PricingCalculator,
    classifier: PayoutClassifier,
    oracle: Arc<dyn RandomnessOracle>,
    clock: Arc<dyn Clock>,
    store: Option<Arc<dyn KvStore>>,
    state: Mutex<MachineState>,
    waiters: ResultWaiters,
    events: broadcast::Sender<SpinEvent>,
    metrics: SlotMetrics,
}

impl SlotMachine {
    pub fn builder(
        config: SlotConfig,
        price_feed: Arc<dyn PriceFeed>,
        oracle: Arc<dyn RandomnessOracle>,
    ) -> SlotMachineBuilder {
        SlotMachineBuilder {
            config,
            price_feed,
            oracle,
            clock: Arc::new(SystemClock),
            classifier: None,
            store: None,
        }
    }

    /// State stays consistent across a panic because nothing is applied
    /// before its commit succeeds, so a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, MachineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(&self, batch: StoreBatch) -> SlotResult<()> {
        match self.store {
            Some(ref store) => store.write(batch),
            None => Ok(()),
        }
    }

    fn emit(&self, event: SpinEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn refresh_gauges(&self, state: &MachineState) {
        self.metrics.set_pending(state.correlator.pending_count());
        self.metrics
            .set_balances(state.ledger.prize_pool().balance(), state.ledger.house_balance());
    }

    /// Price, debit and submit a spin; `bet_amount` caps what the player will pay
    pub fn spin(&self, player: &str, reel_count: u8, bet_amount: Amount) -> SlotResult<RequestId> {
        let result = self.try_spin(player, reel_count, bet_amount);
        if let Err(ref e) = result {
            self.metrics.record_spin_rejected(e.kind());
            debug!(player, reel_count, error = %e, "Spin refused");
        }
        result
    }

    fn try_spin(&self, player: &str, reel_count: u8, bet_amount: Amount) -> SlotResult<RequestId> {
        check_reel_count(reel_count)?;
        if player.is_empty() {
            return Err(InputError::EmptyPlayerId.into());
        }

        let cost = self.pricing.compute_spin_cost(reel_count)?;
        if cost.settlement_amount > bet_amount {
            return Err(EconomicError::CostAboveLimit {
                cost: cost.settlement_amount,
                limit: bet_amount,
            }
            .into());
        }

        let mut state = self.lock();
        let now = self.clock.now_unix();
        let accept = state.ledger.plan_accept(player, cost.settlement_amount, now)?;

        let request_id = self.oracle.request_randomness(cost.fee_payment, 1)?;
        let record = state.correlator.prepare_submit(
            request_id,
            player,
            reel_count,
            cost.settlement_amount,
            cost.fee_payment,
            now,
        )?;

        let mut batch = StoreBatch::new();
        spin_store::put_ledger_delta(&mut batch, &accept)?;
        spin_store::put_spin_record(&mut batch, &record)?;
        self.commit(batch)?;

        state.ledger.apply(accept);
        state.correlator.record(record);
        self.metrics.record_spin();
        self.refresh_gauges(&state);
        drop(state);

        info!(
            request_id,
            player,
            reel_count,
            bet_amount = %cost.settlement_amount,
            "Spin initiated"
        );
        self.emit(SpinEvent::SpinInitiated {
            request_id,
            player: player.to_string(),
            reel_count,
            bet_amount: cost.settlement_amount,
        });
        self.emit(SpinEvent::RandomnessRequested {
            request_id,
            fee_payment: cost.fee_payment,
        });

        Ok(request_id)
    }

    /// Oracle callback: consume the word for `request_id` and settle the spin
    ///
    /// The fulfilled flag is committed before classification, so a replayed
    /// callback is rejected with `AlreadyFulfilled` even if settlement fails.
    pub fn fulfill(&self, request_id: RequestId, word: RandomWord) -> SlotResult<SpinResult> {
        let mut state = self.lock();

        let fulfilled = match state.correlator.prepare_fulfill(request_id, word) {
            Ok(record) => record,
            Err(e) => {
                self.metrics.record_callback_rejected(e.kind());
                warn!(request_id, error = %e, "Randomness callback rejected");
                return Err(e);
            }
        };

        let mut batch = StoreBatch::new();
        spin_store::put_spin_record(&mut batch, &fulfilled)?;
        self.commit(batch)?;
        state.correlator.record(fulfilled);
        self.refresh_gauges(&state);

        self.settle_locked(&mut state, request_id)
    }

    fn settle_locked(&self, state: &mut MachineState, request_id: RequestId) -> SlotResult<SpinResult> {
        let record: SpinRecord = state
            .correlator
            .get(request_id)
            .cloned()
            .ok_or(ProtocolError::UnknownRequest(request_id))?;
        let combination = record
            .combination
            .ok_or(ProtocolError::UnknownRequest(request_id))?;

        let classification = self.classifier.classify_combination(&combination);
        let (delta, payout) =
            state
                .ledger
                .plan_settle(&record.player, record.bet_amount, classification.tier)?;
        let settled = state.correlator.prepare_settlement(
            request_id,
            SpinSettlement {
                tier: payout.tier,
                resolution: classification.resolution,
                payout_amount: payout.amount,
                shortfall: payout.shortfall,
                settled_at: self.clock.now_unix(),
            },
        )?;

        let mut batch = StoreBatch::new();
        spin_store::put_ledger_delta(&mut batch, &delta)?;
        spin_store::put_spin_record(&mut batch, &settled)?;
        self.commit(batch)?;

        state.ledger.apply(delta);
        state.correlator.record(settled.clone());
        self.metrics.record_settlement(payout.tier, classification.resolution);
        self.refresh_gauges(state);

        if payout.shortfall > 0 {
            warn!(
                request_id,
                tier = %payout.tier,
                paid = %payout.amount,
                shortfall = %payout.shortfall,
                "Payout clamped to available funds"
            );
        }
        info!(
            request_id,
            player = %record.player,
            combination = %combination,
            tier = %payout.tier,
            payout = %payout.amount,
            "Spin settled"
        );

        let result = settled.result();
        self.waiters.complete(request_id, &result);
        self.emit(SpinEvent::SpinSettled {
            request_id,
            player: record.player,
            combination: combination.value(),
            tier: payout.tier,
            payout_amount: payout.amount,
            shortfall: payout.shortfall,
        });

        Ok(result)
    }

    /// Retry settlement of spins whose randomness was consumed but whose
    /// payout could not be recorded; returns how many settled
    pub fn settle_outstanding(&self) -> usize {
        let mut state = self.lock();
        self.settle_outstanding_locked(&mut state)
    }

    fn settle_outstanding_locked(&self, state: &mut MachineState) -> usize {
        let outstanding: Vec<RequestId> = state
            .correlator
            .unsettled()
            .iter()
            .map(|r| r.request_id)
            .collect();

        let mut settled = 0;
        for request_id in outstanding {
            match self.settle_locked(state, request_id) {
                Ok(_) => settled += 1,
                Err(e) => warn!(request_id, error = %e, "Settlement still blocked"),
            }
        }
        settled
    }

    /// Read-only view of a spin, pending or settled
    pub fn get_spin_result(&self, request_id: RequestId) -> SlotResult<SpinResult> {
        self.lock()
            .correlator
            .get(request_id)
            .map(SpinRecord::result)
            .ok_or_else(|| ProtocolError::UnknownRequest(request_id).into())
    }

    /// Wait up to `timeout` for a spin to settle, then report its current state
    pub async fn wait_for_result(&self, request_id: RequestId, timeout: Duration) -> SlotResult<SpinResult> {
        let mut subscription = {
            let state = self.lock();
            let record = state
                .correlator
                .get(request_id)
                .ok_or(ProtocolError::UnknownRequest(request_id))?;
            if record.is_settled() {
                return Ok(record.result());
            }
            self.waiters.subscribe(request_id)
        };

        match subscription.recv(timeout).await {
            Some(result) => Ok(result),
            None => {
                drop(subscription);
                self.get_spin_result(request_id)
            }
        }
    }

    /// Randomness requests still waiting for a word, oldest first
    pub fn pending_requests(&self) -> Vec<RandomnessRequest> {
        let state = self.lock();
        state
            .correlator
            .pending_ids()
            .filter_map(|id| state.correlator.get(id))
            .map(|record| RandomnessRequest {
                request_id: record.request_id,
                payment: record.fee_payment,
                num_words: 1,
            })
            .collect()
    }

    /// A player's most recent spins, newest first
    pub fn player_spins(&self, player: &str, limit: usize) -> Vec<SpinResult> {
        self.lock()
            .correlator
            .records_for(player, limit)
            .into_iter()
            .map(SpinRecord::result)
            .collect()
    }

    fn run_ledger_op<F>(&self, op: &'static str, plan: F) -> SlotResult<()>
    where
        F: FnOnce(&SettlementLedger) -> SlotResult<LedgerDelta>,
    {
        let mut state = self.lock();
        let delta = plan(&state.ledger)?;

        let mut batch = StoreBatch::new();
        spin_store::put_ledger_delta(&mut batch, &delta)?;
        self.commit(batch)?;
        state.ledger.apply(delta);
        debug!(op, "Ledger updated");

        // new funds may unblock settlements refused under the reject policy
        if !state.correlator.unsettled().is_empty() {
            self.settle_outstanding_locked(&mut state);
        }
        self.refresh_gauges(&state);
        Ok(())
    }

    pub fn deposit(&self, player: &str, amount: Amount) -> SlotResult<Amount> {
        self.run_ledger_op("deposit", |ledger| ledger.plan_deposit(player, amount))?;
        info!(player, amount = %amount, "Deposit");
        Ok(self.balance(player))
    }

    pub fn withdraw(&self, player: &str, amount: Amount) -> SlotResult<Amount> {
        self.run_ledger_op("withdraw", |ledger| ledger.plan_withdraw(player, amount))?;
        info!(player, amount = %amount, "Withdrawal");
        Ok(self.balance(player))
    }

    /// Mint credits for a base-asset deposit at the fixed rate; returns the credits minted
    pub fn buy_credits(&self, player: &str, base_amount: Amount) -> SlotResult<Amount> {
        let credits = self.pricing.credits_for_base_deposit(base_amount)?;
        self.run_ledger_op("buy_credits", |ledger| ledger.plan_deposit(player, credits))?;
        info!(player, base_amount = %base_amount, credits = %credits, "Credits purchased");
        Ok(credits)
    }

    pub fn fund_prize_pool(&self, amount: Amount) -> SlotResult<Amount> {
        self.run_ledger_op("fund_prize_pool", |ledger| ledger.plan_fund_prize_pool(amount))?;
        info!(amount = %amount, "Prize pool funded");
        Ok(self.prize_pool_balance())
    }

    pub fn fund_house(&self, amount: Amount) -> SlotResult<Amount> {
        self.run_ledger_op("fund_house", |ledger| ledger.plan_fund_house(amount))?;
        info!(amount = %amount, "House bankroll funded");
        Ok(self.lock().ledger.house_balance())
    }

    pub fn balance(&self, player: &str) -> Amount {
        self.lock().ledger.balance(player)
    }

    pub fn prize_pool_balance(&self) -> Amount {
        self.lock().ledger.prize_pool().balance()
    }

    pub fn player_stats(&self, player: &str) -> PlayerStats {
        self.lock().ledger.player_stats(player)
    }

    pub fn game_stats(&self) -> GameStats {
        self.lock().ledger.game_stats().clone()
    }

    pub fn stats(&self) -> MachineStats {
        let state = self.lock();
        MachineStats {
            game: state.ledger.game_stats().clone(),
            prize_pool: state.ledger.prize_pool().balance(),
            house_bankroll: state.ledger.house_balance(),
            pending_requests: state.correlator.pending_count(),
            players: state.ledger.player_count(),
            total_supply: state.ledger.total_supply(),
            conserved: state.ledger.is_conserved(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.lock().correlator.pending_count()
    }

    pub fn pricing_breakdown(&self, reel_count: u8) -> SlotResult<SpinCost> {
        self.pricing.pricing_breakdown(reel_count)
    }

    /// Cost of every supported reel count at current prices
    pub fn cost_schedule(&self) -> SlotResult<Vec<SpinCost>> {
        self.pricing.cost_schedule()
    }

    pub fn classifier(&self) -> &PayoutClassifier {
        &self.classifier
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SpinEvent> {
        self.events.subscribe()
    }

    pub fn metrics(&self) -> &SlotMetrics {
        &self.metrics
    }

    pub fn waiters(&self) -> &ResultWaiters {
        &self.waiters
    }
}

impl std::fmt::Debug for SlotMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotMachine")
            .field("persistent", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::traits::ManualClock;
    use crate::common::types::{AssetId, CREDIT_UNIT};
    use crate::config::ShortfallPolicy;
    use crate::errors::{OracleError, SlotError};
    use crate::payouts::PayoutTier;
    use crate::pricing::StaticPriceFeed;
    use crate::spins::{LocalRandomnessOracle, SpinStatus};
    use crate::storage::MemoryStorage;

    const NOW: u64 = 1_700_000_000;

    struct Harness {
        machine: SlotMachine,
        feed: Arc<StaticPriceFeed>,
        clock: Arc<ManualClock>,
        oracle: Arc<LocalRandomnessOracle>,
    }

    fn harness_with(config: SlotConfig, store: Option<Arc<dyn KvStore>>) -> Harness {
        let feed = Arc::new(StaticPriceFeed::with_prices(2_500, 15, NOW));
        let clock = Arc::new(ManualClock::new(NOW));
        let oracle = Arc::new(LocalRandomnessOracle::new());
        let classifier = PayoutClassifier::shared().unwrap().clone();

        let mut builder = SlotMachine::builder(config, feed.clone(), oracle.clone())
            .clock(clock.clone())
            .classifier(classifier);
        if let Some(store) = store {
            builder = builder.store(store);
        }

        Harness {
            machine: builder.build().unwrap(),
            feed,
            clock,
            oracle,
        }
    }

    fn harness() -> Harness {
        harness_with(SlotConfig::testing(), None)
    }

    #[test]
    fn test_spin_then_fulfill() {
        let h = harness();
        h.machine.deposit("alice", 100 * CREDIT_UNIT).unwrap();
        h.machine.fund_house(1_000 * CREDIT_UNIT).unwrap();

        let id = h.machine.spin("alice", 3, 10 * CREDIT_UNIT).unwrap();
        let cost = 275 * CREDIT_UNIT / 100;
        assert_eq!(h.machine.balance("alice"), 100 * CREDIT_UNIT - cost);
        assert_eq!(h.machine.get_spin_result(id).unwrap().status, SpinStatus::Pending);
        assert_eq!(h.oracle.requests()[0].payment, 20_000_000_000_000_000);

        let result = h.machine.fulfill(id, RandomWord::from(131_090)).unwrap();
        assert_eq!(result.combination, Some(333));
        assert_eq!(result.payout_tier, Some(PayoutTier::BigWin));
        assert_eq!(result.payout_amount, cost * 10);
        assert_eq!(
            h.machine.balance("alice"),
            100 * CREDIT_UNIT - cost + cost * 10
        );
        assert!(h.machine.stats().conserved);
    }

    #[test]
    fn test_cost_ceiling() {
        let h = harness();
        h.machine.deposit("alice", 100 * CREDIT_UNIT).unwrap();
        let err = h.machine.spin("alice", 3, CREDIT_UNIT).unwrap_err();
        assert!(matches!(err, SlotError::Economic(EconomicError::CostAboveLimit { .. })));
        assert_eq!(h.machine.balance("alice"), 100 * CREDIT_UNIT);
        assert!(h.oracle.requests().is_empty());
    }

    #[test]
    fn test_stale_price_aborts_before_debit() {
        let h = harness();
        h.machine.deposit("alice", 100 * CREDIT_UNIT).unwrap();
        h.clock.advance(86_401);

        let err = h.machine.spin("alice", 3, 10 * CREDIT_UNIT).unwrap_err();
        assert!(matches!(err, SlotError::Oracle(OracleError::StalePrice { asset: AssetId::Fee, .. })));
        assert_eq!(h.machine.balance("alice"), 100 * CREDIT_UNIT);
        assert_eq!(h.machine.pending_count(), 0);

        h.feed.set_price(AssetId::Fee, 15 * 100_000_000, NOW + 86_401).unwrap();
        let err = h.machine.spin("alice", 3, 10 * CREDIT_UNIT).unwrap_err();
        assert!(matches!(err, SlotError::Oracle(OracleError::StalePrice { asset: AssetId::Base, .. })));
        assert_eq!(h.machine.balance("alice"), 100 * CREDIT_UNIT);
    }

    #[test]
    fn test_duplicate_request_id_leaves_no_trace() {
        let h = harness();
        h.machine.deposit("alice", 100 * CREDIT_UNIT).unwrap();
        let id = h.machine.spin("alice", 4, 10 * CREDIT_UNIT).unwrap();
        let balance = h.machine.balance("alice");

        h.oracle.set_next_id(id);
        let err = h.machine.spin("alice", 4, 10 * CREDIT_UNIT).unwrap_err();
        assert!(matches!(err, SlotError::Protocol(ProtocolError::DuplicateRequest(_))));
        assert_eq!(h.machine.balance("alice"), balance);
    }

    #[test]
    fn test_reject_policy_blocks_then_settles_after_funding() {
        let mut config = SlotConfig::testing();
        config.ledger.shortfall_policy = ShortfallPolicy::Reject;
        let h = harness_with(config, None);
        h.machine.deposit("bob", 100 * CREDIT_UNIT).unwrap();

        let id = h.machine.spin("bob", 3, 10 * CREDIT_UNIT).unwrap();
        // 333 pays ten times the bet; the house only holds the edge of one spin
        let err = h.machine.fulfill(id, RandomWord::from(131_090)).unwrap_err();
        assert!(matches!(err, SlotError::Economic(EconomicError::InsufficientBankroll { .. })));
        assert_eq!(h.machine.get_spin_result(id).unwrap().status, SpinStatus::Fulfilled);

        // the word is spent even though settlement is blocked
        assert!(matches!(
            h.machine.fulfill(id, RandomWord::from(1)).unwrap_err(),
            SlotError::Protocol(ProtocolError::AlreadyFulfilled(_))
        ));

        h.machine.fund_house(1_000 * CREDIT_UNIT).unwrap();
        let result = h.machine.get_spin_result(id).unwrap();
        assert_eq!(result.status, SpinStatus::Settled);
        assert_eq!(result.payout_tier, Some(PayoutTier::BigWin));
        assert!(h.machine.stats().conserved);
    }

    #[test]
    fn test_restore_from_store() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStorage::new());
        let id = {
            let h = harness_with(SlotConfig::testing(), Some(store.clone()));
            h.machine.deposit("carol", 50 * CREDIT_UNIT).unwrap();
            h.machine.fund_prize_pool(10 * CREDIT_UNIT).unwrap();
            h.machine.spin("carol", 5, 10 * CREDIT_UNIT).unwrap()
        };

        let h = harness_with(SlotConfig::testing(), Some(store));
        assert_eq!(h.machine.pending_count(), 1);
        let before = h.machine.stats();
        assert!(before.conserved);

        let result = h.machine.fulfill(id, RandomWord::from(0x0506_0506_0506u128)).unwrap();
        assert_eq!(result.status, SpinStatus::Settled);
        assert!(h.machine.stats().conserved);
    }

    #[tokio::test]
    async fn test_wait_for_result() {
        let h = Arc::new(harness());
        h.machine.deposit("dave", 100 * CREDIT_UNIT).unwrap();
        let id = h.machine.spin("dave", 3, 10 * CREDIT_UNIT).unwrap();

        let pending = h
            .machine
            .wait_for_result(id, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(pending.status, SpinStatus::Pending);

        let waiter = {
            let h = h.clone();
            tokio::spawn(async move { h.machine.wait_for_result(id, Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.machine.fulfill(id, RandomWord::from(66_049)).unwrap();

        let settled = waiter.await.unwrap().unwrap();
        assert_eq!(settled.status, SpinStatus::Settled);
        assert_eq!(settled.reels, Some(vec![2, 1, 2]));
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let h = harness();
        let mut events = h.machine.subscribe();
        h.machine.deposit("erin", 100 * CREDIT_UNIT).unwrap();
        let id = h.machine.spin("erin", 3, 10 * CREDIT_UNIT).unwrap();
        h.machine.fulfill(id, RandomWord::from(131_088)).unwrap();

        assert!(matches!(events.recv().await.unwrap(), SpinEvent::SpinInitiated { .. }));
        assert!(matches!(events.recv().await.unwrap(), SpinEvent::RandomnessRequested { .. }));
        match events.recv().await.unwrap() {
            SpinEvent::SpinSettled { combination, .. } => assert_eq!(combination, 133),
            other => panic!("unexpected event {:?}", other),
        }
    }
}

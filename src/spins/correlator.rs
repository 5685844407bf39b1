//! Randomness request correlator
//!
//! Owns every spin request keyed by the oracle-assigned request id and
//! enforces the `Requested -> Fulfilled` state machine. Methods named
//! `prepare_*` are pure: they return the post-state record without touching
//! the table, so the caller can make it durable before calling [`record`].
//!
//! [`record`]: RequestCorrelator::record

use crate::common::types::{Amount, PlayerId, RequestId};
use crate::errors::{InputError, ProtocolError, SlotResult};
use crate::payouts::check_reel_count;
use crate::spins::types::{RandomWord, SpinRecord, SpinSettlement};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct RequestCorrelator {
    records: HashMap<RequestId, SpinRecord>,
    /// Ids still waiting for randomness, oldest first
    pending: BTreeSet<RequestId>,
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records
    pub fn restore(records: impl IntoIterator<Item = SpinRecord>) -> Self {
        let mut correlator = Self::new();
        for record in records {
            correlator.record(record);
        }
        correlator
    }

    /// New pending request for an id the oracle just issued
    pub fn prepare_submit(
        &self,
        request_id: RequestId,
        player: &str,
        reel_count: u8,
        bet_amount: Amount,
        fee_payment: Amount,
        created_at: u64,
    ) -> SlotResult<SpinRecord> {
        check_reel_count(reel_count)?;
        if player.is_empty() {
            return Err(InputError::EmptyPlayerId.into());
        }
        if self.records.contains_key(&request_id) {
            return Err(ProtocolError::DuplicateRequest(request_id).into());
        }

        Ok(SpinRecord {
            request_id,
            player: PlayerId::from(player),
            reel_count,
            bet_amount,
            fee_payment,
            created_at,
            fulfilled: false,
            random_word: None,
            combination: None,
            settlement: None,
        })
    }

    /// Consume the randomness for a pending request
    ///
    /// The returned record carries `fulfilled = true` and the derived
    /// combination; it must be made durable before settlement is attempted.
    pub fn prepare_fulfill(&self, request_id: RequestId, word: RandomWord) -> SlotResult<SpinRecord> {
        let record = self
            .records
            .get(&request_id)
            .ok_or(ProtocolError::UnknownRequest(request_id))?;
        if record.fulfilled {
            return Err(ProtocolError::AlreadyFulfilled(request_id).into());
        }

        let combination = word.combination(record.reel_count)?;
        let mut next = record.clone();
        next.fulfilled = true;
        next.random_word = Some(word);
        next.combination = Some(combination);
        Ok(next)
    }

    /// Attach the terminal settlement fields to a fulfilled request
    pub fn prepare_settlement(
        &self,
        request_id: RequestId,
        settlement: SpinSettlement,
    ) -> SlotResult<SpinRecord> {
        let record = self
            .records
            .get(&request_id)
            .ok_or(ProtocolError::UnknownRequest(request_id))?;
        if !record.fulfilled || record.is_settled() {
            return Err(ProtocolError::AlreadyFulfilled(request_id).into());
        }

        let mut next = record.clone();
        next.settlement = Some(settlement);
        Ok(next)
    }

    /// Install a record produced by one of the `prepare_*` methods
    pub fn record(&mut self, record: SpinRecord) {
        if record.fulfilled {
            self.pending.remove(&record.request_id);
        } else {
            self.pending.insert(record.request_id);
        }
        self.records.insert(record.request_id, record);
    }

    pub fn get(&self, request_id: RequestId) -> Option<&SpinRecord> {
        self.records.get(&request_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_ids(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.pending.iter().copied()
    }

    /// Fulfilled requests whose settlement was never recorded
    pub fn unsettled(&self) -> Vec<&SpinRecord> {
        let mut records: Vec<&SpinRecord> = self
            .records
            .values()
            .filter(|r| r.fulfilled && !r.is_settled())
            .collect();
        records.sort_by_key(|r| r.request_id);
        records
    }

    /// A player's most recent spins, newest first
    pub fn records_for(&self, player: &str, limit: usize) -> Vec<&SpinRecord> {
        let mut records: Vec<&SpinRecord> =
            self.records.values().filter(|r| r.player == player).collect();
        records.sort_by(|a, b| b.request_id.cmp(&a.request_id));
        records.truncate(limit);
        records
    }

    pub fn max_request_id(&self) -> Option<RequestId> {
        self.records.keys().copied().max()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

//! Persistent spin records and ledger accounts.
//!
//! Key layout:
//! - `spin:request:<id be>`            JSON [`SpinRecord`]
//! - `ledger:balance:<player>`         u128 big-endian
//! - `ledger:stats:<player>`           JSON [`PlayerStats`]
//! - `ledger:house`, `ledger:prize_pool` u128 big-endian
//! - `ledger:game_stats`               JSON [`GameStats`]

use crate::common::types::{Amount, RequestId};
use crate::errors::{SlotResult, StorageError};
use crate::settlement::{GameStats, LedgerDelta, LedgerSnapshot, PlayerStats};
use crate::spins::SpinRecord;
use crate::storage::{KvStore, StoreBatch};

const SPIN_RECORD_PREFIX: &[u8] = b"spin:request:";
const BALANCE_PREFIX: &[u8] = b"ledger:balance:";
const PLAYER_STATS_PREFIX: &[u8] = b"ledger:stats:";
const HOUSE_KEY: &[u8] = b"ledger:house";
const PRIZE_POOL_KEY: &[u8] = b"ledger:prize_pool";
const GAME_STATS_KEY: &[u8] = b"ledger:game_stats";

/// Everything needed to rebuild a slot machine
#[derive(Debug, Clone, Default)]
pub struct PersistedState {
    pub records: Vec<SpinRecord>,
    pub ledger: LedgerSnapshot,
}

impl PersistedState {
    pub fn max_request_id(&self) -> Option<RequestId> {
        self.records.iter().map(|r| r.request_id).max()
    }
}

fn spin_record_key(request_id: RequestId) -> Vec<u8> {
    let mut key = Vec::with_capacity(SPIN_RECORD_PREFIX.len() + 8);
    key.extend_from_slice(SPIN_RECORD_PREFIX);
    key.extend_from_slice(&request_id.to_be_bytes());
    key
}

fn prefixed(prefix: &[u8], player: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + player.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(player.as_bytes());
    key
}

fn encode_amount(amount: Amount) -> Vec<u8> {
    amount.to_be_bytes().to_vec()
}

fn decode_amount(key: &[u8], bytes: &[u8]) -> SlotResult<Amount> {
    let array: [u8; 16] = bytes.try_into().map_err(|_| {
        StorageError::CorruptedData(format!(
            "amount under {} has {} bytes",
            String::from_utf8_lossy(key),
            bytes.len()
        ))
    })?;
    Ok(Amount::from_be_bytes(array))
}

fn player_suffix(prefix: &[u8], key: &[u8]) -> SlotResult<String> {
    String::from_utf8(key[prefix.len()..].to_vec())
        .map_err(|e| StorageError::CorruptedData(format!("player id is not utf-8: {}", e)).into())
}

/// Stage a spin record
pub fn put_spin_record(batch: &mut StoreBatch, record: &SpinRecord) -> SlotResult<()> {
    let bytes = serde_json::to_vec(record).map_err(|e| {
        StorageError::WriteFailed(format!(
            "Failed to encode spin record {}: {}",
            record.request_id, e
        ))
    })?;
    batch.put(spin_record_key(record.request_id), bytes);
    Ok(())
}

/// Stage every account a ledger delta touches
pub fn put_ledger_delta(batch: &mut StoreBatch, delta: &LedgerDelta) -> SlotResult<()> {
    for (player, balance) in &delta.balances {
        batch.put(prefixed(BALANCE_PREFIX, player), encode_amount(*balance));
    }
    for (player, stats) in &delta.player_stats {
        let bytes = serde_json::to_vec(stats).map_err(|e| {
            StorageError::WriteFailed(format!("Failed to encode stats for {}: {}", player, e))
        })?;
        batch.put(prefixed(PLAYER_STATS_PREFIX, player), bytes);
    }
    if let Some(house) = delta.house {
        batch.put(HOUSE_KEY.to_vec(), encode_amount(house));
    }
    if let Some(pool) = delta.prize_pool {
        batch.put(PRIZE_POOL_KEY.to_vec(), encode_amount(pool));
    }
    if let Some(ref game_stats) = delta.game_stats {
        let bytes = serde_json::to_vec(game_stats).map_err(|e| {
            StorageError::WriteFailed(format!("Failed to encode game stats: {}", e))
        })?;
        batch.put(GAME_STATS_KEY.to_vec(), bytes);
    }
    Ok(())
}

pub fn load_spin_record(store: &dyn KvStore, request_id: RequestId) -> SlotResult<Option<SpinRecord>> {
    let Some(bytes) = store.get(&spin_record_key(request_id))? else {
        return Ok(None);
    };

    let record = serde_json::from_slice(&bytes).map_err(|e| {
        StorageError::CorruptedData(format!(
            "Failed to decode spin record {}: {}",
            request_id, e
        ))
    })?;
    Ok(Some(record))
}

/// Read back every spin record and ledger account
pub fn load_state(store: &dyn KvStore) -> SlotResult<PersistedState> {
    let mut state = PersistedState::default();

    for (key, bytes) in store.scan_prefix(SPIN_RECORD_PREFIX, usize::MAX)? {
        let record: SpinRecord = serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::CorruptedData(format!(
                "Failed to decode spin record under {}: {}",
                hex::encode(&key),
                e
            ))
        })?;
        state.records.push(record);
    }

    for (key, bytes) in store.scan_prefix(BALANCE_PREFIX, usize::MAX)? {
        let player = player_suffix(BALANCE_PREFIX, &key)?;
        let balance = decode_amount(&key, &bytes)?;
        state.ledger.balances.insert(player, balance);
    }

    for (key, bytes) in store.scan_prefix(PLAYER_STATS_PREFIX, usize::MAX)? {
        let player = player_suffix(PLAYER_STATS_PREFIX, &key)?;
        let stats: PlayerStats = serde_json::from_slice(&bytes)?;
        state.ledger.player_stats.insert(player, stats);
    }

    if let Some(bytes) = store.get(HOUSE_KEY)? {
        state.ledger.house = decode_amount(HOUSE_KEY, &bytes)?;
    }
    if let Some(bytes) = store.get(PRIZE_POOL_KEY)? {
        state.ledger.prize_pool = decode_amount(PRIZE_POOL_KEY, &bytes)?;
    }
    if let Some(bytes) = store.get(GAME_STATS_KEY)? {
        let game_stats: GameStats = serde_json::from_slice(&bytes)?;
        state.ledger.game_stats = game_stats;
    }

    Ok(state)
}

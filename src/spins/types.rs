use crate::common::types::{Amount, PlayerId, RequestId};
use crate::errors::{InputError, SlotResult};
use crate::payouts::{check_reel_count, Combination, PayoutTier, Resolution, SYMBOL_COUNT};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 256-bit random word delivered by the randomness oracle, big-endian
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RandomWord([u8; 32]);

impl RandomWord {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a hex word of at most 64 digits, with or without `0x`
    pub fn from_hex(value: &str) -> SlotResult<Self> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        if digits.is_empty() || digits.len() > 64 {
            return Err(InputError::InvalidRandomWord(format!(
                "expected 1 to 64 hex digits, got {}",
                digits.len()
            ))
            .into());
        }
        let padded = format!("{:0>64}", digits);
        let decoded = hex::decode(&padded).map_err(|e| InputError::InvalidRandomWord(e.to_string()))?;

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Symbol of reel `index`: `((word >> 8 * index) mod 6) + 1`
    pub fn reel(&self, index: usize) -> u8 {
        let end = self.0.len().saturating_sub(index);
        let remainder = self.0[..end]
            .iter()
            .fold(0u32, |acc, &byte| (acc * 256 + byte as u32) % SYMBOL_COUNT as u32);
        remainder as u8 + 1
    }

    /// Symbols of the first `reel_count` reels, first reel first
    pub fn reels(&self, reel_count: u8) -> Vec<u8> {
        (0..reel_count as usize).map(|index| self.reel(index)).collect()
    }

    pub fn combination(&self, reel_count: u8) -> SlotResult<Combination> {
        check_reel_count(reel_count)?;
        Combination::from_reels(&self.reels(reel_count))
    }
}

impl From<u128> for RandomWord {
    fn from(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Debug for RandomWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RandomWord(0x{})", self.to_hex())
    }
}

impl fmt::Display for RandomWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for RandomWord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RandomWord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        RandomWord::from_hex(&value).map_err(serde::de::Error::custom)
    }
}

/// Lifecycle of a spin request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinStatus {
    /// Waiting for randomness
    Pending,
    /// Randomness consumed, settlement not yet recorded
    Fulfilled,
    Settled,
}

/// Terminal fields written by the ledger at settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinSettlement {
    pub tier: PayoutTier,
    pub resolution: Resolution,
    pub payout_amount: Amount,
    /// Amount owed but not paid because the paying account ran dry
    pub shortfall: Amount,
    pub settled_at: u64,
}

/// Durable record of one spin request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinRecord {
    pub request_id: RequestId,
    pub player: PlayerId,
    pub reel_count: u8,
    /// Credits debited when the spin was accepted
    pub bet_amount: Amount,
    /// Fee-asset amount paid to the randomness oracle
    pub fee_payment: Amount,
    pub created_at: u64,
    pub fulfilled: bool,
    pub random_word: Option<RandomWord>,
    pub combination: Option<Combination>,
    pub settlement: Option<SpinSettlement>,
}

impl SpinRecord {
    pub fn status(&self) -> SpinStatus {
        match (self.fulfilled, self.settlement.is_some()) {
            (false, _) => SpinStatus::Pending,
            (true, false) => SpinStatus::Fulfilled,
            (true, true) => SpinStatus::Settled,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settlement.is_some()
    }

    pub fn result(&self) -> SpinResult {
        SpinResult {
            request_id: self.request_id,
            player: self.player.clone(),
            reel_count: self.reel_count,
            bet_amount: self.bet_amount,
            status: self.status(),
            fulfilled: self.fulfilled,
            combination: self.combination.map(|c| c.value()),
            reels: self.combination.map(|c| c.reels()),
            payout_tier: self.settlement.map(|s| s.tier),
            payout_amount: self.settlement.map(|s| s.payout_amount).unwrap_or(0),
            shortfall: self.settlement.map(|s| s.shortfall).unwrap_or(0),
            created_at: self.created_at,
            settled_at: self.settlement.map(|s| s.settled_at),
        }
    }
}

/// Read-only view of a spin, pending or settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinResult {
    pub request_id: RequestId,
    pub player: PlayerId,
    pub reel_count: u8,
    pub bet_amount: Amount,
    pub status: SpinStatus,
    pub fulfilled: bool,
    pub combination: Option<u32>,
    pub reels: Option<Vec<u8>>,
    pub payout_tier: Option<PayoutTier>,
    pub payout_amount: Amount,
    pub shortfall: Amount,
    pub created_at: u64,
    pub settled_at: Option<u64>,
}

/// Lifecycle notifications broadcast by the slot machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SpinEvent {
    SpinInitiated {
        request_id: RequestId,
        player: PlayerId,
        reel_count: u8,
        bet_amount: Amount,
    },
    RandomnessRequested {
        request_id: RequestId,
        fee_payment: Amount,
    },
    SpinSettled {
        request_id: RequestId,
        player: PlayerId,
        combination: u32,
        tier: PayoutTier,
        payout_amount: Amount,
        shortfall: Amount,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reel_derivation() {
        assert_eq!(RandomWord::from(131_090).reels(3), vec![3, 3, 3]);
        assert_eq!(RandomWord::from(131_088).reels(3), vec![1, 3, 3]);
        assert_eq!(RandomWord::from(66_049).reels(3), vec![2, 1, 2]);
        assert_eq!(RandomWord::from(262_246).reels(3), vec![5, 5, 5]);
    }

    #[test]
    fn test_reels_use_high_bytes() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xff;
        let word = RandomWord::from_bytes(bytes);
        // reel 31 only sees the most significant byte
        assert_eq!(word.reel(31), (0xffu32 % 6) as u8 + 1);
        assert_eq!(word.reels(7).len(), 7);
        assert!(word.reels(7).iter().all(|&d| (1..=6).contains(&d)));
    }

    #[test]
    fn test_combination_from_word() {
        let combination = RandomWord::from(131_088).combination(3).unwrap();
        assert_eq!(combination.value(), 133);
        assert!(RandomWord::from(1).combination(8).is_err());
    }

    #[test]
    fn test_hex_round_trip() {
        let word = RandomWord::from(0xdead_beef);
        let parsed = RandomWord::from_hex(&word.to_string()).unwrap();
        assert_eq!(parsed, word);
        assert_eq!(RandomWord::from_hex("0x20012").unwrap(), RandomWord::from(131_090));
        let too_long = "f".repeat(65);
        for bad in ["0xzz", "", "0x", too_long.as_str()] {
            let err = RandomWord::from_hex(bad).unwrap_err();
            assert_eq!(err.kind(), crate::errors::ErrorKind::InvalidRandomWord, "{:?}", bad);
        }
    }

    #[test]
    fn test_record_status_and_result() {
        let mut record = SpinRecord {
            request_id: 9,
            player: "alice".to_string(),
            reel_count: 3,
            bet_amount: 100,
            fee_payment: 1,
            created_at: 10,
            fulfilled: false,
            random_word: None,
            combination: None,
            settlement: None,
        };
        assert_eq!(record.status(), SpinStatus::Pending);
        assert_eq!(record.result().payout_tier, None);

        record.fulfilled = true;
        record.combination = Some(Combination::decode(3, 333).unwrap());
        assert_eq!(record.status(), SpinStatus::Fulfilled);

        record.settlement = Some(SpinSettlement {
            tier: PayoutTier::BigWin,
            resolution: Resolution::FastPath,
            payout_amount: 1_000,
            shortfall: 0,
            settled_at: 11,
        });
        let result = record.result();
        assert_eq!(result.status, SpinStatus::Settled);
        assert_eq!(result.combination, Some(333));
        assert_eq!(result.reels, Some(vec![3, 3, 3]));
        assert_eq!(result.payout_amount, 1_000);
    }
}

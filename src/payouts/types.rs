//! Payout domain types: symbols, tiers and encoded reel combinations

use crate::errors::{InputError, SlotResult};
use crate::payouts::{MAX_REELS, MIN_REELS, SYMBOL_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reel symbol, encoded as digits 1..=6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Symbol {
    Dump = 1,
    Cope = 2,
    Pump = 3,
    Diamond = 4,
    Rocket = 5,
    Jackpot = 6,
}

impl Symbol {
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            1 => Some(Symbol::Dump),
            2 => Some(Symbol::Cope),
            3 => Some(Symbol::Pump),
            4 => Some(Symbol::Diamond),
            5 => Some(Symbol::Rocket),
            6 => Some(Symbol::Jackpot),
            _ => None,
        }
    }

    pub fn digit(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Symbol::Dump => "DUMP",
            Symbol::Cope => "COPE",
            Symbol::Pump => "PUMP",
            Symbol::Diamond => "DIAMOND",
            Symbol::Rocket => "ROCKET",
            Symbol::Jackpot => "JACKPOT",
        }
    }
}

/// Discrete outcome of a spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum PayoutTier {
    Lose = 0,
    SmallWin = 1,
    MediumWin = 2,
    BigWin = 3,
    MegaWin = 4,
    UltraWin = 5,
    SpecialCombo = 6,
    Jackpot = 7,
}

impl PayoutTier {
    pub const ALL: [PayoutTier; 8] = [
        PayoutTier::Lose,
        PayoutTier::SmallWin,
        PayoutTier::MediumWin,
        PayoutTier::BigWin,
        PayoutTier::MegaWin,
        PayoutTier::UltraWin,
        PayoutTier::SpecialCombo,
        PayoutTier::Jackpot,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            PayoutTier::Lose => "LOSE",
            PayoutTier::SmallWin => "SMALL_WIN",
            PayoutTier::MediumWin => "MEDIUM_WIN",
            PayoutTier::BigWin => "BIG_WIN",
            PayoutTier::MegaWin => "MEGA_WIN",
            PayoutTier::UltraWin => "ULTRA_WIN",
            PayoutTier::SpecialCombo => "SPECIAL_COMBO",
            PayoutTier::Jackpot => "JACKPOT",
        }
    }

    pub fn is_win(self) -> bool {
        self != PayoutTier::Lose
    }
}

impl fmt::Display for PayoutTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validate a reel count against the supported range
pub fn check_reel_count(reel_count: u8) -> SlotResult<()> {
    if (MIN_REELS..=MAX_REELS).contains(&reel_count) {
        Ok(())
    } else {
        Err(InputError::InvalidReelCount(reel_count).into())
    }
}

/// Reel symbols of one spin encoded as a base-10 number, first reel most significant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Combination {
    reel_count: u8,
    value: u32,
}

impl Combination {
    /// Decode and validate a numeric combination
    pub fn decode(reel_count: u8, value: u64) -> SlotResult<Self> {
        check_reel_count(reel_count)?;
        if value >= 10u64.pow(reel_count as u32) {
            return Err(InputError::InvalidCombinationLength { reel_count, value }.into());
        }

        let mut rest = value;
        for position in (0..reel_count as usize).rev() {
            let digit = rest % 10;
            if digit == 0 || digit > SYMBOL_COUNT as u64 {
                return Err(InputError::InvalidDigit { position, digit }.into());
            }
            rest /= 10;
        }

        Ok(Self {
            reel_count,
            value: value as u32,
        })
    }

    /// Encode reel symbols, first reel first
    pub fn from_reels(reels: &[u8]) -> SlotResult<Self> {
        let reel_count = u8::try_from(reels.len()).unwrap_or(u8::MAX);
        check_reel_count(reel_count)?;

        let mut value = 0u32;
        for (position, &digit) in reels.iter().enumerate() {
            if Symbol::from_digit(digit).is_none() {
                return Err(InputError::InvalidDigit {
                    position,
                    digit: digit as u64,
                }
                .into());
            }
            value = value * 10 + digit as u32;
        }

        Ok(Self { reel_count, value })
    }

    pub fn reel_count(&self) -> u8 {
        self.reel_count
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Reel digits, first reel first
    pub fn reels(&self) -> Vec<u8> {
        let mut reels = vec![0u8; self.reel_count as usize];
        let mut rest = self.value;
        for slot in reels.iter_mut().rev() {
            *slot = (rest % 10) as u8;
            rest /= 10;
        }
        reels
    }

    pub fn counts(&self) -> SymbolCounts {
        let mut counts = SymbolCounts::empty(self.reel_count);
        let mut rest = self.value;
        for _ in 0..self.reel_count {
            counts.add((rest % 10) as u8);
            rest /= 10;
        }
        counts
    }

    /// Smallest valid value for a reel count (all ones)
    pub fn min_value(reel_count: u8) -> u32 {
        (0..reel_count).fold(0u32, |acc, _| acc * 10 + 1)
    }

    /// Largest valid value for a reel count (all sixes)
    pub fn max_value(reel_count: u8) -> u32 {
        (0..reel_count).fold(0u32, |acc, _| acc * 10 + SYMBOL_COUNT as u32)
    }

    /// Every combination of `reel_count` reels in ascending numeric order
    pub fn all(reel_count: u8) -> impl Iterator<Item = Combination> {
        let total = (SYMBOL_COUNT as u32).pow(reel_count as u32);
        (0..total).map(move |index| {
            let mut rest = index;
            let mut value = 0u32;
            let mut place = 1u32;
            for _ in 0..reel_count {
                value += (rest % SYMBOL_COUNT as u32 + 1) * place;
                rest /= SYMBOL_COUNT as u32;
                place *= 10;
            }
            Combination { reel_count, value }
        })
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Frequency histogram over symbols 1..=6
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolCounts {
    counts: [u8; SYMBOL_COUNT as usize + 1],
    reel_count: u8,
}

impl SymbolCounts {
    fn empty(reel_count: u8) -> Self {
        Self {
            counts: [0; SYMBOL_COUNT as usize + 1],
            reel_count,
        }
    }

    fn add(&mut self, digit: u8) {
        self.counts[digit as usize] += 1;
    }

    pub fn reel_count(&self) -> u8 {
        self.reel_count
    }

    /// How many reels show `digit`
    pub fn count(&self, digit: u8) -> u8 {
        self.counts.get(digit as usize).copied().unwrap_or(0)
    }

    /// Highest count of any symbol
    pub fn max_count(&self) -> u8 {
        self.counts[1..].iter().copied().max().unwrap_or(0)
    }

    /// Symbols sharing the highest count, ascending
    pub fn modes(&self) -> impl Iterator<Item = u8> + '_ {
        let top = self.max_count();
        (1..=SYMBOL_COUNT).filter(move |&digit| top > 0 && self.counts[digit as usize] == top)
    }
}

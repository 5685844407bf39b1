//! Closed-form classification
//!
//! Resolves a combination from its symbol histogram alone. Histograms whose
//! outcome depends on how a tie between symbols is broken (or on the DUMP
//! rules) are deferred to the lookup tables; deferred combinations are
//! tentatively LOSE, which is the correct answer for most of them.

use crate::payouts::types::{PayoutTier, SymbolCounts};

/// Outcome of the closed-form rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastPath {
    Certain(PayoutTier),
    Deferred,
}

impl FastPath {
    /// The answer if no table were consulted
    pub fn tentative(self) -> PayoutTier {
        match self {
            FastPath::Certain(tier) => tier,
            FastPath::Deferred => PayoutTier::Lose,
        }
    }

    pub fn is_certain(self) -> bool {
        matches!(self, FastPath::Certain(_))
    }
}

/// Evaluate the closed-form rules, O(reel count)
pub fn evaluate(counts: &SymbolCounts) -> FastPath {
    let n = counts.reel_count();
    let top = counts.max_count();

    if top == n {
        return match counts.modes().next() {
            Some(6) => FastPath::Certain(PayoutTier::Jackpot),
            Some(5) => FastPath::Certain(PayoutTier::UltraWin),
            Some(4) => FastPath::Certain(PayoutTier::MegaWin),
            Some(3) => FastPath::Certain(PayoutTier::BigWin),
            Some(2) => FastPath::Certain(PayoutTier::MediumWin),
            _ => FastPath::Deferred,
        };
    }

    let rockets = counts.count(5);
    let diamonds = counts.count(4);
    if rockets == n - 1
        || counts.count(6) == n - 1
        || rockets == if n == 3 { 2 } else { 3 }
        || (rockets >= 1 && diamonds >= 1 && rockets + diamonds >= 3)
    {
        return FastPath::Certain(PayoutTier::SpecialCombo);
    }

    if top == 1 {
        return FastPath::Certain(PayoutTier::Lose);
    }

    let mut agreed = None;
    for symbol in counts.modes() {
        if symbol == 1 && top >= 3 {
            return FastPath::Deferred;
        }
        let tier = dominant_tier(symbol, top, n);
        match agreed {
            None => agreed = Some(tier),
            Some(previous) if previous == tier => {}
            Some(_) => return FastPath::Deferred,
        }
    }

    agreed.map_or(FastPath::Deferred, FastPath::Certain)
}

/// Tier paid when `symbol` is the most frequent symbol, `count` times
fn dominant_tier(symbol: u8, count: u8, reels: u8) -> PayoutTier {
    if count >= 3 {
        return match symbol {
            6 => PayoutTier::MegaWin,
            4 | 5 => PayoutTier::BigWin,
            _ => PayoutTier::MediumWin,
        };
    }
    if symbol >= 4 || (symbol == 3 && reels <= 4) {
        PayoutTier::SmallWin
    } else {
        PayoutTier::Lose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payouts::reference;
    use crate::payouts::types::Combination;

    fn fast(reel_count: u8, value: u64) -> FastPath {
        evaluate(&Combination::decode(reel_count, value).unwrap().counts())
    }

    #[test]
    fn test_uniform_reels() {
        assert_eq!(fast(3, 666), FastPath::Certain(PayoutTier::Jackpot));
        assert_eq!(fast(3, 333), FastPath::Certain(PayoutTier::BigWin));
        assert_eq!(fast(5, 22_222), FastPath::Certain(PayoutTier::MediumWin));
        assert_eq!(fast(3, 111), FastPath::Deferred);
    }

    #[test]
    fn test_special_combo() {
        assert_eq!(fast(3, 551), FastPath::Certain(PayoutTier::SpecialCombo));
        assert_eq!(fast(4, 6661), FastPath::Certain(PayoutTier::SpecialCombo));
        assert_eq!(fast(5, 54_412), FastPath::Certain(PayoutTier::SpecialCombo));
    }

    #[test]
    fn test_all_distinct_loses() {
        assert_eq!(fast(4, 1234), FastPath::Certain(PayoutTier::Lose));
        assert_eq!(fast(6, 123_456), FastPath::Certain(PayoutTier::Lose));
    }

    #[test]
    fn test_conflicting_ties_are_deferred() {
        // A DUMP pair ties a DIAMOND pair; the tie-break decides
        assert_eq!(fast(4, 1144), FastPath::Deferred);
        // Three DUMPs among seven reels
        assert_eq!(fast(7, 1_112_346), FastPath::Deferred);
    }

    #[test]
    fn test_agreeing_ties_are_certain() {
        assert_eq!(fast(5, 44_661), FastPath::Certain(PayoutTier::SmallWin));
        assert_eq!(fast(4, 1122), FastPath::Certain(PayoutTier::Lose));
    }

    #[test]
    fn test_special_predicate_matches_reference() {
        for reel_count in 3..=7 {
            for combination in Combination::all(reel_count) {
                let counts = combination.counts();
                if counts.max_count() == reel_count {
                    continue;
                }
                let fast_special = evaluate(&counts) == FastPath::Certain(PayoutTier::SpecialCombo);
                assert_eq!(
                    fast_special,
                    reference::is_special_combo(&counts),
                    "{} reels, {}",
                    reel_count,
                    combination
                );
            }
        }
    }
}

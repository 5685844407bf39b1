//! Reference payout rules
//!
//! This is the rule set the payout tables are generated from and the ground
//! truth every other classification path is checked against. It is evaluated
//! offline (table generation) and in tests, never on the settlement path.
//!
//! The rules are not symmetric across reel counts: three DUMPs lose while four
//! or more DUMPs pay a medium win.

use crate::payouts::types::{PayoutTier, SymbolCounts};

/// Rocket/jackpot heavy combinations that pay the special combo
pub fn is_special_combo(counts: &SymbolCounts) -> bool {
    let n = counts.reel_count();
    let rockets = counts.count(5);
    let diamonds = counts.count(4);

    counts.count(6) == n - 1
        || rockets == n - 1
        || (n == 3 && rockets == 2)
        || (n >= 4 && rockets == 3)
        || (diamonds >= 2 && rockets >= 1)
        || (rockets >= 2 && diamonds >= 1)
}

/// Classify a symbol histogram with the full rule set
pub fn classify(counts: &SymbolCounts) -> PayoutTier {
    let n = counts.reel_count();

    for (digit, tier) in [
        (6, PayoutTier::Jackpot),
        (5, PayoutTier::UltraWin),
        (4, PayoutTier::MegaWin),
        (3, PayoutTier::BigWin),
        (2, PayoutTier::MediumWin),
    ] {
        if counts.count(digit) == n {
            return tier;
        }
    }

    if is_special_combo(counts) {
        return PayoutTier::SpecialCombo;
    }

    // Ties go to the lowest symbol
    let top = counts.max_count();
    let symbol = counts.modes().next().unwrap_or(1);

    if top >= 3 {
        match symbol {
            6 => return PayoutTier::MegaWin,
            4 | 5 => return PayoutTier::BigWin,
            2 | 3 => return PayoutTier::MediumWin,
            _ => {}
        }
    }

    if n >= 4 && top >= 4 {
        return if symbol >= 4 {
            PayoutTier::MegaWin
        } else if symbol >= 3 {
            PayoutTier::BigWin
        } else {
            PayoutTier::MediumWin
        };
    }

    if top >= 2 && (symbol >= 4 || (symbol == 3 && n <= 4)) {
        return PayoutTier::SmallWin;
    }

    PayoutTier::Lose
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payouts::types::Combination;

    fn tier(reel_count: u8, value: u64) -> PayoutTier {
        classify(&Combination::decode(reel_count, value).unwrap().counts())
    }

    #[test]
    fn test_three_reel_fixtures() {
        assert_eq!(tier(3, 666), PayoutTier::Jackpot);
        assert_eq!(tier(3, 555), PayoutTier::UltraWin);
        assert_eq!(tier(3, 444), PayoutTier::MegaWin);
        assert_eq!(tier(3, 333), PayoutTier::BigWin);
        assert_eq!(tier(3, 222), PayoutTier::MediumWin);

        for value in [551, 515, 155, 552, 525, 255] {
            assert_eq!(tier(3, value), PayoutTier::SpecialCombo, "{}", value);
        }
        for value in [441, 414, 144, 442, 424, 244, 331, 313, 133, 332, 323, 233] {
            assert_eq!(tier(3, value), PayoutTier::SmallWin, "{}", value);
        }
        for value in [111, 123, 456, 146, 321] {
            assert_eq!(tier(3, value), PayoutTier::Lose, "{}", value);
        }
    }

    #[test]
    fn test_lowest_symbol_asymmetry() {
        // Kept as generated: three DUMPs lose, four or more pay
        assert_eq!(tier(3, 111), PayoutTier::Lose);
        assert_eq!(tier(4, 1111), PayoutTier::MediumWin);
        assert_eq!(tier(7, 1_111_111), PayoutTier::MediumWin);
    }

    #[test]
    fn test_distribution_per_reel_count() {
        let expected: [(u8, [usize; 8]); 3] = [
            (3, [151, 27, 1, 1, 1, 1, 33, 1]),
            (4, [674, 414, 42, 17, 1, 1, 146, 1]),
            (5, [4030, 1260, 577, 181, 251, 1, 1475, 1]),
        ];

        for (reel_count, distribution) in expected {
            let mut seen = [0usize; 8];
            for combination in Combination::all(reel_count) {
                seen[classify(&combination.counts()).ordinal() as usize] += 1;
            }
            assert_eq!(seen, distribution, "{} reels", reel_count);
        }
    }
}

//! Exhaustive agreement of the settlement classifier with the reference rules

use reelvault::payouts::{
    fast_path::{self, FastPath},
    reference, Combination, PayoutClassifier, PayoutTier, Resolution, MAX_REELS, MIN_REELS,
};
use reelvault::config::TableConfig;
use reelvault::payouts::PayoutTables;
use std::collections::BTreeMap;

fn classifier() -> &'static PayoutClassifier {
    PayoutClassifier::shared().unwrap()
}

#[test]
fn test_every_combination_matches_reference() {
    for reel_count in MIN_REELS..=MAX_REELS {
        let mut mismatches = Vec::new();
        for combination in Combination::all(reel_count) {
            let expected = reference::classify(&combination.counts());
            let actual = classifier().classify_combination(&combination).tier;
            if expected != actual {
                mismatches.push((combination.value(), expected, actual));
            }
        }
        assert!(
            mismatches.is_empty(),
            "{} reels: {} mismatches, first {:?}",
            reel_count,
            mismatches.len(),
            mismatches.first()
        );
    }
}

#[test]
fn test_paths_are_exclusive_and_exhaustive() {
    for reel_count in MIN_REELS..=MAX_REELS {
        let table = classifier().tables().table(reel_count).unwrap();
        let mut fast = 0usize;
        let mut deferred = 0usize;

        for combination in Combination::all(reel_count) {
            let classification = classifier().classify_combination(&combination);
            match fast_path::evaluate(&combination.counts()) {
                FastPath::Certain(tier) => {
                    fast += 1;
                    assert_eq!(classification.resolution, Resolution::FastPath);
                    assert_eq!(classification.tier, tier);
                    // certain combinations never occupy table space
                    assert_eq!(table.lookup(combination.value()), None);
                }
                FastPath::Deferred => {
                    deferred += 1;
                    assert!(matches!(classification.resolution, Resolution::Table { .. }));
                }
            }
        }

        let total = 6usize.pow(reel_count as u32);
        assert_eq!(fast + deferred, total);
        assert!(table.len() <= deferred);
    }
}

#[test]
fn test_numeric_entry_point_validates_input() {
    assert_eq!(classifier().classify(3, 333).unwrap(), PayoutTier::BigWin);
    assert_eq!(classifier().classify(3, 666).unwrap(), PayoutTier::Jackpot);
    assert_eq!(classifier().classify(3, 551).unwrap(), PayoutTier::SpecialCombo);
    assert_eq!(classifier().classify(4, 1234).unwrap(), PayoutTier::Lose);

    assert!(classifier().classify(2, 11).is_err());
    assert!(classifier().classify(8, 11_111_111).is_err());
    assert!(classifier().classify(3, 370).is_err());
    assert!(classifier().classify(3, 1234).is_err());
}

#[test]
fn test_coverage_report_matches_enumeration() {
    let (_, reports) = PayoutTables::generate_with_report(&TableConfig::default()).unwrap();

    for report in &reports {
        let mut tiers: BTreeMap<PayoutTier, usize> = BTreeMap::new();
        let mut certain = 0usize;
        let mut tentative_right = 0usize;

        for combination in Combination::all(report.reel_count) {
            let counts = combination.counts();
            let tier = reference::classify(&counts);
            let fast = fast_path::evaluate(&counts);
            *tiers.entry(tier).or_insert(0) += 1;
            if fast.is_certain() {
                certain += 1;
            }
            if fast.tentative() == tier {
                tentative_right += 1;
            }
        }

        assert_eq!(report.combinations, tiers.values().sum::<usize>());
        assert_eq!(report.certain, certain);
        assert_eq!(report.certain + report.deferred_lose, tentative_right);
        assert_eq!(report.stored, report.combinations - tentative_right);
        assert_eq!(report.shard_sizes.iter().sum::<usize>(), report.stored);
        assert!(tiers.contains_key(&PayoutTier::Jackpot));
    }
}

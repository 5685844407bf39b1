//! Payout classifier: fast path first, lookup table for the rest

use crate::config::TableConfig;
use crate::errors::{SlotResult, TableError};
use crate::payouts::fast_path::{self, FastPath};
use crate::payouts::table::PayoutTables;
use crate::payouts::types::{Combination, PayoutTier};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

static SHARED: OnceCell<PayoutClassifier> = OnceCell::new();

/// Which path produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    FastPath,
    Table { shard: usize },
}

/// A classified combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub tier: PayoutTier,
    pub resolution: Resolution,
}

/// Classifies reel combinations into payout tiers
#[derive(Debug, Clone)]
pub struct PayoutClassifier {
    tables: Arc<PayoutTables>,
}

impl PayoutClassifier {
    pub fn new(tables: PayoutTables) -> Self {
        Self {
            tables: Arc::new(tables),
        }
    }

    /// Load the configured artefact, or generate the tables in-process
    pub fn from_config(config: &TableConfig) -> SlotResult<Self> {
        let tables = match config.artefact_path {
            Some(ref path) => PayoutTables::load(path, config)?,
            None => {
                let tables = PayoutTables::generate(config)?;
                info!("Generated payout tables in-process");
                tables
            }
        };
        Ok(Self::new(tables))
    }

    /// Process-wide classifier over tables generated with default limits
    pub fn shared() -> Result<&'static PayoutClassifier, TableError> {
        SHARED.get_or_try_init(|| PayoutTables::generate(&TableConfig::default()).map(Self::new))
    }

    pub fn tables(&self) -> &PayoutTables {
        &self.tables
    }

    /// Classify a numeric combination for `reel_count` reels
    pub fn classify(&self, reel_count: u8, combination: u64) -> SlotResult<PayoutTier> {
        let combination = Combination::decode(reel_count, combination)?;
        Ok(self.classify_combination(&combination).tier)
    }

    /// Classify an already-validated combination
    pub fn classify_combination(&self, combination: &Combination) -> Classification {
        match fast_path::evaluate(&combination.counts()) {
            FastPath::Certain(tier) => Classification {
                tier,
                resolution: Resolution::FastPath,
            },
            FastPath::Deferred => {
                let table = self.tables.table(combination.reel_count());
                let shard = table.map_or(0, |t| t.shard_index(combination.value()));
                let tier = table
                    .and_then(|t| t.lookup(combination.value()))
                    .unwrap_or(PayoutTier::Lose);
                Classification {
                    tier,
                    resolution: Resolution::Table { shard },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{InputError, SlotError};
    use crate::payouts::reference;

    fn classifier() -> &'static PayoutClassifier {
        PayoutClassifier::shared().unwrap()
    }

    #[test]
    fn test_scenarios() {
        let c = classifier();
        assert_eq!(c.classify(3, 333).unwrap(), PayoutTier::BigWin);
        assert_eq!(c.classify(3, 666).unwrap(), PayoutTier::Jackpot);
        assert_eq!(c.classify(3, 551).unwrap(), PayoutTier::SpecialCombo);
        assert_eq!(c.classify(4, 1234).unwrap(), PayoutTier::Lose);
    }

    #[test]
    fn test_lowest_symbol_asymmetry_is_preserved() {
        let c = classifier();
        assert_eq!(c.classify(3, 111).unwrap(), PayoutTier::Lose);
        assert_eq!(c.classify(4, 1111).unwrap(), PayoutTier::MediumWin);

        let four = Combination::decode(4, 1111).unwrap();
        assert_eq!(
            c.classify_combination(&four).resolution,
            Resolution::Table { shard: 0 }
        );
    }

    #[test]
    fn test_input_errors() {
        let c = classifier();
        assert!(matches!(
            c.classify(8, 11_111_111),
            Err(SlotError::Input(InputError::InvalidReelCount(8)))
        ));
        assert!(matches!(
            c.classify(3, 371),
            Err(SlotError::Input(InputError::InvalidDigit { position: 1, digit: 7 }))
        ));
    }

    #[test]
    fn test_table_resolution_for_seven_reels() {
        let c = classifier();
        let combination = Combination::decode(7, 6_136_336).unwrap();
        let classification = c.classify_combination(&combination);
        assert_eq!(classification.resolution, Resolution::Table { shard: 7 });
        assert_eq!(
            classification.tier,
            reference::classify(&combination.counts())
        );
    }

    #[test]
    fn test_agrees_with_reference_for_small_reel_counts() {
        let c = classifier();
        for reel_count in 3..=5 {
            for combination in Combination::all(reel_count) {
                assert_eq!(
                    c.classify_combination(&combination).tier,
                    reference::classify(&combination.counts()),
                    "{} reels, {}",
                    reel_count,
                    combination
                );
            }
        }
    }
}

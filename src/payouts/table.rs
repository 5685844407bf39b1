//! Payout lookup tables
//!
//! Only combinations the fast path defers are stored, and of those only the
//! ones that do not lose: a key missing from the table means LOSE. Each reel
//! count owns one [`PayoutTable`] made of size-bounded [`LookupShard`]s. The
//! shard holding a key is found by a range partition whose start keys are
//! fixed when the table is generated.

use crate::config::TableConfig;
use crate::errors::{SlotResult, TableError};
use crate::payouts::fast_path::{self, FastPath};
use crate::payouts::reference;
use crate::payouts::types::{Combination, PayoutTier};
use crate::payouts::{MAX_REELS, MIN_REELS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// One immutable, size-bounded slice of a payout table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupShard {
    /// Smallest combination value routed to this shard
    start: u32,
    /// Sorted by combination value
    entries: Vec<(u32, PayoutTier)>,
}

impl LookupShard {
    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, value: u32) -> Option<PayoutTier> {
        self.entries
            .binary_search_by_key(&value, |(key, _)| *key)
            .ok()
            .map(|index| self.entries[index].1)
    }

    pub fn entries(&self) -> &[(u32, PayoutTier)] {
        &self.entries
    }
}

/// Stored exceptions for one reel count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutTable {
    reel_count: u8,
    shards: Vec<LookupShard>,
}

impl PayoutTable {
    /// Partition sorted entries into up to `shard_count` balanced range shards
    pub fn build(
        reel_count: u8,
        mut entries: Vec<(u32, PayoutTier)>,
        shard_count: usize,
        max_shard_entries: usize,
    ) -> Result<Self, TableError> {
        entries.sort_unstable_by_key(|(key, _)| *key);
        entries.dedup_by_key(|(key, _)| *key);

        let total = entries.len();
        let shard_count = shard_count.clamp(1, total.max(1));
        let mut shards = Vec::with_capacity(shard_count);
        let mut rest = entries.into_iter();

        for index in 0..shard_count {
            let size = (index + 1) * total / shard_count - index * total / shard_count;
            let chunk: Vec<(u32, PayoutTier)> = rest.by_ref().take(size).collect();
            let start = match (index, chunk.first()) {
                (0, _) | (_, None) => Combination::min_value(reel_count),
                (_, Some((key, _))) => *key,
            };
            shards.push(LookupShard { start, entries: chunk });
        }

        let table = Self { reel_count, shards };
        table.validate(shard_count, max_shard_entries)?;
        Ok(table)
    }

    pub fn reel_count(&self) -> u8 {
        self.reel_count
    }

    pub fn shards(&self) -> &[LookupShard] {
        &self.shards
    }

    /// Total stored entries across shards
    pub fn len(&self) -> usize {
        self.shards.iter().map(LookupShard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shard responsible for `value`
    pub fn shard_index(&self, value: u32) -> usize {
        self.shards
            .partition_point(|shard| shard.start <= value)
            .saturating_sub(1)
    }

    /// Stored tier for `value`, if any
    pub fn lookup(&self, value: u32) -> Option<PayoutTier> {
        self.shards
            .get(self.shard_index(value))
            .and_then(|shard| shard.get(value))
    }

    /// Check structure, size limits and agreement with the fast path
    pub fn validate(&self, expected_shards: usize, max_shard_entries: usize) -> Result<(), TableError> {
        let malformed = |reason: String| TableError::Malformed {
            reel_count: self.reel_count,
            reason,
        };

        if self.shards.is_empty() || self.shards.len() > expected_shards {
            return Err(malformed(format!(
                "{} shards, expected between 1 and {}",
                self.shards.len(),
                expected_shards
            )));
        }
        if self.shards[0].start != Combination::min_value(self.reel_count) {
            return Err(malformed("first shard does not start at the smallest combination".to_string()));
        }

        for (index, shard) in self.shards.iter().enumerate() {
            if shard.len() > max_shard_entries {
                return Err(TableError::TableTooLarge {
                    reel_count: self.reel_count,
                    shard: index,
                    entries: shard.len(),
                    max: max_shard_entries,
                });
            }

            let end = self.shards.get(index + 1).map(|next| next.start);
            if let Some(end) = end {
                if end <= shard.start {
                    return Err(malformed(format!("shard {} start keys are not increasing", index)));
                }
            }

            let mut previous = None;
            for &(key, tier) in &shard.entries {
                if previous.map_or(false, |p| key <= p) {
                    return Err(malformed(format!("shard {} keys are not strictly sorted", index)));
                }
                previous = Some(key);

                if key < shard.start || end.map_or(false, |end| key >= end) {
                    return Err(malformed(format!("key {} outside shard {} range", key, index)));
                }
                if tier == PayoutTier::Lose {
                    return Err(malformed(format!("key {} stores LOSE", key)));
                }

                let combination = Combination::decode(self.reel_count, key as u64)
                    .map_err(|e| malformed(format!("key {}: {}", key, e)))?;
                if fast_path::evaluate(&combination.counts()).is_certain() {
                    return Err(malformed(format!("key {} is resolved by the fast path", key)));
                }
            }
        }

        Ok(())
    }
}

/// Coverage figures for one reel count, produced during generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub reel_count: u8,
    pub combinations: usize,
    /// Resolved by the fast path alone
    pub certain: usize,
    /// Deferred and LOSE (not stored)
    pub deferred_lose: usize,
    /// Deferred and stored
    pub stored: usize,
    pub shard_sizes: Vec<usize>,
}

impl CoverageReport {
    /// Share of combinations whose tentative fast-path answer is already right
    pub fn tentative_accuracy(&self) -> f64 {
        (self.certain + self.deferred_lose) as f64 / self.combinations as f64
    }

    /// Share of combinations resolved without a table lookup
    pub fn certain_share(&self) -> f64 {
        self.certain as f64 / self.combinations as f64
    }
}

/// Payout tables for every supported reel count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutTables {
    tables: Vec<PayoutTable>,
}

impl PayoutTables {
    /// Generate every table from the reference rules
    pub fn generate(config: &TableConfig) -> Result<Self, TableError> {
        Self::generate_with_report(config).map(|(tables, _)| tables)
    }

    /// Generate every table and report fast-path coverage per reel count
    pub fn generate_with_report(config: &TableConfig) -> Result<(Self, Vec<CoverageReport>), TableError> {
        let mut tables = Vec::new();
        let mut reports = Vec::new();

        for reel_count in MIN_REELS..=MAX_REELS {
            let mut entries = Vec::new();
            let mut combinations = 0;
            let mut certain = 0;
            let mut deferred_lose = 0;

            for combination in Combination::all(reel_count) {
                combinations += 1;
                let counts = combination.counts();
                match fast_path::evaluate(&counts) {
                    FastPath::Certain(_) => certain += 1,
                    FastPath::Deferred => match reference::classify(&counts) {
                        PayoutTier::Lose => deferred_lose += 1,
                        tier => entries.push((combination.value(), tier)),
                    },
                }
            }

            let stored = entries.len();
            let table = PayoutTable::build(
                reel_count,
                entries,
                Self::shard_count(config, reel_count),
                config.max_shard_entries,
            )?;

            debug!(
                reel_count,
                combinations,
                certain,
                stored,
                shards = table.shards.len(),
                "Generated payout table"
            );

            reports.push(CoverageReport {
                reel_count,
                combinations,
                certain,
                deferred_lose,
                stored,
                shard_sizes: table.shards.iter().map(LookupShard::len).collect(),
            });
            tables.push(table);
        }

        Ok((Self { tables }, reports))
    }

    /// Number of shards a reel count is split into
    pub fn shard_count(config: &TableConfig, reel_count: u8) -> usize {
        if reel_count == MAX_REELS {
            config.seven_reel_chunks
        } else {
            1
        }
    }

    /// Table for a supported reel count
    pub fn table(&self, reel_count: u8) -> Option<&PayoutTable> {
        reel_count
            .checked_sub(MIN_REELS)
            .and_then(|index| self.tables.get(index as usize))
    }

    pub fn tables(&self) -> &[PayoutTable] {
        &self.tables
    }

    /// Validate every table against the configured limits
    pub fn validate(&self, config: &TableConfig) -> Result<(), TableError> {
        let expected = (MAX_REELS - MIN_REELS + 1) as usize;
        if self.tables.len() != expected {
            return Err(TableError::Artefact(format!(
                "{} tables, expected {}",
                self.tables.len(),
                expected
            )));
        }
        for (table, reel_count) in self.tables.iter().zip(MIN_REELS..=MAX_REELS) {
            if table.reel_count != reel_count {
                return Err(TableError::Artefact(format!(
                    "table for {} reels found where {} reels expected",
                    table.reel_count, reel_count
                )));
            }
            table.validate(Self::shard_count(config, reel_count), config.max_shard_entries)?;
        }
        Ok(())
    }

    /// Write the tables as a bincode artefact
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SlotResult<()> {
        let bytes = bincode::serialize(self).map_err(|e| TableError::Artefact(e.to_string()))?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| TableError::Artefact(e.to_string()))?;
        info!(path = %path.as_ref().display(), "Saved payout tables");
        Ok(())
    }

    /// Read and validate a bincode artefact
    pub fn load<P: AsRef<Path>>(path: P, config: &TableConfig) -> SlotResult<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| TableError::Artefact(e.to_string()))?;
        let tables: Self = bincode::deserialize(&bytes).map_err(|e| TableError::Artefact(e.to_string()))?;
        tables.validate(config)?;
        info!(path = %path.as_ref().display(), "Loaded payout tables");
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payouts::classifier::PayoutClassifier;

    fn shared_tables() -> &'static PayoutTables {
        PayoutClassifier::shared().unwrap().tables()
    }

    #[test]
    fn test_stored_entry_counts() {
        let sizes: Vec<usize> = shared_tables().tables().iter().map(PayoutTable::len).collect();
        assert_eq!(sizes, vec![0, 1, 26, 506, 7_071]);
    }

    #[test]
    fn test_seven_reels_use_eight_balanced_chunks() {
        let table = shared_tables().table(7).unwrap();
        assert_eq!(table.shards().len(), 8);

        let sizes: Vec<usize> = table.shards().iter().map(LookupShard::len).collect();
        assert_eq!(sizes, vec![883, 884, 884, 884, 884, 884, 884, 884]);

        let starts: Vec<u32> = table.shards().iter().map(LookupShard::start).collect();
        assert_eq!(
            starts,
            vec![1_111_111, 1_131_511, 1_311_134, 1_612_111, 2_466_262, 3_464_664, 4_433_432, 6_136_336]
        );
    }

    #[test]
    fn test_shard_index_is_a_range_partition() {
        let table = shared_tables().table(7).unwrap();
        assert_eq!(table.shard_index(1_111_111), 0);
        assert_eq!(table.shard_index(1_131_510), 0);
        assert_eq!(table.shard_index(1_131_511), 1);
        assert_eq!(table.shard_index(6_666_666), 7);

        for (index, shard) in table.shards().iter().enumerate() {
            for (key, _) in shard.entries() {
                assert_eq!(table.shard_index(*key), index);
            }
        }
    }

    #[test]
    fn test_single_table_would_exceed_shard_limit() {
        let table = shared_tables().table(7).unwrap();
        let entries: Vec<(u32, PayoutTier)> = table
            .shards()
            .iter()
            .flat_map(|shard| shard.entries().iter().copied())
            .collect();

        let err = PayoutTable::build(7, entries, 1, 2_048).unwrap_err();
        assert!(matches!(err, TableError::TableTooLarge { reel_count: 7, shard: 0, .. }));
    }

    #[test]
    fn test_validate_rejects_lose_entries() {
        let err = PayoutTable::build(4, vec![(1122, PayoutTier::Lose)], 1, 16).unwrap_err();
        assert!(matches!(err, TableError::Malformed { .. }));
    }

    #[test]
    fn test_validate_rejects_fast_path_keys() {
        let err = PayoutTable::build(3, vec![(333, PayoutTier::BigWin)], 1, 16).unwrap_err();
        assert!(matches!(err, TableError::Malformed { .. }));
    }

    #[test]
    fn test_coverage_report() {
        let (_, reports) = PayoutTables::generate_with_report(&TableConfig::default()).unwrap();
        let seven = &reports[4];
        assert_eq!(seven.combinations, 279_936);
        assert_eq!(seven.certain, 211_125);
        assert_eq!(seven.deferred_lose, 61_740);
        assert_eq!(seven.stored, 7_071);
        assert!(seven.tentative_accuracy() > 0.97);

        for report in &reports {
            assert_eq!(report.combinations, report.certain + report.deferred_lose + report.stored);
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payout_tables.bin");

        shared_tables().save(&path).unwrap();
        let loaded = PayoutTables::load(&path, &TableConfig::default()).unwrap();
        assert_eq!(&loaded, shared_tables());
    }

    #[test]
    fn test_load_enforces_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payout_tables.bin");
        shared_tables().save(&path).unwrap();

        let strict = TableConfig {
            max_shard_entries: 500,
            ..TableConfig::default()
        };
        assert!(PayoutTables::load(&path, &strict).is_err());
    }
}

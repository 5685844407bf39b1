//! Price Oracle Adapter
//!
//! Wraps the base-asset and fee-asset USD feeds. Every call reads the feed
//! again; a quote is only ever valid for the operation that requested it.

use crate::common::traits::{Clock, PriceFeed};
use crate::common::types::{AssetId, RawRound};
use crate::config::{OracleConfig, PriceBand};
use crate::errors::{OracleError, SlotResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Number of decimals in every USD price
pub const PRICE_DECIMALS: u32 = 8;

/// Validated USD price of one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub asset: AssetId,
    /// USD price with 8 decimals, always positive
    pub value: u128,
    pub updated_at: u64,
    pub round_id: u128,
}

/// Staleness and sanity-band checks over an external feed
pub struct PriceOracle {
    feed: Arc<dyn PriceFeed>,
    clock: Arc<dyn Clock>,
    config: OracleConfig,
}

impl PriceOracle {
    pub fn new(feed: Arc<dyn PriceFeed>, clock: Arc<dyn Clock>, config: OracleConfig) -> Self {
        Self { feed, clock, config }
    }

    /// Read and validate the latest price of `asset`
    pub fn quote(&self, asset: AssetId) -> SlotResult<PriceQuote> {
        let round = self.feed.latest_round(asset)?;
        let band = self.band(asset);

        if round.answer <= 0 {
            warn!(%asset, answer = %round.answer, "Feed reported a non-positive price");
            return Err(out_of_range(asset, round.answer, band).into());
        }

        let age_secs = self.clock.now_unix().saturating_sub(round.updated_at);
        if age_secs > self.config.max_staleness_secs {
            warn!(%asset, age_secs, max_secs = self.config.max_staleness_secs, "Stale price");
            return Err(OracleError::StalePrice {
                asset,
                age_secs,
                max_secs: self.config.max_staleness_secs,
            }
            .into());
        }

        let value = round.answer as u128;
        if !band.contains(value) {
            warn!(%asset, value = %value, "Price outside sanity band");
            return Err(out_of_range(asset, round.answer, band).into());
        }

        debug!(%asset, value = %value, age_secs, round_id = %round.round_id, "Price quote");

        Ok(PriceQuote {
            asset,
            value,
            updated_at: round.updated_at,
            round_id: round.round_id,
        })
    }

    pub fn band(&self, asset: AssetId) -> PriceBand {
        match asset {
            AssetId::Base => self.config.base_band,
            AssetId::Fee => self.config.fee_band,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

fn out_of_range(asset: AssetId, value: i128, band: PriceBand) -> OracleError {
    OracleError::PriceOutOfRange {
        asset,
        value,
        min: band.min_e8 as u128,
        max: band.max_e8 as u128,
    }
}

/// In-process feed whose rounds are set by the operator or a test
#[derive(Debug, Default)]
pub struct StaticPriceFeed {
    rounds: RwLock<HashMap<AssetId, RawRound>>,
}

impl StaticPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed with both assets priced in whole USD at `updated_at`
    pub fn with_prices(base_usd: u64, fee_usd: u64, updated_at: u64) -> Self {
        let rounds = [(AssetId::Base, base_usd), (AssetId::Fee, fee_usd)]
            .into_iter()
            .map(|(asset, usd)| {
                let round = RawRound {
                    answer: usd as i128 * 10i128.pow(PRICE_DECIMALS),
                    updated_at,
                    round_id: 1,
                };
                (asset, round)
            })
            .collect();
        Self {
            rounds: RwLock::new(rounds),
        }
    }

    /// Publish a new round with an 8-decimal answer
    pub fn set_price(&self, asset: AssetId, answer: i128, updated_at: u64) -> SlotResult<()> {
        let mut rounds = self.rounds.write().map_err(|_| OracleError::FeedUnavailable {
            asset,
            reason: "feed lock poisoned".to_string(),
        })?;
        let round_id = rounds.get(&asset).map_or(1, |r| r.round_id + 1);
        rounds.insert(
            asset,
            RawRound {
                answer,
                updated_at,
                round_id,
            },
        );
        Ok(())
    }
}

impl PriceFeed for StaticPriceFeed {
    fn latest_round(&self, asset: AssetId) -> SlotResult<RawRound> {
        let rounds = self.rounds.read().map_err(|_| OracleError::FeedUnavailable {
            asset,
            reason: "feed lock poisoned".to_string(),
        })?;
        rounds.get(&asset).copied().ok_or_else(|| {
            OracleError::FeedUnavailable {
                asset,
                reason: "no round published".to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::traits::ManualClock;
    use crate::errors::SlotError;

    const NOW: u64 = 1_700_000_000;

    fn oracle(feed: Arc<StaticPriceFeed>) -> (PriceOracle, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(NOW));
        (PriceOracle::new(feed, clock.clone(), OracleConfig::default()), clock)
    }

    #[test]
    fn test_fresh_quote() {
        let feed = Arc::new(StaticPriceFeed::with_prices(2_500, 15, NOW - 60));
        let (oracle, _) = oracle(feed);

        let quote = oracle.quote(AssetId::Base).unwrap();
        assert_eq!(quote.value, 250_000_000_000);
        assert_eq!(quote.round_id, 1);
        assert_eq!(oracle.quote(AssetId::Fee).unwrap().value, 1_500_000_000);
    }

    #[test]
    fn test_stale_quote() {
        let feed = Arc::new(StaticPriceFeed::with_prices(2_500, 15, NOW));
        let (oracle, clock) = oracle(feed);

        clock.advance(86_400);
        assert!(oracle.quote(AssetId::Base).is_ok());

        clock.advance(1);
        let err = oracle.quote(AssetId::Base).unwrap_err();
        assert!(matches!(
            err,
            SlotError::Oracle(OracleError::StalePrice { age_secs: 86_401, max_secs: 86_400, .. })
        ));
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh() {
        let feed = Arc::new(StaticPriceFeed::with_prices(2_500, 15, NOW + 30));
        let (oracle, _) = oracle(feed);
        assert!(oracle.quote(AssetId::Base).is_ok());
    }

    #[test]
    fn test_sanity_band() {
        let feed = Arc::new(StaticPriceFeed::with_prices(2_500, 15, NOW));
        let (oracle, _) = oracle(feed.clone());

        feed.set_price(AssetId::Base, 49 * 100_000_000, NOW).unwrap();
        assert!(matches!(
            oracle.quote(AssetId::Base),
            Err(SlotError::Oracle(OracleError::PriceOutOfRange { .. }))
        ));

        feed.set_price(AssetId::Fee, 1_001 * 100_000_000, NOW).unwrap();
        assert!(matches!(
            oracle.quote(AssetId::Fee),
            Err(SlotError::Oracle(OracleError::PriceOutOfRange { .. }))
        ));

        feed.set_price(AssetId::Fee, 0, NOW).unwrap();
        assert!(matches!(
            oracle.quote(AssetId::Fee),
            Err(SlotError::Oracle(OracleError::PriceOutOfRange { value: 0, .. }))
        ));
    }

    #[test]
    fn test_set_price_advances_round() {
        let feed = StaticPriceFeed::with_prices(2_500, 15, NOW);
        assert_eq!(feed.latest_round(AssetId::Fee).unwrap().round_id, 1);

        feed.set_price(AssetId::Fee, 16 * 100_000_000, NOW + 5).unwrap();
        let round = feed.latest_round(AssetId::Fee).unwrap();
        assert_eq!(round.round_id, 2);
        assert_eq!(round.answer, 16 * 100_000_000);
        assert_eq!(round.updated_at, NOW + 5);
    }

    #[test]
    fn test_set_price_reports_poisoned_feed() {
        let feed = Arc::new(StaticPriceFeed::with_prices(2_500, 15, NOW));
        let writer = feed.clone();
        let _ = std::thread::spawn(move || {
            let _rounds = writer.rounds.write().unwrap();
            panic!("writer died holding the feed lock");
        })
        .join();

        assert!(matches!(
            feed.set_price(AssetId::Base, 2_600 * 100_000_000, NOW),
            Err(SlotError::Oracle(OracleError::FeedUnavailable { asset: AssetId::Base, .. }))
        ));
    }

    #[test]
    fn test_missing_feed() {
        let (oracle, _) = oracle(Arc::new(StaticPriceFeed::new()));
        assert!(matches!(
            oracle.quote(AssetId::Base),
            Err(SlotError::Oracle(OracleError::FeedUnavailable { .. }))
        ));
    }
}

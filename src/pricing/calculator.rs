//! Pricing Calculator
//!
//! Converts the USD cost of a spin (base cost scaled by reel count, plus the
//! randomness fee) into settlement credits.

use crate::common::types::{Amount, AssetId, BPS_DENOMINATOR};
use crate::config::PricingConfig;
use crate::errors::{EconomicError, SlotResult};
use crate::payouts::{check_reel_count, MIN_REELS};
use crate::pricing::oracle::{PriceOracle, PriceQuote};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fee-asset and credit amounts use 18 decimals
const TOKEN_SCALE: u128 = 1_000_000_000_000_000_000;

/// 8-decimal USD price to cents
const PRICE_TO_CENTS: u128 = 1_000_000;

/// Price of one spin and how it was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinCost {
    pub reel_count: u8,
    pub reel_multiplier_bps: u32,
    pub base_cost_cents: u128,
    pub fee_cost_cents: u128,
    pub total_cents: u128,
    /// Credits debited from the player
    pub settlement_amount: Amount,
    /// Fee-asset amount forwarded to the randomness oracle
    pub fee_payment: Amount,
    pub base_quote: PriceQuote,
    pub fee_quote: PriceQuote,
}

pub struct PricingCalculator {
    oracle: PriceOracle,
    config: PricingConfig,
}

impl PricingCalculator {
    pub fn new(oracle: PriceOracle, config: PricingConfig) -> Self {
        Self { oracle, config }
    }

    pub fn oracle(&self) -> &PriceOracle {
        &self.oracle
    }

    /// Step multiplier for a reel count in basis points
    pub fn reel_multiplier_bps(&self, reel_count: u8) -> SlotResult<u32> {
        check_reel_count(reel_count)?;
        let index = (reel_count - MIN_REELS) as usize;
        self.config
            .reel_multiplier_bps
            .get(index)
            .copied()
            .ok_or_else(|| crate::errors::InputError::InvalidReelCount(reel_count).into())
    }

    /// Price a spin from fresh quotes; refuses to price with unusable data
    pub fn compute_spin_cost(&self, reel_count: u8) -> SlotResult<SpinCost> {
        check_reel_count(reel_count)?;
        let fee_quote = self.oracle.quote(AssetId::Fee)?;
        let base_quote = self.oracle.quote(AssetId::Base)?;
        self.price_with(reel_count, base_quote, fee_quote)
    }

    /// Read-only view of the spin price for display
    pub fn pricing_breakdown(&self, reel_count: u8) -> SlotResult<SpinCost> {
        self.compute_spin_cost(reel_count)
    }

    /// Price every reel count against one pair of quotes
    pub fn cost_schedule(&self) -> SlotResult<Vec<SpinCost>> {
        let fee_quote = self.oracle.quote(AssetId::Fee)?;
        let base_quote = self.oracle.quote(AssetId::Base)?;
        (MIN_REELS..=crate::payouts::MAX_REELS)
            .map(|reel_count| self.price_with(reel_count, base_quote, fee_quote))
            .collect()
    }

    /// Deterministic pricing given both quotes
    pub fn price_with(
        &self,
        reel_count: u8,
        base_quote: PriceQuote,
        fee_quote: PriceQuote,
    ) -> SlotResult<SpinCost> {
        let reel_multiplier_bps = self.reel_multiplier_bps(reel_count)?;

        let base_cost_cents =
            self.config.base_cost_cents as u128 * reel_multiplier_bps as u128 / BPS_DENOMINATOR;

        let fee_payment = self.config.fee_amount as u128;
        let fee_cost_cents = fee_payment
            .checked_mul(fee_quote.value)
            .ok_or(EconomicError::Overflow("fee conversion"))?
            / (TOKEN_SCALE * PRICE_TO_CENTS);

        let total_cents = base_cost_cents + fee_cost_cents;
        let settlement_amount = self.cents_to_credits(total_cents, base_quote.value)?;

        debug!(
            reel_count,
            base_cost_cents = %base_cost_cents,
            fee_cost_cents = %fee_cost_cents,
            settlement_amount = %settlement_amount,
            "Priced spin"
        );

        Ok(SpinCost {
            reel_count,
            reel_multiplier_bps,
            base_cost_cents,
            fee_cost_cents,
            total_cents,
            settlement_amount,
            fee_payment,
            base_quote,
            fee_quote,
        })
    }

    /// USD cents to credits through the base-asset price and the fixed mint rate
    fn cents_to_credits(&self, cents: u128, base_price: u128) -> SlotResult<Amount> {
        let numerator = cents
            .checked_mul(self.config.credits_per_base_asset as u128)
            .and_then(|v| v.checked_mul(TOKEN_SCALE))
            .and_then(|v| v.checked_mul(PRICE_TO_CENTS))
            .ok_or(EconomicError::Overflow("credit conversion"))?;
        Ok(numerator / base_price)
    }

    /// Credits minted for a base-asset deposit (18 decimals)
    pub fn credits_for_base_deposit(&self, base_amount: Amount) -> SlotResult<Amount> {
        base_amount
            .checked_mul(self.config.credits_per_base_asset as u128)
            .ok_or_else(|| EconomicError::Overflow("base deposit").into())
    }
}

//! Spin pricing
//!
//! [`oracle`] validates external USD quotes; [`calculator`] turns them into
//! the credit cost of a spin.

pub mod calculator;
pub mod oracle;

pub use calculator::{PricingCalculator, SpinCost};
pub use oracle::{PriceOracle, PriceQuote, StaticPriceFeed, PRICE_DECIMALS};

//! Prometheus metrics for the slot machine

use crate::common::types::{Amount, CREDIT_UNIT};
use crate::errors::{ConfigurationError, ErrorKind, SlotResult};
use crate::payouts::{PayoutTier, Resolution};
use prometheus::{
    Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct SlotMetrics {
    registry: Registry,
    spins_total: IntCounter,
    spins_rejected: IntCounterVec,
    fulfillments_total: IntCounter,
    callbacks_rejected: IntCounterVec,
    payouts_total: IntCounterVec,
    classifications: IntCounterVec,
    pending_requests: IntGauge,
    prize_pool: Gauge,
    house_bankroll: Gauge,
}

fn metrics_error(e: prometheus::Error) -> ConfigurationError {
    ConfigurationError::ValidationFailed(format!("metrics registry: {}", e))
}

impl SlotMetrics {
    pub fn new() -> SlotResult<Self> {
        let registry = Registry::new_custom(Some("reelvault".to_string()), None).map_err(metrics_error)?;

        let spins_total = IntCounter::new("spins_total", "Spins accepted").map_err(metrics_error)?;
        let spins_rejected = IntCounterVec::new(
            Opts::new("spins_rejected_total", "Spin requests refused, by error kind"),
            &["kind"],
        )
        .map_err(metrics_error)?;
        let fulfillments_total =
            IntCounter::new("fulfillments_total", "Randomness callbacks settled").map_err(metrics_error)?;
        let callbacks_rejected = IntCounterVec::new(
            Opts::new("callbacks_rejected_total", "Randomness callbacks refused, by error kind"),
            &["kind"],
        )
        .map_err(metrics_error)?;
        let payouts_total = IntCounterVec::new(
            Opts::new("payouts_total", "Settled spins by payout tier"),
            &["tier"],
        )
        .map_err(metrics_error)?;
        let classifications = IntCounterVec::new(
            Opts::new("classifications_total", "Classifications by resolution path"),
            &["path"],
        )
        .map_err(metrics_error)?;
        let pending_requests =
            IntGauge::new("pending_requests", "Spins waiting for randomness").map_err(metrics_error)?;
        let prize_pool = Gauge::new("prize_pool_credits", "Prize pool balance in credits").map_err(metrics_error)?;
        let house_bankroll =
            Gauge::new("house_bankroll_credits", "House bankroll in credits").map_err(metrics_error)?;

        registry.register(Box::new(spins_total.clone())).map_err(metrics_error)?;
        registry.register(Box::new(spins_rejected.clone())).map_err(metrics_error)?;
        registry.register(Box::new(fulfillments_total.clone())).map_err(metrics_error)?;
        registry.register(Box::new(callbacks_rejected.clone())).map_err(metrics_error)?;
        registry.register(Box::new(payouts_total.clone())).map_err(metrics_error)?;
        registry.register(Box::new(classifications.clone())).map_err(metrics_error)?;
        registry.register(Box::new(pending_requests.clone())).map_err(metrics_error)?;
        registry.register(Box::new(prize_pool.clone())).map_err(metrics_error)?;
        registry.register(Box::new(house_bankroll.clone())).map_err(metrics_error)?;

        Ok(Self {
            registry,
            spins_total,
            spins_rejected,
            fulfillments_total,
            callbacks_rejected,
            payouts_total,
            classifications,
            pending_requests,
            prize_pool,
            house_bankroll,
        })
    }

    pub fn record_spin(&self) {
        self.spins_total.inc();
    }

    pub fn record_spin_rejected(&self, kind: ErrorKind) {
        self.spins_rejected.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn record_settlement(&self, tier: PayoutTier, resolution: Resolution) {
        self.fulfillments_total.inc();
        self.payouts_total.with_label_values(&[tier.name()]).inc();
        let path = match resolution {
            Resolution::FastPath => "fast_path",
            Resolution::Table { .. } => "table",
        };
        self.classifications.with_label_values(&[path]).inc();
    }

    pub fn record_callback_rejected(&self, kind: ErrorKind) {
        self.callbacks_rejected.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn set_pending(&self, pending: usize) {
        self.pending_requests.set(pending as i64);
    }

    pub fn set_balances(&self, prize_pool: Amount, house: Amount) {
        self.prize_pool.set(to_credits(prize_pool));
        self.house_bankroll.set(to_credits(house));
    }

    /// Text exposition format
    pub fn render(&self) -> SlotResult<String> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .map_err(|e| metrics_error(e).into())
    }
}

fn to_credits(amount: Amount) -> f64 {
    amount as f64 / CREDIT_UNIT as f64
}

//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))

        // Pricing
        .route("/pricing", get(pricing_schedule_handler))
        .route("/pricing/:reels", get(pricing_handler))

        // Spins
        .route("/spins", post(spin_handler))
        .route("/spins/:id", get(spin_result_handler))

        // Oracle callbacks and price rounds
        .route("/oracle/fulfill", post(fulfill_handler))
        .route("/oracle/prices", post(price_update_handler))

        // Player accounts
        .route("/players/:id", get(player_handler))
        .route("/players/:id/deposit", post(deposit_handler))
        .route("/players/:id/withdraw", post(withdraw_handler))
        .route("/players/:id/buy_credits", post(buy_credits_handler))

        // House-side funding
        .route("/prize_pool/fund", post(fund_prize_pool_handler))
        .route("/house/fund", post(fund_house_handler))

        .route("/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))

        .with_state(state)
}

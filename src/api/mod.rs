//! Slot machine HTTP API
//!
//! Player-facing spin and account endpoints, the inbound randomness callback,
//! and read-only pricing, statistics and metrics.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::{create_app, ApiServer};

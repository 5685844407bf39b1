//! Randomness request correlation
//!
//! A spin is submitted with an oracle-issued request id and settled when the
//! oracle calls back with a random word for that id, exactly once.

pub mod correlator;
pub mod oracle;
pub mod types;
pub mod vrf_engine;
pub mod waiters;

pub use correlator::RequestCorrelator;
pub use oracle::{ChannelRandomnessOracle, LocalRandomnessOracle};
pub use types::{RandomWord, SpinEvent, SpinRecord, SpinResult, SpinSettlement, SpinStatus};
pub use vrf_engine::{VrfBundle, VrfEngine, VrfFulfiller};
pub use waiters::{ResultSubscription, ResultWaiters};

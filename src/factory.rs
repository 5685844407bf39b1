//! Factory for wiring a running slot machine
//!
//! Centralizes the initialization shared by the server binary and the
//! simulator: storage backend, restored state, the randomness channel and
//! the VRF fulfiller task.

use crate::{
    common::traits::PriceFeed,
    config::{SlotConfig, StorageBackend},
    errors::SlotResult,
    machine::SlotMachine,
    spins::{ChannelRandomnessOracle, VrfEngine, VrfFulfiller},
    storage::{KvStore, MemoryStorage, OptimizedStorage},
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Handle to a machine and the background task feeding it randomness
pub struct SlotHandle {
    machine: Arc<SlotMachine>,
    fulfiller: Option<JoinHandle<()>>,
    backend: StorageBackend,
    vrf_public_key: String,
}

impl SlotHandle {
    pub fn machine(&self) -> &Arc<SlotMachine> {
        &self.machine
    }

    pub fn backend(&self) -> StorageBackend {
        self.backend
    }

    /// Hex-encoded key that verifies every delivered word
    pub fn vrf_public_key(&self) -> &str {
        &self.vrf_public_key
    }

    /// Stop the fulfiller; pending spins resume on the next start
    pub fn shutdown(&mut self) {
        if let Some(task) = self.fulfiller.take() {
            task.abort();
            info!("VRF fulfiller shut down");
        }
    }
}

impl Drop for SlotHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Factory for slot machines with different configurations
pub struct SlotMachineFactory;

impl SlotMachineFactory {
    /// Create a fully wired machine. Must be called inside a tokio runtime.
    pub async fn create(config: SlotConfig, price_feed: Arc<dyn PriceFeed>) -> SlotResult<SlotHandle> {
        config.validate()?;

        let store = Self::create_storage(&config)?;
        let first_id = crate::spin_store::load_state(store.as_ref())?
            .max_request_id()
            .map_or(1, |id| id + 1);

        let (oracle, requests) =
            ChannelRandomnessOracle::new(first_id, config.randomness.channel_capacity);
        let oracle = Arc::new(oracle);

        let machine = Arc::new(
            SlotMachine::builder(config.clone(), price_feed, oracle.clone())
                .store(store)
                .build()?,
        );

        let engine = VrfEngine::new_random();
        let vrf_public_key = engine.public_key_hex();
        let fulfiller = VrfFulfiller::new(engine, machine.clone(), config.fulfillment_delay());
        let task = tokio::spawn(fulfiller.run(requests));

        let pending = machine.pending_requests();
        if !pending.is_empty() {
            info!(count = pending.len(), "Redelivering pending randomness requests");
        }
        for request in pending {
            oracle.redeliver(request).await?;
        }

        info!(
            backend = ?config.storage.backend,
            next_request_id = first_id,
            "Slot machine ready"
        );

        Ok(SlotHandle {
            machine,
            fulfiller: Some(task),
            backend: config.storage.backend,
            vrf_public_key,
        })
    }

    fn create_storage(config: &SlotConfig) -> SlotResult<Arc<dyn KvStore>> {
        Ok(match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
            StorageBackend::Rocksdb => Arc::new(OptimizedStorage::new(&config.storage.data_dir)?),
        })
    }

    /// In-memory machine for unit testing and simulation
    pub async fn create_testing(price_feed: Arc<dyn PriceFeed>) -> SlotResult<SlotHandle> {
        Self::create(SlotConfig::testing(), price_feed).await
    }

    /// Machine for production deployment with persistence
    pub async fn create_production(price_feed: Arc<dyn PriceFeed>) -> SlotResult<SlotHandle> {
        Self::create(SlotConfig::production(), price_feed).await
    }
}

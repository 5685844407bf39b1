//! Randomness oracle clients
//!
//! Both implementations allocate request ids locally. The channel client
//! forwards each request over an mpsc queue to whatever task plays the
//! oracle's role; the local client only records requests for tests.

use crate::common::traits::RandomnessOracle;
use crate::common::types::{Amount, RandomnessRequest, RequestId};
use crate::errors::{ProtocolError, SlotResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// In-process oracle with sequential ids
#[derive(Debug)]
pub struct LocalRandomnessOracle {
    next_id: AtomicU64,
    requests: Mutex<Vec<RandomnessRequest>>,
}

impl LocalRandomnessOracle {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first_id: RequestId) -> Self {
        Self {
            next_id: AtomicU64::new(first_id),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Force the next issued id, e.g. to replay an id already in use
    pub fn set_next_id(&self, id: RequestId) {
        self.next_id.store(id, Ordering::SeqCst);
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RandomnessRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Default for LocalRandomnessOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomnessOracle for LocalRandomnessOracle {
    fn request_randomness(&self, payment: Amount, num_words: u32) -> SlotResult<RequestId> {
        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut requests = self
            .requests
            .lock()
            .map_err(|_| ProtocolError::RandomnessUnavailable("request log poisoned".to_string()))?;
        requests.push(RandomnessRequest {
            request_id,
            payment,
            num_words,
        });
        Ok(request_id)
    }
}

/// Oracle client that hands requests to a fulfiller task over a bounded channel
#[derive(Debug)]
pub struct ChannelRandomnessOracle {
    next_id: AtomicU64,
    sender: mpsc::Sender<RandomnessRequest>,
}

impl ChannelRandomnessOracle {
    /// Create the client and the receiving end for the fulfiller
    pub fn new(first_id: RequestId, capacity: usize) -> (Self, mpsc::Receiver<RandomnessRequest>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                next_id: AtomicU64::new(first_id),
                sender,
            },
            receiver,
        )
    }

    /// Hand a request restored from storage back to the fulfiller
    ///
    /// Waits for queue capacity instead of failing, since the request id was
    /// already issued by a previous run.
    pub async fn redeliver(&self, request: RandomnessRequest) -> SlotResult<()> {
        let request_id = request.request_id;
        self.sender.send(request).await.map_err(|_| {
            ProtocolError::RandomnessUnavailable("oracle fulfiller has stopped".to_string())
        })?;
        debug!(request_id, "Redelivered randomness request");
        Ok(())
    }
}

impl RandomnessOracle for ChannelRandomnessOracle {
    fn request_randomness(&self, payment: Amount, num_words: u32) -> SlotResult<RequestId> {
        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = RandomnessRequest {
            request_id,
            payment,
            num_words,
        };

        match self.sender.try_send(request) {
            Ok(()) => {
                debug!(request_id, "Queued randomness request");
                Ok(request_id)
            }
            Err(TrySendError::Full(_)) => Err(ProtocolError::RandomnessUnavailable(
                "request queue is full".to_string(),
            )
            .into()),
            Err(TrySendError::Closed(_)) => Err(ProtocolError::RandomnessUnavailable(
                "oracle fulfiller has stopped".to_string(),
            )
            .into()),
        }
    }
}

use crate::common::types::RequestId;
use crate::spins::types::SpinResult;
use dashmap::DashMap;
use std::{sync::Arc, time::Duration};
use tokio::sync::oneshot;

/// Callers waiting for a spin to settle, keyed by request id
#[derive(Clone)]
pub struct ResultWaiters {
    /// request_id -> oneshot senders, one per waiting caller
    waiting: Arc<DashMap<RequestId, Vec<oneshot::Sender<SpinResult>>>>,
}

impl ResultWaiters {
    pub fn new() -> Self {
        Self {
            waiting: Arc::new(DashMap::new()),
        }
    }

    /// Register interest in a request and get the receiving end
    pub fn register(&self, request_id: RequestId) -> oneshot::Receiver<SpinResult> {
        let (sender, receiver) = oneshot::channel();
        self.waiting.entry(request_id).or_default().push(sender);
        receiver
    }

    /// Register interest and get a guard that deregisters when dropped
    ///
    /// The guard owns the receiver, so a caller that stops waiting for any
    /// reason (timeout, cancelled task, disconnected client) leaves no sender
    /// behind for a spin that may never settle.
    pub fn subscribe(&self, request_id: RequestId) -> ResultSubscription<'_> {
        ResultSubscription {
            waiters: self,
            request_id,
            receiver: Some(self.register(request_id)),
        }
    }

    /// Deliver a settled result to everyone waiting; returns how many were notified
    pub fn complete(&self, request_id: RequestId, result: &SpinResult) -> usize {
        match self.waiting.remove(&request_id) {
            Some((_, senders)) => senders
                .into_iter()
                // send fails if the receiver already timed out
                .filter_map(|sender| sender.send(result.clone()).ok())
                .count(),
            None => 0,
        }
    }

    /// Drop waiters whose receivers are gone
    pub fn prune(&self, request_id: RequestId) {
        let now_empty = match self.waiting.get_mut(&request_id) {
            Some(mut senders) => {
                senders.retain(|sender| !sender.is_closed());
                senders.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.waiting.remove(&request_id);
        }
    }

    /// Number of request ids with at least one waiter
    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_waiting(&self, request_id: RequestId) -> bool {
        self.waiting.contains_key(&request_id)
    }
}

impl Default for ResultWaiters {
    fn default() -> Self {
        Self::new()
    }
}

/// One caller's registration in [`ResultWaiters`]
pub struct ResultSubscription<'a> {
    waiters: &'a ResultWaiters,
    request_id: RequestId,
    receiver: Option<oneshot::Receiver<SpinResult>>,
}

impl ResultSubscription<'_> {
    /// Wait up to `timeout` for the settled result
    pub async fn recv(&mut self, timeout: Duration) -> Option<SpinResult> {
        let receiver = self.receiver.as_mut()?;
        let outcome = tokio::time::timeout(timeout, receiver).await;
        match outcome {
            Ok(Ok(result)) => {
                self.receiver = None;
                Some(result)
            }
            _ => None,
        }
    }
}

impl Drop for ResultSubscription<'_> {
    fn drop(&mut self) {
        // close the receiver first so prune sees this sender as dead
        self.receiver.take();
        self.waiters.prune(self.request_id);
    }
}

//! Headless sample bus between transports and the store thread.
//!
//! Uses [`tokio::sync::broadcast`] so that every subscriber receives every
//! sample without any single subscriber blocking the others.  Producers may
//! live on any task; the stores stay on the thread that runs [`pump`].
//!
//! Broadcast drops the oldest samples for a receiver that falls a full
//! channel behind.  Producers that can outrun the pump (file replay on the
//! same thread) go through [`SampleBus::publish_paced`], which waits for the
//! backlog to drain before continuing.

use roboapp_types::{DashError, Sample};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::router::Router;

/// Default channel capacity (number of buffered samples before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Shared sample bus.  Clone it cheaply – all clones share the same
/// underlying broadcast channel.
#[derive(Clone, Debug)]
pub struct SampleBus {
    sender: broadcast::Sender<Sample>,
    capacity: usize,
}

impl SampleBus {
    /// Create a new bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Publish a sample.
    ///
    /// Returns the number of receivers that were handed the sample, or a
    /// [`DashError::Channel`] error when nobody is listening.
    pub fn publish(&self, sample: Sample) -> Result<usize, DashError> {
        self.sender
            .send(sample)
            .map_err(|e| DashError::Channel(format!("no subscribers for `{}`", e.0.key)))
    }

    /// Publish a sample, then yield until the slowest receiver is less than
    /// half a channel behind.
    ///
    /// Nothing is dropped as long as every receiver keeps being polled.  A
    /// receiver that is never polled stalls the caller.
    pub async fn publish_paced(&self, sample: Sample) -> Result<usize, DashError> {
        let receivers = self.publish(sample)?;
        let high_water = (self.capacity / 2).max(1);
        while self.sender.len() >= high_water && self.sender.receiver_count() > 0 {
            tokio::task::yield_now().await;
        }
        Ok(receivers)
    }

    /// Subscribe to every sample.
    pub fn subscribe(&self) -> broadcast::Receiver<Sample> {
        self.sender.subscribe()
    }

    /// Subscribe and return a [`SampleSubscriber`] filtered to keys that
    /// start with `prefix`.  An empty prefix matches everything.
    pub fn subscribe_prefix(&self, prefix: impl Into<String>) -> SampleSubscriber {
        SampleSubscriber {
            prefix: prefix.into(),
            receiver: self.sender.subscribe(),
            lagged: 0,
        }
    }
}

impl Default for SampleBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A subscriber that only delivers samples whose key starts with the given
/// prefix.
pub struct SampleSubscriber {
    prefix: String,
    receiver: broadcast::Receiver<Sample>,
    lagged: u64,
}

impl SampleSubscriber {
    /// Wait for the next sample that matches this subscriber's prefix.
    ///
    /// Returns `None` when the bus is closed and no further samples will
    /// arrive.
    pub async fn recv(&mut self) -> Option<Sample> {
        loop {
            match self.receiver.recv().await {
                Ok(sample) if sample.key.starts_with(&self.prefix) => return Some(sample),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(prefix = %self.prefix, lagged_by = n, "SampleSubscriber lagged");
                    self.lagged += n;
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Total number of samples dropped because this subscriber fell behind.
    pub fn lagged(&self) -> u64 {
        self.lagged
    }
}

/// Counters reported by [`pump`] once the bus closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub routed: u64,
    pub rejected: u64,
    pub lagged: u64,
}

/// Drain `subscriber` into `router` until the bus closes.
///
/// Rejected samples are logged and skipped; they never reach a store.
pub async fn pump(mut subscriber: SampleSubscriber, router: &Router) -> PumpStats {
    let mut stats = PumpStats::default();
    while let Some(sample) = subscriber.recv().await {
        match router.dispatch_sample(&sample) {
            Ok(signal) => {
                stats.routed += 1;
                debug!(id = %sample.id, %signal, "sample applied");
            }
            Err(e) => {
                stats.rejected += 1;
                warn!(id = %sample.id, key = %sample.key, error = %e, "sample rejected");
            }
        }
    }
    stats.lagged = subscriber.lagged();
    stats
}

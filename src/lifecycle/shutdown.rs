//! Shutdown coordination for the gateway.
//!
//! # Responsibilities
//! - Fan a single shutdown request out to every long-running task
//! - Let tasks subscribe before the signal fires
//!
//! # Design Decisions
//! - Built on a `tokio::sync::broadcast` channel; subscribers own their receivers
//! - Triggering never blocks and never fails, even with no subscribers left
//! - Any `recv` result means "stop": a lagged receiver after repeated triggers
//!   is still a shutdown

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
/// The signal listener holds the coordinator and calls [`Shutdown::trigger`];
/// the HTTP server awaits its receiver and drains in-flight requests.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a coordinator with no subscribers.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Register a task. Only triggers sent after this call are observed.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal; a no-op when nobody is subscribed.
    ///
    /// Safe to call more than once.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

//! Shutdown coordination.

use tokio::sync::broadcast;

/// In-process shutdown trigger.
///
/// The server stops on the first of: this trigger, Ctrl+C, or SIGTERM.
/// Dropping the coordinator also releases subscribers, so keep it alive
/// for as long as the server should run.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to hand to a long-running task.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscriber to stop. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

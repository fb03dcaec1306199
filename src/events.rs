use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Domain events published by commands, plus the persistence signal the
/// sync layer subscribes to. `LocalStore` emits `TableSaved` after every
/// successful write without knowing whether a remote mirror exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    RequisitionCreated(String),
    RequisitionCompleted(String),
    RequisitionDeleted(String),
    TableSaved,
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Builds an event channel with the sender already wrapped.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Consumes and discards events. Used when no sync engine is configured so
/// that senders never block on a full channel.
pub async fn drain(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        debug!(?event, "event discarded (no subscriber configured)");
    }
}

//! Change notifications for persisted records.
//!
//! Writers publish a [`StorageEvent`] naming the key they changed; subscribers
//! re-read that key from storage. Events never carry the data itself, so a
//! subscriber always converges on what is actually stored.

use tokio::sync::broadcast;

/// Buffered events per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// A notification that the document under `key` was written or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// The storage key that changed
    pub key: String,
}

impl StorageEvent {
    /// Creates an event for `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// A publish/subscribe channel for [`StorageEvent`]s.
///
/// Implementations decide how far notifications travel (one process, several
/// processes sharing a database, ...). Store logic only depends on this trait.
pub trait ChangeChannel: Send + Sync + std::fmt::Debug {
    /// Notifies every current subscriber. Publishing with no subscribers is not an error.
    fn publish(&self, event: StorageEvent);

    /// Starts receiving events published after this call.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// In-process channel built on `tokio::sync::broadcast`.
#[derive(Debug, Clone)]
pub struct BroadcastChannel {
    sender: broadcast::Sender<StorageEvent>,
}

impl BroadcastChannel {
    /// Creates a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeChannel for BroadcastChannel {
    fn publish(&self, event: StorageEvent) {
        // Err only means nobody is listening right now.
        if let Ok(receivers) = self.sender.send(event) {
            tracing::trace!("Change event delivered to {receivers} subscriber(s)");
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }
}

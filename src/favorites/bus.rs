//! Change notifications between favorites stores.
//!
//! Storage is the single source of truth; an event only tells other stores
//! to re-read it.

use tokio::sync::broadcast;

/// Buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// Emitted after a store persisted a new favorites set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoritesEvent {
    /// Instance ID of the store that made the change.
    pub origin: u64,
}

/// Fan-out channel shared by every store created from one hub.
#[derive(Debug, Clone)]
pub struct FavoritesBus {
    sender: broadcast::Sender<FavoritesEvent>,
}

impl FavoritesBus {
    /// When the buffer fills up the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: FavoritesEvent) {
        // Zero receivers is not an error.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FavoritesEvent> {
        self.sender.subscribe()
    }
}

impl Default for FavoritesBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

//! Token broadcast.
//!
//! Every resolved token is announced as a [`PlatformTokenEvent`] to any
//! number of listeners. iOS tokens are announced when registration resolves;
//! Android tokens when the `registered` event comes through the dispatcher.

use herald_protocol::PlatformTokenEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Default broadcast capacity.
const DEFAULT_CAPACITY: usize = 16;

/// Multi-consumer broadcast of token events.
#[derive(Debug, Clone)]
pub struct TokenBroadcast {
    sender: broadcast::Sender<PlatformTokenEvent>,
}

impl TokenBroadcast {
    /// Create a broadcast with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a broadcast with a specific capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to future token events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformTokenEvent> {
        self.sender.subscribe()
    }

    /// Announce a token.
    ///
    /// Returns the number of listeners that received it; zero listeners is
    /// not an error.
    pub fn publish(&self, event: PlatformTokenEvent) -> usize {
        trace!(platform = %event.platform, "Publishing token event");
        self.sender.send(event).unwrap_or_default()
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TokenBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

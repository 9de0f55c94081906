//! Transport abstraction traits for Herald.
//!
//! The native push stack (APNs on iOS, GCM on Android) is reached through a
//! [`PushTransport`]. Implementations own token acquisition and delivery; the
//! rest of Herald only sees tokens, badge updates, and an ordered queue of
//! [`NativeEvent`]s.

use async_trait::async_trait;
use herald_protocol::{DeviceToken, NativeEvent, Platform};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Sending half of the native event queue, held by the transport adapter.
pub type EventSender = mpsc::UnboundedSender<NativeEvent>;

/// Receiving half of the native event queue, consumed by a single dispatcher.
pub type EventReceiver = mpsc::UnboundedReceiver<NativeEvent>;

/// Create a new native event queue.
#[must_use]
pub fn event_queue() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Registration request handed to the native transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// GCM sender / project id. Unused on iOS.
    #[serde(rename = "senderID", default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    /// Request permission to set the badge.
    pub badge: bool,
    /// Request permission to play sounds.
    pub sound: bool,
    /// Request permission to show alerts.
    pub alert: bool,
}

impl TransportConfig {
    /// The fixed registration shape for an app-level sender id.
    #[must_use]
    pub fn for_sender(sender_id: Option<String>) -> Self {
        Self {
            sender_id,
            badge: true,
            sound: true,
            alert: true,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::for_sender(None)
    }
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The native registration call failed.
    #[error("Registration failed: {0}")]
    Registration(String),

    /// The native unregistration call failed.
    #[error("Unregistration failed: {0}")]
    Unregistration(String),

    /// Setting the badge number failed.
    #[error("Badge update failed: {0}")]
    Badge(String),

    /// The event queue has no consumer left.
    #[error("Event channel closed")]
    ChannelClosed,

    /// Bridge payload could not be decoded.
    #[error("Protocol error: {0}")]
    Protocol(#[from] herald_protocol::ProtocolError),
}

/// A native push transport.
///
/// There are no local timeouts: a registration resolves or fails only when
/// the platform says so.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Platform this transport delivers for.
    fn platform(&self) -> Platform;

    /// Request a device token.
    ///
    /// Android transports resolve with the `"OK"` sentinel here and deliver
    /// the real token later as a `registered` notification.
    async fn register(&self, config: &TransportConfig) -> Result<DeviceToken, TransportError>;

    /// Stop receiving pushes.
    async fn unregister(&self, options: &serde_json::Value) -> Result<(), TransportError>;

    /// Set the app icon badge number.
    async fn set_badge_number(&self, badge: i64) -> Result<(), TransportError>;

    /// Take the receiving end of the native event queue.
    ///
    /// The queue has a single consumer; every call after the first returns
    /// `None`.
    fn take_events(&self) -> Option<EventReceiver>;

    /// Get the transport name (e.g., "apns", "gcm", "loopback").
    fn name(&self) -> &'static str;
}

//! Events emitted by the native push bridge.

use crate::notification::Notification;

/// Name of the event carrying an inbound notification.
pub const NOTIFICATION_RECEIVED: &str = "notificationReceived";

/// An event delivered by the native transport, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    /// A notification arrived (including Android's `registered` callback).
    NotificationReceived(Notification),
    /// Any other bridge event; the dispatcher ignores these.
    Other {
        /// Event name as reported by the bridge.
        name: String,
    },
}

impl NativeEvent {
    /// Event name as it appears on the bridge.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::NotificationReceived(_) => NOTIFICATION_RECEIVED,
            Self::Other { name } => name,
        }
    }
}

impl From<Notification> for NativeEvent {
    fn from(notification: Notification) -> Self {
        Self::NotificationReceived(notification)
    }
}

//! Codec for native bridge payloads.
//!
//! Native plugins hand notifications over as JSON documents. This module
//! turns raw bridge payloads into typed [`NativeEvent`]s and back.

use bytes::Bytes;
use thiserror::Error;

use crate::event::{NativeEvent, NOTIFICATION_RECEIVED};
use crate::notification::Notification;

/// Maximum payload size accepted from the bridge (256 KiB).
pub const MAX_PAYLOAD_SIZE: usize = 256 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload exceeds maximum size.
    #[error("Payload size {0} exceeds maximum {MAX_PAYLOAD_SIZE}")]
    PayloadTooLarge(usize),

    /// Payload was empty where a notification was expected.
    #[error("Empty payload")]
    Empty,

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a notification from a JSON payload.
///
/// # Errors
///
/// Returns an error if the payload is empty, too large, or not a valid
/// notification document.
pub fn decode_notification(payload: &[u8]) -> Result<Notification, ProtocolError> {
    if payload.is_empty() {
        return Err(ProtocolError::Empty);
    }
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }

    Ok(serde_json::from_slice(payload)?)
}

/// Encode a notification to a JSON payload.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_notification(notification: &Notification) -> Result<Bytes, ProtocolError> {
    let payload = serde_json::to_vec(notification)?;

    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }

    Ok(Bytes::from(payload))
}

/// Decode a named bridge event.
///
/// Only `notificationReceived` carries a payload that is inspected; other
/// events are passed through by name.
///
/// # Errors
///
/// Returns an error if a `notificationReceived` payload cannot be decoded.
pub fn decode_event(name: &str, payload: &[u8]) -> Result<NativeEvent, ProtocolError> {
    if name == NOTIFICATION_RECEIVED {
        decode_notification(payload).map(NativeEvent::NotificationReceived)
    } else {
        Ok(NativeEvent::Other {
            name: name.to_string(),
        })
    }
}

//! # herald-protocol
//!
//! Data model shared by every Herald crate: the notifications a native push
//! bridge delivers, the device tokens it issues, and the JSON codec used to
//! move both across the bridge.
//!
//! ## Example
//!
//! ```rust
//! use herald_protocol::{codec, NativeEvent, NOTIFICATION_RECEIVED};
//!
//! let event = codec::decode_event(NOTIFICATION_RECEIVED, br#"{"alert":"Hi"}"#).unwrap();
//! assert!(matches!(event, NativeEvent::NotificationReceived(_)));
//! ```

pub mod codec;
pub mod event;
pub mod notification;
pub mod token;

pub use codec::{decode_event, decode_notification, encode_notification, ProtocolError};
pub use event::{NativeEvent, NOTIFICATION_RECEIVED};
pub use notification::{Foreground, Notification};
pub use token::{DeviceToken, Platform, PlatformTokenEvent, DEV_TOKEN_PREFIX, SENTINEL_TOKEN};

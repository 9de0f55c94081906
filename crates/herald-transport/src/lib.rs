//! # herald-transport
//!
//! Native push transport abstraction for Herald.
//!
//! The platform push stack is an opaque collaborator: it issues tokens, sets
//! the badge, and delivers notifications. This crate pins that down as the
//! [`PushTransport`] trait plus a single-consumer event queue, so the
//! dispatcher never depends on a concrete platform.
//!
//! - **APNs / GCM bridges** implement `PushTransport` in the host app
//! - **Loopback** is an in-process transport for development and tests
//!
//! ```rust,ignore
//! use herald_transport::{PushTransport, TransportConfig};
//!
//! async fn token(transport: &dyn PushTransport) {
//!     let token = transport.register(&TransportConfig::default()).await;
//! }
//! ```

pub mod traits;

#[cfg(feature = "loopback")]
pub mod loopback;

pub use traits::{
    event_queue, EventReceiver, EventSender, PushTransport, TransportConfig, TransportError,
};

#[cfg(feature = "loopback")]
pub use loopback::LoopbackTransport;

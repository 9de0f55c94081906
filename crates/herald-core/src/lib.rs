//! # herald-core
//!
//! Push registration, token propagation, and notification dispatch.
//!
//! This crate provides the notification lifecycle:
//!
//! - **TokenRegistrar** - Obtain a device token (or a `DEV-` token)
//! - **TokenSink** - Best-effort persistence of tokens against the user
//! - **NotificationDispatcher** - Per-notification alert/sound/badge/action policy
//! - **ActionRunner** - Navigate when a notification wakes the app
//! - **PushFacade** - The single entry point tying them together
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌────────────────┐     ┌────────────────┐
//! │  PushFacade │────▶│ TokenRegistrar │────▶│ TokenBroadcast │
//! └─────────────┘     └────────────────┘     │   TokenSink    │
//!        │                                   └────────────────┘
//!        ▼
//! ┌────────────────────────┐     ┌──────────────┐
//! │ NotificationDispatcher │────▶│ ActionRunner │
//! └────────────────────────┘     └──────────────┘
//! ```

pub mod actions;
pub mod broadcast;
pub mod capabilities;
pub mod dispatcher;
pub mod facade;
pub mod options;
pub mod registrar;
pub mod sink;

pub use actions::ActionRunner;
pub use broadcast::TokenBroadcast;
pub use capabilities::{AlertPresenter, Capabilities, LogAlert, Navigator, SoundPlayer};
pub use dispatcher::{DispatchOutcome, DispatcherStats, NotificationDispatcher};
pub use facade::{AppContext, PendingRegistration, PushError, PushFacade};
pub use options::{HandlerOutcome, RegistrationOptions, RegistrationOverrides};
pub use registrar::{development_token, TokenRegistrar};
pub use sink::{IdentityError, IdentityStore, MemoryIdentityStore, PersistOutcome, TokenSink};

//! In-process loopback transport.
//!
//! Stands in for the native push stack on development hosts and in tests:
//! registration resolves with a configured outcome and notifications are
//! injected by hand, in delivery order.

use async_trait::async_trait;
use herald_protocol::{codec, DeviceToken, NativeEvent, Notification, Platform, SENTINEL_TOKEN};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace};

use crate::traits::{
    event_queue, EventReceiver, EventSender, PushTransport, TransportConfig, TransportError,
};

/// Token a loopback iOS transport hands out unless told otherwise.
pub const DEFAULT_IOS_TOKEN: &str = "loopback-apns-token";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A transport that loops injected events straight back to the consumer.
pub struct LoopbackTransport {
    platform: Platform,
    /// Outcome of the next `register` call.
    outcome: Mutex<Result<DeviceToken, String>>,
    sender: EventSender,
    receiver: Mutex<Option<EventReceiver>>,
    register_calls: AtomicUsize,
    last_config: Mutex<Option<TransportConfig>>,
    badges: Mutex<Vec<i64>>,
    fail_badge: AtomicBool,
    fail_unregister: AtomicBool,
    registered: AtomicBool,
}

impl LoopbackTransport {
    /// Create a loopback transport for a platform.
    ///
    /// iOS registrations resolve with [`DEFAULT_IOS_TOKEN`]; Android ones with
    /// the `"OK"` sentinel, like the real GCM plugin.
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        let token = match platform {
            Platform::Ios => DEFAULT_IOS_TOKEN,
            Platform::Android => SENTINEL_TOKEN,
        };
        let (sender, receiver) = event_queue();

        Self {
            platform,
            outcome: Mutex::new(Ok(DeviceToken::from(token))),
            sender,
            receiver: Mutex::new(Some(receiver)),
            register_calls: AtomicUsize::new(0),
            last_config: Mutex::new(None),
            badges: Mutex::new(Vec::new()),
            fail_badge: AtomicBool::new(false),
            fail_unregister: AtomicBool::new(false),
            registered: AtomicBool::new(false),
        }
    }

    /// Resolve registrations with a specific token.
    #[must_use]
    pub fn with_token(self, token: impl Into<DeviceToken>) -> Self {
        *lock(&self.outcome) = Ok(token.into());
        self
    }

    /// Fail registrations with the given reason.
    #[must_use]
    pub fn with_registration_error(self, reason: impl Into<String>) -> Self {
        *lock(&self.outcome) = Err(reason.into());
        self
    }

    /// Make badge updates fail (or succeed again).
    pub fn set_badge_failure(&self, fail: bool) {
        self.fail_badge.store(fail, Ordering::Relaxed);
    }

    /// Make unregistration fail (or succeed again).
    pub fn set_unregister_failure(&self, fail: bool) {
        self.fail_unregister.store(fail, Ordering::Relaxed);
    }

    /// Deliver an event to the consumer.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer has gone away.
    pub fn inject(&self, event: impl Into<NativeEvent>) -> Result<(), TransportError> {
        let event = event.into();
        trace!(event = %event.name(), "Loopback event injected");
        self.sender
            .send(event)
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Decode a raw bridge payload and deliver it.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be decoded or the consumer has
    /// gone away.
    pub fn inject_raw(&self, name: &str, payload: &[u8]) -> Result<(), TransportError> {
        let event = codec::decode_event(name, payload)?;
        self.inject(event)
    }

    /// Deliver Android's asynchronous registration-completion event.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer has gone away.
    pub fn complete_registration(&self, regid: impl Into<String>) -> Result<(), TransportError> {
        self.inject(Notification::new().with_event("registered").with_regid(regid))
    }

    /// Number of `register` calls made so far.
    #[must_use]
    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::Relaxed)
    }

    /// Configuration passed to the last `register` call.
    #[must_use]
    pub fn last_config(&self) -> Option<TransportConfig> {
        lock(&self.last_config).clone()
    }

    /// Badge numbers set so far, oldest first.
    #[must_use]
    pub fn badges(&self) -> Vec<i64> {
        lock(&self.badges).clone()
    }

    /// Returns `true` between a successful `register` and `unregister`.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PushTransport for LoopbackTransport {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn register(&self, config: &TransportConfig) -> Result<DeviceToken, TransportError> {
        self.register_calls.fetch_add(1, Ordering::Relaxed);
        *lock(&self.last_config) = Some(config.clone());

        let outcome = lock(&self.outcome).clone();
        match outcome {
            Ok(token) => {
                self.registered.store(true, Ordering::Relaxed);
                info!(platform = %self.platform, "Loopback registration succeeded");
                Ok(token)
            }
            Err(reason) => Err(TransportError::Registration(reason)),
        }
    }

    async fn unregister(&self, _options: &serde_json::Value) -> Result<(), TransportError> {
        if self.fail_unregister.load(Ordering::Relaxed) {
            return Err(TransportError::Unregistration("unregistration disabled".into()));
        }
        self.registered.store(false, Ordering::Relaxed);
        debug!(platform = %self.platform, "Loopback unregistered");
        Ok(())
    }

    async fn set_badge_number(&self, badge: i64) -> Result<(), TransportError> {
        if self.fail_badge.load(Ordering::Relaxed) {
            return Err(TransportError::Badge("badge updates disabled".into()));
        }
        lock(&self.badges).push(badge);
        Ok(())
    }

    fn take_events(&self) -> Option<EventReceiver> {
        lock(&self.receiver).take()
    }

    fn name(&self) -> &'static str {
        "loopback"
    }
}

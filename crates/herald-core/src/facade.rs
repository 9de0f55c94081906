//! The public push entry point.
//!
//! [`PushFacade`] ties registration, token propagation and dispatch together:
//!
//! ```text
//! register() ──▶ TokenRegistrar ──▶ TokenBroadcast + TokenSink ──▶ PendingRegistration
//!     │
//!     └──▶ NotificationDispatcher (one per facade, options swapped on re-register)
//! ```

use herald_protocol::{DeviceToken, Platform, PlatformTokenEvent};
use herald_transport::{PushTransport, TransportConfig, TransportError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::broadcast::TokenBroadcast;
use crate::capabilities::Capabilities;
use crate::dispatcher::{DispatcherStats, NotificationDispatcher};
use crate::options::RegistrationOptions;
use crate::registrar::TokenRegistrar;
use crate::sink::{IdentityStore, TokenSink};

/// Push errors surfaced to the caller of `register`.
#[derive(Debug, Error)]
pub enum PushError {
    /// The native transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The registration task ended without resolving (runtime shut down).
    #[error("Registration interrupted")]
    Interrupted,
}

/// The identified application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppContext {
    /// Application identifier.
    pub app_id: String,
    /// GCM sender / project id.
    #[serde(default)]
    pub gcm_sender_id: Option<String>,
    /// Push API server the backend syncs tokens through.
    #[serde(default)]
    pub push_api_server: Option<String>,
}

impl AppContext {
    /// Create a context for an app id.
    #[must_use]
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            gcm_sender_id: None,
            push_api_server: None,
        }
    }

    /// Set the GCM sender id.
    #[must_use]
    pub fn with_gcm_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.gcm_sender_id = Some(sender_id.into());
        self
    }

    /// Set the push API server.
    #[must_use]
    pub fn with_push_api_server(mut self, server: impl Into<String>) -> Self {
        self.push_api_server = Some(server.into());
        self
    }

    /// Registration request for the native transport.
    #[must_use]
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::for_sender(self.gcm_sender_id.clone())
    }
}

/// A registration in flight.
///
/// Resolves once with the device token or the transport error. Dropping it
/// does not cancel the registration; token broadcast and persistence still
/// happen.
#[derive(Debug)]
#[must_use = "await the registration to observe its token or error"]
pub struct PendingRegistration {
    rx: oneshot::Receiver<Result<DeviceToken, PushError>>,
}

impl Future for PendingRegistration {
    type Output = Result<DeviceToken, PushError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| Err(PushError::Interrupted)))
    }
}

struct Subscription {
    options: watch::Sender<Arc<RegistrationOptions>>,
    dispatcher: Arc<NotificationDispatcher>,
    task: JoinHandle<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Push registration and dispatch for one application.
pub struct PushFacade {
    app: Option<AppContext>,
    transport: Arc<dyn PushTransport>,
    registrar: TokenRegistrar,
    sink: TokenSink,
    tokens: TokenBroadcast,
    capabilities: Capabilities,
    subscription: Mutex<Option<Subscription>>,
}

impl PushFacade {
    /// Create the facade.
    ///
    /// Without an identified application (missing or empty app id) the
    /// facade logs an error and every `register` call returns `None`.
    #[must_use]
    pub fn new(
        app: Option<AppContext>,
        transport: Arc<dyn PushTransport>,
        identity: Arc<dyn IdentityStore>,
        capabilities: Capabilities,
    ) -> Self {
        let app = app.filter(|app| !app.app_id.is_empty());
        match &app {
            Some(app) => info!(
                app_id = %app.app_id,
                transport = transport.name(),
                platform = %transport.platform(),
                "Push initialized"
            ),
            None => error!("Unable to initialize push: the application must be identified first"),
        }

        Self {
            app,
            registrar: TokenRegistrar::new(transport.clone()),
            transport,
            sink: TokenSink::new(identity),
            tokens: TokenBroadcast::new(),
            capabilities,
            subscription: Mutex::new(None),
        }
    }

    /// Returns `true` if push can be used.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.app.is_some()
    }

    /// The identified application, if any.
    #[must_use]
    pub fn app(&self) -> Option<&AppContext> {
        self.app.as_ref()
    }

    /// Listen for token announcements from both platforms.
    #[must_use]
    pub fn subscribe_tokens(&self) -> broadcast::Receiver<PlatformTokenEvent> {
        self.tokens.subscribe()
    }

    /// Statistics of the live dispatcher, once one exists.
    #[must_use]
    pub fn dispatcher_stats(&self) -> Option<DispatcherStats> {
        lock(&self.subscription)
            .as_ref()
            .map(|sub| sub.dispatcher.stats())
    }

    /// Register for push notifications.
    ///
    /// Returns `None` when push is unavailable. Otherwise the notification
    /// dispatcher is (re)configured with `options` and a token registration
    /// starts in the background.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn register(
        &self,
        options: RegistrationOptions,
        metadata: Option<serde_json::Value>,
    ) -> Option<PendingRegistration> {
        let Some(app) = self.app.as_ref() else {
            debug!("Push unavailable, ignoring register");
            return None;
        };

        let options = Arc::new(options);
        self.subscribe(Arc::clone(&options));

        debug!(
            app_id = %app.app_id,
            push_api_server = app.push_api_server.as_deref().unwrap_or_default(),
            development = options.development,
            metadata = ?metadata,
            "Registering for push"
        );

        let (tx, rx) = oneshot::channel();
        let config = app.transport_config();
        let registrar = self.registrar.clone();
        let platform = self.transport.platform();
        let tokens = self.tokens.clone();
        let sink = self.sink.clone();

        tokio::spawn(async move {
            let result = match registrar.register(&options, &config).await {
                Ok(token) => {
                    info!(token = %token, "Push registered");
                    announce_token(platform, &token, &options, &tokens, &sink);
                    Ok(token)
                }
                Err(e) => {
                    error!(error = %e, "Push registration failed");
                    Err(PushError::from(e))
                }
            };

            if tx.send(result).is_err() {
                trace!("Registration handle dropped before resolution");
            }
        });

        Some(PendingRegistration { rx })
    }

    /// Unregister from push notifications.
    ///
    /// # Errors
    ///
    /// Returns the transport's error.
    pub async fn unregister(&self, options: &serde_json::Value) -> Result<(), PushError> {
        self.transport.unregister(options).await?;
        info!("Push unregistered");
        Ok(())
    }

    /// Attach the dispatcher to the native event queue, once.
    fn subscribe(&self, options: Arc<RegistrationOptions>) {
        let mut slot = lock(&self.subscription);

        if let Some(sub) = slot.as_ref() {
            sub.options.send_replace(options);
            debug!("Dispatcher already subscribed, options updated");
            return;
        }

        let Some(events) = self.transport.take_events() else {
            warn!("Native event stream already claimed; notifications will not be dispatched");
            return;
        };

        let (tx, rx) = watch::channel(options);
        let dispatcher = Arc::new(NotificationDispatcher::new(
            self.transport.clone(),
            self.sink.clone(),
            self.tokens.clone(),
            self.capabilities.clone(),
            rx,
        ));
        let task = tokio::spawn(Arc::clone(&dispatcher).run(events));

        *slot = Some(Subscription {
            options: tx,
            dispatcher,
            task,
        });
    }
}

impl Drop for PushFacade {
    fn drop(&mut self) {
        if let Some(sub) = lock(&self.subscription).take() {
            sub.task.abort();
        }
    }
}

/// Broadcast and persist a token returned by the registration call.
///
/// The `"OK"` sentinel means the real token comes later as an event.
fn announce_token(
    platform: Platform,
    token: &DeviceToken,
    options: &RegistrationOptions,
    tokens: &TokenBroadcast,
    sink: &TokenSink,
) {
    if token.is_sentinel() {
        debug!("Transport acknowledged registration; token will follow as an event");
        return;
    }

    tokens.publish(PlatformTokenEvent::new(token.clone(), platform));
    (options.on_token_received)(token);
    sink.persist(platform, token);
}

//! Notification dispatch.
//!
//! The dispatcher consumes the native event queue one event at a time and
//! runs the policy chain for each notification:
//!
//! 1. application callback (an explicit `false` stops here)
//! 2. Android `registered` event → token broadcast + persistence
//! 3. alert
//! 4. sound
//! 5. badge
//! 6. wake action (background deliveries only)
//!
//! Options are read through a `watch` channel so a re-registration changes
//! the policy of the one live dispatcher instead of adding a second one.

use herald_protocol::{DeviceToken, NativeEvent, Notification, Platform, PlatformTokenEvent};
use herald_transport::{EventReceiver, PushTransport};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::actions::ActionRunner;
use crate::broadcast::TokenBroadcast;
use crate::capabilities::Capabilities;
use crate::options::{HandlerOutcome, RegistrationOptions};
use crate::sink::TokenSink;

/// Live view of the current registration options.
pub type OptionsReceiver = watch::Receiver<Arc<RegistrationOptions>>;

/// Side effects a single dispatch produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// The application callback returned `false`.
    pub suppressed: bool,
    /// An Android registration id was announced.
    pub token_registered: bool,
    /// Alert text was shown.
    pub alert_shown: bool,
    /// A sound was played.
    pub sound_played: bool,
    /// The badge was updated.
    pub badge_set: bool,
    /// A navigation action ran.
    pub action_run: bool,
}

/// Dispatcher statistics.
#[derive(Debug, Clone, Default)]
pub struct DispatcherStats {
    /// Notifications received.
    pub received: u64,
    /// Notifications whose policy chain has finished.
    pub dispatched: u64,
    /// Notifications stopped by the application callback.
    pub suppressed: u64,
    /// Wake actions that navigated.
    pub actions_run: u64,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    dispatched: AtomicU64,
    suppressed: AtomicU64,
    actions_run: AtomicU64,
}

/// Applies registration policy to inbound notifications.
pub struct NotificationDispatcher {
    platform: Platform,
    options: OptionsReceiver,
    transport: Arc<dyn PushTransport>,
    sink: TokenSink,
    tokens: TokenBroadcast,
    capabilities: Capabilities,
    actions: ActionRunner,
    counters: Counters,
}

impl NotificationDispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(
        transport: Arc<dyn PushTransport>,
        sink: TokenSink,
        tokens: TokenBroadcast,
        capabilities: Capabilities,
        options: OptionsReceiver,
    ) -> Self {
        Self {
            platform: transport.platform(),
            actions: ActionRunner::new(capabilities.navigator.clone()),
            options,
            transport,
            sink,
            tokens,
            capabilities,
            counters: Counters::default(),
        }
    }

    /// Options currently in effect.
    #[must_use]
    pub fn options(&self) -> Arc<RegistrationOptions> {
        Arc::clone(&self.options.borrow())
    }

    /// Get dispatcher statistics.
    #[must_use]
    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            received: self.counters.received.load(Ordering::Relaxed),
            dispatched: self.counters.dispatched.load(Ordering::Acquire),
            suppressed: self.counters.suppressed.load(Ordering::Relaxed),
            actions_run: self.counters.actions_run.load(Ordering::Relaxed),
        }
    }

    /// Consume the event queue until the transport closes it.
    ///
    /// Events are handled strictly one after another, in delivery order.
    pub async fn run(self: Arc<Self>, mut events: EventReceiver) {
        info!(platform = %self.platform, "Notification dispatcher started");
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        info!(platform = %self.platform, "Native event stream closed");
    }

    /// Handle one bridge event.
    ///
    /// Returns `None` for events that are not notifications.
    pub async fn handle_event(&self, event: NativeEvent) -> Option<DispatchOutcome> {
        match event {
            NativeEvent::NotificationReceived(notification) => {
                Some(self.dispatch(&notification).await)
            }
            NativeEvent::Other { name } => {
                trace!(event = %name, "Ignoring native event");
                None
            }
        }
    }

    /// Run the policy chain for one notification.
    pub async fn dispatch(&self, notification: &Notification) -> DispatchOutcome {
        self.counters.received.fetch_add(1, Ordering::Relaxed);
        let outcome = self.apply_policy(notification).await;
        self.counters.dispatched.fetch_add(1, Ordering::Release);
        outcome
    }

    async fn apply_policy(&self, notification: &Notification) -> DispatchOutcome {
        let options = self.options();
        let mut outcome = DispatchOutcome::default();

        debug!(
            event = %notification.event,
            foreground = notification.is_foreground(),
            "Notification received"
        );

        if options.handle(notification) == HandlerOutcome::Suppress {
            debug!("Notification handled by application callback");
            self.counters.suppressed.fetch_add(1, Ordering::Relaxed);
            outcome.suppressed = true;
            return outcome;
        }

        if self.platform == Platform::Android && notification.is_registration() {
            outcome.token_registered = self.complete_android_registration(notification, &options);
        }

        if options.can_show_alert {
            if let Some(alert) = notification.alert_text() {
                self.capabilities.alert_presenter().alert(alert);
                outcome.alert_shown = true;
            }
        }

        if options.can_play_sound {
            if let (Some(sound), Some(player)) =
                (notification.sound_name(), self.capabilities.sound.as_ref())
            {
                player.play(sound);
                outcome.sound_played = true;
            }
        }

        if options.can_set_badge {
            if let Some(badge) = notification.badge {
                match self.transport.set_badge_number(badge).await {
                    Ok(()) => outcome.badge_set = true,
                    Err(e) => warn!(badge, error = %e, "Could not set badge"),
                }
            }
        }

        if options.can_run_actions_on_wake && !notification.is_foreground() {
            outcome.action_run = self.actions.run(notification);
            if outcome.action_run {
                self.counters.actions_run.fetch_add(1, Ordering::Relaxed);
            }
        }

        outcome
    }

    /// Android delivers its token as a `registered` notification rather than
    /// as the result of the registration call.
    fn complete_android_registration(
        &self,
        notification: &Notification,
        options: &RegistrationOptions,
    ) -> bool {
        let Some(regid) = notification.regid.as_deref().filter(|r| !r.is_empty()) else {
            warn!("Registration event without a registration id");
            return false;
        };

        let token = DeviceToken::new(regid);
        info!(token = %token, platform = "android", "Push registered");

        self.tokens
            .publish(PlatformTokenEvent::new(token.clone(), Platform::Android));
        (options.on_token_received)(&token);
        self.sink.persist(Platform::Android, &token);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{AlertPresenter, Navigator, SoundPlayer};
    use crate::sink::MemoryIdentityStore;
    use herald_transport::LoopbackTransport;
    use serde_json::{json, Map, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl AlertPresenter for Recorder {
        fn alert(&self, message: &str) {
            self.record(format!("alert:{message}"));
        }
    }

    impl SoundPlayer for Recorder {
        fn play(&self, sound: &str) {
            self.record(format!("sound:{sound}"));
        }
    }

    impl Navigator for Recorder {
        fn navigate_to(&self, route: &str, params: &Map<String, Value>) {
            self.record(format!("nav:{route}:{}", Value::Object(params.clone())));
        }
    }

    struct Fixture {
        transport: Arc<LoopbackTransport>,
        store: Arc<MemoryIdentityStore>,
        tokens: TokenBroadcast,
        native: Arc<Recorder>,
        fallback: Arc<Recorder>,
        media: Arc<Recorder>,
        router: Arc<Recorder>,
    }

    impl Fixture {
        fn new(platform: Platform) -> Self {
            Self {
                transport: Arc::new(LoopbackTransport::new(platform)),
                store: Arc::new(MemoryIdentityStore::new()),
                tokens: TokenBroadcast::new(),
                native: Arc::default(),
                fallback: Arc::default(),
                media: Arc::default(),
                router: Arc::default(),
            }
        }

        fn full_capabilities(&self) -> Capabilities {
            Capabilities::new()
                .with_native_alert(self.native.clone())
                .with_fallback_alert(self.fallback.clone())
                .with_sound(self.media.clone())
                .with_navigator(self.router.clone())
        }

        fn dispatcher(
            &self,
            capabilities: Capabilities,
            options: RegistrationOptions,
        ) -> NotificationDispatcher {
            let (_tx, rx) = watch::channel(Arc::new(options));
            NotificationDispatcher::new(
                self.transport.clone(),
                TokenSink::new(self.store.clone()),
                self.tokens.clone(),
                capabilities,
                rx,
            )
        }
    }

    fn everything() -> Notification {
        Notification::new()
            .with_alert("Hi")
            .with_sound("ping.caf")
            .with_badge(4)
            .with_foreground(false)
            .with_action("tabs.home", Some(r#"{"id":5}"#.into()))
    }

    #[tokio::test]
    async fn test_full_policy_chain() {
        let fx = Fixture::new(Platform::Ios);
        let dispatcher = fx.dispatcher(fx.full_capabilities(), RegistrationOptions::new());

        let outcome = dispatcher.dispatch(&everything()).await;

        assert_eq!(
            outcome,
            DispatchOutcome {
                suppressed: false,
                token_registered: false,
                alert_shown: true,
                sound_played: true,
                badge_set: true,
                action_run: true,
            }
        );
        assert_eq!(fx.native.calls(), ["alert:Hi"]);
        assert!(fx.fallback.calls().is_empty());
        assert_eq!(fx.media.calls(), ["sound:ping.caf"]);
        assert_eq!(fx.transport.badges(), [4]);
        assert_eq!(fx.router.calls(), [format!("nav:tabs.home:{}", json!({"id": 5}))]);
    }

    #[tokio::test]
    async fn test_callback_false_suppresses_everything() {
        let fx = Fixture::new(Platform::Ios);
        let options = RegistrationOptions::new().on_notification(|_| false);
        let dispatcher = fx.dispatcher(fx.full_capabilities(), options);

        let outcome = dispatcher.dispatch(&everything()).await;

        assert_eq!(
            outcome,
            DispatchOutcome {
                suppressed: true,
                ..DispatchOutcome::default()
            }
        );
        assert!(fx.native.calls().is_empty());
        assert!(fx.media.calls().is_empty());
        assert!(fx.router.calls().is_empty());
        assert!(fx.transport.badges().is_empty());
        assert_eq!(dispatcher.stats().suppressed, 1);
    }

    #[tokio::test]
    async fn test_callback_unit_does_not_suppress() {
        let fx = Fixture::new(Platform::Ios);
        let options = RegistrationOptions::new().on_notification(|_| {});
        let dispatcher = fx.dispatcher(fx.full_capabilities(), options);

        assert!(dispatcher.dispatch(&everything()).await.alert_shown);
    }

    #[tokio::test]
    async fn test_fallback_alert_without_native() {
        let fx = Fixture::new(Platform::Ios);
        let capabilities = Capabilities::new().with_fallback_alert(fx.fallback.clone());
        let dispatcher = fx.dispatcher(capabilities, RegistrationOptions::new());

        let outcome = dispatcher
            .dispatch(&Notification::new().with_alert("Hi").with_foreground(false))
            .await;

        assert!(outcome.alert_shown);
        assert_eq!(fx.fallback.calls(), ["alert:Hi"]);
    }

    #[tokio::test]
    async fn test_missing_capabilities_are_silent() {
        let fx = Fixture::new(Platform::Ios);
        let dispatcher = fx.dispatcher(Capabilities::new(), RegistrationOptions::new());

        let outcome = dispatcher.dispatch(&everything()).await;

        assert!(!outcome.sound_played);
        assert!(!outcome.action_run);
        assert!(outcome.alert_shown);
    }

    #[tokio::test]
    async fn test_foreground_never_runs_actions() {
        let fx = Fixture::new(Platform::Ios);
        let dispatcher = fx.dispatcher(fx.full_capabilities(), RegistrationOptions::new());

        for foreground in [
            herald_protocol::Foreground::Flag(true),
            herald_protocol::Foreground::Text("1".into()),
            herald_protocol::Foreground::Number(1),
        ] {
            let n = Notification::new()
                .with_foreground(foreground)
                .with_action("tabs.home", None);
            assert!(!dispatcher.dispatch(&n).await.action_run);
        }
        assert!(fx.router.calls().is_empty());
    }

    #[tokio::test]
    async fn test_woken_action_with_string_flag() {
        let fx = Fixture::new(Platform::Ios);
        let dispatcher = fx.dispatcher(fx.full_capabilities(), RegistrationOptions::new());

        let n = Notification::new()
            .with_foreground("0")
            .with_action("tabs.home", Some(r#"{"id":5}"#.into()));
        assert!(dispatcher.dispatch(&n).await.action_run);
        assert_eq!(fx.router.calls(), [format!("nav:tabs.home:{}", json!({"id": 5}))]);
    }

    #[tokio::test]
    async fn test_disabled_policies() {
        let fx = Fixture::new(Platform::Ios);
        let options = RegistrationOptions::new()
            .can_show_alert(false)
            .can_play_sound(false)
            .can_set_badge(false)
            .can_run_actions_on_wake(false);
        let dispatcher = fx.dispatcher(fx.full_capabilities(), options);

        assert_eq!(
            dispatcher.dispatch(&everything()).await,
            DispatchOutcome::default()
        );
    }

    #[tokio::test]
    async fn test_badge_failure_is_contained() {
        let fx = Fixture::new(Platform::Ios);
        fx.transport.set_badge_failure(true);
        let dispatcher = fx.dispatcher(fx.full_capabilities(), RegistrationOptions::new());

        let outcome = dispatcher.dispatch(&everything()).await;

        assert!(!outcome.badge_set);
        assert!(outcome.action_run);
    }

    #[tokio::test]
    async fn test_android_registration_event() {
        let fx = Fixture::new(Platform::Android);
        fx.store.identify("user-1");
        let mut token_rx = fx.tokens.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = seen.clone();
        let options = RegistrationOptions::new()
            .on_token_received(move |t| seen_cb.lock().unwrap().push(t.to_string()));
        let dispatcher = fx.dispatcher(fx.full_capabilities(), options);

        let n = Notification::new().with_event("registered").with_regid("gcm-123");
        let outcome = dispatcher.dispatch(&n).await;

        assert!(outcome.token_registered);
        assert_eq!(
            token_rx.try_recv().unwrap(),
            PlatformTokenEvent::new("gcm-123", Platform::Android)
        );
        assert_eq!(fx.store.values("_push.android_tokens"), ["gcm-123"]);
        assert_eq!(*seen.lock().unwrap(), ["gcm-123"]);
    }

    #[tokio::test]
    async fn test_android_registration_before_identity() {
        let fx = Fixture::new(Platform::Android);
        let mut token_rx = fx.tokens.subscribe();
        let dispatcher = fx.dispatcher(fx.full_capabilities(), RegistrationOptions::new());

        let n = Notification::new().with_event("registered").with_regid("gcm-123");
        assert!(dispatcher.dispatch(&n).await.token_registered);
        assert!(token_rx.try_recv().is_ok());
        assert!(fx.store.values("_push.android_tokens").is_empty());
    }

    #[tokio::test]
    async fn test_registered_event_ignored_on_ios() {
        let fx = Fixture::new(Platform::Ios);
        let mut token_rx = fx.tokens.subscribe();
        let dispatcher = fx.dispatcher(fx.full_capabilities(), RegistrationOptions::new());

        let n = Notification::new().with_event("registered").with_regid("x");
        assert!(!dispatcher.dispatch(&n).await.token_registered);
        assert!(token_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_options_follow_watch_channel() {
        let fx = Fixture::new(Platform::Ios);
        let (tx, rx) = watch::channel(Arc::new(RegistrationOptions::new()));
        let dispatcher = NotificationDispatcher::new(
            fx.transport.clone(),
            TokenSink::new(fx.store.clone()),
            fx.tokens.clone(),
            fx.full_capabilities(),
            rx,
        );

        assert!(dispatcher.dispatch(&everything()).await.alert_shown);
        tx.send_replace(Arc::new(RegistrationOptions::new().can_show_alert(false)));
        assert!(!dispatcher.dispatch(&everything()).await.alert_shown);
    }

    #[tokio::test]
    async fn test_run_processes_in_order() {
        let fx = Fixture::new(Platform::Ios);
        let dispatcher = Arc::new(fx.dispatcher(fx.full_capabilities(), RegistrationOptions::new()));
        let (tx, events) = herald_transport::event_queue();

        for text in ["one", "two", "three"] {
            tx.send(Notification::new().with_alert(text).with_foreground(true).into())
                .unwrap();
        }
        tx.send(NativeEvent::Other {
            name: "resume".into(),
        })
        .unwrap();
        drop(tx);

        dispatcher.clone().run(events).await;

        assert_eq!(fx.native.calls(), ["alert:one", "alert:two", "alert:three"]);
        let stats = dispatcher.stats();
        assert_eq!(stats.received, 3);
        assert_eq!(stats.dispatched, 3);
    }

    #[tokio::test]
    async fn test_suppressed_notification_counts_as_dispatched() {
        let fx = Fixture::new(Platform::Ios);
        let dispatcher = fx.dispatcher(
            fx.full_capabilities(),
            RegistrationOptions::new().on_notification(|_| false),
        );

        assert!(dispatcher.dispatch(&everything()).await.suppressed);
        let stats = dispatcher.stats();
        assert_eq!(stats.suppressed, 1);
        assert_eq!(stats.dispatched, 1);
    }
}

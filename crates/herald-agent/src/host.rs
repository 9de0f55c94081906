//! Development host.
//!
//! Wires a loopback transport to a [`PushFacade`], registers, and then feeds
//! newline-delimited JSON notifications from stdin through the dispatcher.

use crate::config::{CapabilitiesConfig, Config};
use crate::metrics;
use anyhow::{bail, Result};
use herald_core::{
    AlertPresenter, Capabilities, MemoryIdentityStore, Navigator, PushFacade, RegistrationOptions,
    SoundPlayer,
};
use herald_protocol::{Platform, NOTIFICATION_RECEIVED};
use herald_transport::LoopbackTransport;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

/// How long to wait for queued notifications after stdin closes.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Alert primitive that prints to stdout.
struct ConsoleAlert;

impl AlertPresenter for ConsoleAlert {
    fn alert(&self, message: &str) {
        println!("[alert] {message}");
    }
}

struct LogSound;

impl SoundPlayer for LogSound {
    fn play(&self, sound: &str) {
        info!(sound, "Playing notification sound");
    }
}

struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate_to(&self, route: &str, params: &Map<String, Value>) {
        let params = Value::Object(params.clone());
        info!(route, params = %params, "Navigating");
    }
}

fn build_capabilities(config: &CapabilitiesConfig) -> Capabilities {
    let mut capabilities = Capabilities::new();
    if config.native_alert {
        capabilities = capabilities.with_native_alert(Arc::new(ConsoleAlert));
    }
    if config.sound {
        capabilities = capabilities.with_sound(Arc::new(LogSound));
    }
    if config.routing {
        capabilities = capabilities.with_navigator(Arc::new(LogNavigator));
    }
    capabilities
}

fn build_transport(config: &Config) -> LoopbackTransport {
    let mut transport = LoopbackTransport::new(config.platform);
    if let Some(token) = &config.loopback.token {
        transport = transport.with_token(token.as_str());
    }
    if let Some(reason) = &config.loopback.fail_registration {
        transport = transport.with_registration_error(reason.as_str());
    }
    transport
}

/// Run the agent until stdin closes.
///
/// # Errors
///
/// Returns an error if push is unavailable, registration fails, or stdin
/// cannot be read.
pub async fn run_agent(config: Config) -> Result<()> {
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    let transport = Arc::new(build_transport(&config));
    let store = Arc::new(MemoryIdentityStore::new());
    if let Some(user_id) = &config.identity.user_id {
        store.identify(user_id.as_str());
    }

    let push = PushFacade::new(
        config.app_context(),
        transport.clone(),
        store.clone(),
        build_capabilities(&config.capabilities),
    );

    let mut token_rx = push.subscribe_tokens();
    let token_task = tokio::spawn(async move {
        loop {
            match token_rx.recv().await {
                Ok(event) => {
                    metrics::record_token(event.platform);
                    println!("[token] {} {}", event.platform, event.token);
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Token listener lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let options = config.registration.apply(RegistrationOptions::new());
    let Some(pending) = push.register(options, None) else {
        bail!("push is unavailable: configure app_id or set HERALD_APP_ID");
    };

    match pending.await {
        Ok(token) => {
            metrics::record_registration("ok");
            info!(token = %token, "Registration complete");
        }
        Err(e) => {
            metrics::record_registration("error");
            return Err(e.into());
        }
    }

    let mut expected = 0;
    if config.platform == Platform::Android {
        if let Some(regid) = &config.loopback.regid {
            transport.complete_registration(regid.as_str())?;
            expected += 1;
        }
    }

    expected += feed_notifications(BufReader::new(tokio::io::stdin()), &transport).await?;
    wait_for_drain(&push, expected).await;

    if let Some(stats) = push.dispatcher_stats() {
        info!(
            received = stats.received,
            dispatched = stats.dispatched,
            suppressed = stats.suppressed,
            actions_run = stats.actions_run,
            "Dispatcher finished"
        );
    }

    drop(push);
    token_task.abort();
    Ok(())
}

/// Inject every JSON line from `reader` as a `notificationReceived` event.
///
/// Returns the number of notifications injected. Malformed lines are logged
/// and skipped.
async fn feed_notifications<R>(reader: R, transport: &LoopbackTransport) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut injected = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match transport.inject_raw(NOTIFICATION_RECEIVED, line.as_bytes()) {
            Ok(()) => {
                metrics::record_notification();
                injected += 1;
            }
            Err(e) => {
                metrics::record_error("decode");
                warn!(error = %e, "Skipping malformed notification");
            }
        }
    }

    debug!(injected, "Input closed");
    Ok(injected)
}

/// Wait until the dispatcher has finished `expected` notifications.
///
/// Returns `false` if the queue did not drain before [`DRAIN_TIMEOUT`].
async fn wait_for_drain(push: &PushFacade, expected: u64) -> bool {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        let dispatched = push.dispatcher_stats().map_or(0, |s| s.dispatched);
        if dispatched >= expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    warn!(expected, "Dispatcher did not drain before timeout");
    false
}

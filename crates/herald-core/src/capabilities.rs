//! Optional platform primitives.
//!
//! Native alert, media playback and routing are not available everywhere.
//! They are resolved once when the host starts and passed in as a
//! [`Capabilities`] value; dispatch checks presence instead of probing.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Displays alert text.
pub trait AlertPresenter: Send + Sync {
    /// Show `message` to the user.
    fn alert(&self, message: &str);
}

/// Plays a named sound resource.
pub trait SoundPlayer: Send + Sync {
    /// Play `sound`.
    fn play(&self, sound: &str);
}

/// The application's routing subsystem.
pub trait Navigator: Send + Sync {
    /// Navigate to the named route with parameters.
    fn navigate_to(&self, route: &str, params: &Map<String, Value>);
}

/// Application-level alert that writes to the log.
///
/// Used when no native alert primitive is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlert;

impl AlertPresenter for LogAlert {
    fn alert(&self, message: &str) {
        info!(message = %message, "Push alert");
    }
}

/// Platform primitives available to the dispatcher.
#[derive(Clone)]
pub struct Capabilities {
    /// Native alert dialog, if the platform has one.
    pub native_alert: Option<Arc<dyn AlertPresenter>>,
    /// Alert used when there is no native one.
    pub fallback_alert: Arc<dyn AlertPresenter>,
    /// Media playback.
    pub sound: Option<Arc<dyn SoundPlayer>>,
    /// Routing subsystem.
    pub navigator: Option<Arc<dyn Navigator>>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            native_alert: None,
            fallback_alert: Arc::new(LogAlert),
            sound: None,
            navigator: None,
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("native_alert", &self.native_alert.is_some())
            .field("sound", &self.sound.is_some())
            .field("navigator", &self.navigator.is_some())
            .finish_non_exhaustive()
    }
}

impl Capabilities {
    /// No native primitives; alerts go to the log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the native alert primitive.
    #[must_use]
    pub fn with_native_alert(mut self, alert: Arc<dyn AlertPresenter>) -> Self {
        self.native_alert = Some(alert);
        self
    }

    /// Replace the fallback alert.
    #[must_use]
    pub fn with_fallback_alert(mut self, alert: Arc<dyn AlertPresenter>) -> Self {
        self.fallback_alert = alert;
        self
    }

    /// Set the media playback primitive.
    #[must_use]
    pub fn with_sound(mut self, sound: Arc<dyn SoundPlayer>) -> Self {
        self.sound = Some(sound);
        self
    }

    /// Set the routing subsystem.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// The alert primitive to use: native if present, fallback otherwise.
    #[must_use]
    pub fn alert_presenter(&self) -> &dyn AlertPresenter {
        self.native_alert
            .as_deref()
            .unwrap_or(self.fallback_alert.as_ref())
    }
}

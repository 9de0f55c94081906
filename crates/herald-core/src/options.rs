//! Registration options.
//!
//! [`RegistrationOptions`] is built once per `register()` call and is then
//! read-only. Defaults enable every capability; a [`RegistrationOverrides`]
//! (typically loaded from configuration) is merged on top, with caller
//! supplied fields winning.

use herald_protocol::{DeviceToken, Notification};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What the application's notification callback decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Continue with the built-in alert/sound/badge/action policy.
    Proceed,
    /// Stop here; the application handled the notification itself.
    Suppress,
}

impl From<bool> for HandlerOutcome {
    fn from(proceed: bool) -> Self {
        if proceed {
            Self::Proceed
        } else {
            Self::Suppress
        }
    }
}

/// Only an explicit `false` suppresses.
impl From<Option<bool>> for HandlerOutcome {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Proceed, Self::from)
    }
}

impl From<()> for HandlerOutcome {
    fn from(_: ()) -> Self {
        Self::Proceed
    }
}

/// Application callback invoked for every notification.
pub type NotificationHandler = Arc<dyn Fn(&Notification) -> HandlerOutcome + Send + Sync>;

/// Application callback invoked with every resolved token.
pub type TokenHandler = Arc<dyn Fn(&DeviceToken) + Send + Sync>;

/// Per-registration policy.
#[derive(Clone)]
pub struct RegistrationOptions {
    /// Synthesize a `DEV-` token instead of calling the native transport.
    pub development: bool,
    /// Show the notification's alert text.
    pub can_show_alert: bool,
    /// Apply the notification's badge number.
    pub can_set_badge: bool,
    /// Play the notification's sound.
    pub can_play_sound: bool,
    /// Run the notification's navigation action when it wakes the app.
    pub can_run_actions_on_wake: bool,
    /// Called first for every notification.
    pub on_notification: NotificationHandler,
    /// Called with every resolved token.
    pub on_token_received: TokenHandler,
}

impl Default for RegistrationOptions {
    fn default() -> Self {
        Self {
            development: false,
            can_show_alert: true,
            can_set_badge: true,
            can_play_sound: true,
            can_run_actions_on_wake: true,
            on_notification: Arc::new(|_| HandlerOutcome::Proceed),
            on_token_received: Arc::new(|_| {}),
        }
    }
}

impl fmt::Debug for RegistrationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationOptions")
            .field("development", &self.development)
            .field("can_show_alert", &self.can_show_alert)
            .field("can_set_badge", &self.can_set_badge)
            .field("can_play_sound", &self.can_play_sound)
            .field("can_run_actions_on_wake", &self.can_run_actions_on_wake)
            .finish_non_exhaustive()
    }
}

impl RegistrationOptions {
    /// Create options with every capability enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a synthesized development token.
    #[must_use]
    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Allow or forbid alerts.
    #[must_use]
    pub fn can_show_alert(mut self, allow: bool) -> Self {
        self.can_show_alert = allow;
        self
    }

    /// Allow or forbid badge updates.
    #[must_use]
    pub fn can_set_badge(mut self, allow: bool) -> Self {
        self.can_set_badge = allow;
        self
    }

    /// Allow or forbid sounds.
    #[must_use]
    pub fn can_play_sound(mut self, allow: bool) -> Self {
        self.can_play_sound = allow;
        self
    }

    /// Allow or forbid wake actions.
    #[must_use]
    pub fn can_run_actions_on_wake(mut self, allow: bool) -> Self {
        self.can_run_actions_on_wake = allow;
        self
    }

    /// Set the notification callback.
    ///
    /// The callback may return `bool`, `Option<bool>`, `()` or a
    /// [`HandlerOutcome`]; only an explicit `false` stops dispatch.
    #[must_use]
    pub fn on_notification<F, R>(mut self, handler: F) -> Self
    where
        F: Fn(&Notification) -> R + Send + Sync + 'static,
        R: Into<HandlerOutcome>,
    {
        self.on_notification = Arc::new(move |n| handler(n).into());
        self
    }

    /// Set the token callback.
    #[must_use]
    pub fn on_token_received<F>(mut self, handler: F) -> Self
    where
        F: Fn(&DeviceToken) + Send + Sync + 'static,
    {
        self.on_token_received = Arc::new(handler);
        self
    }

    /// Run the notification callback.
    #[must_use]
    pub fn handle(&self, notification: &Notification) -> HandlerOutcome {
        (self.on_notification)(notification)
    }

    /// Apply overrides on top of these options.
    #[must_use]
    pub fn merge(self, overrides: &RegistrationOverrides) -> Self {
        overrides.apply(self)
    }
}

/// Partial options, as found in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOverrides {
    /// Overrides [`RegistrationOptions::development`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development: Option<bool>,
    /// Overrides [`RegistrationOptions::can_show_alert`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_show_alert: Option<bool>,
    /// Overrides [`RegistrationOptions::can_set_badge`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_set_badge: Option<bool>,
    /// Overrides [`RegistrationOptions::can_play_sound`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_play_sound: Option<bool>,
    /// Overrides [`RegistrationOptions::can_run_actions_on_wake`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_run_actions_on_wake: Option<bool>,
}

impl RegistrationOverrides {
    /// Overlay the fields that are set onto `base`.
    #[must_use]
    pub fn apply(&self, mut base: RegistrationOptions) -> RegistrationOptions {
        if let Some(v) = self.development {
            base.development = v;
        }
        if let Some(v) = self.can_show_alert {
            base.can_show_alert = v;
        }
        if let Some(v) = self.can_set_badge {
            base.can_set_badge = v;
        }
        if let Some(v) = self.can_play_sound {
            base.can_play_sound = v;
        }
        if let Some(v) = self.can_run_actions_on_wake {
            base.can_run_actions_on_wake = v;
        }
        base
    }
}

//! Notification payloads delivered by the native push stack.
//!
//! A [`Notification`] only lives for the duration of a single dispatch. The
//! wire shape is whatever the native plugin hands over, so decoding is lenient:
//! unknown fields are kept in [`Notification::extra`], and the `alert`,
//! `foreground`, `badge` and `event` fields accept more than one JSON type.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Event name Android uses to hand over its registration id.
pub const REGISTERED_EVENT: &str = "registered";

/// Whether a notification arrived while the app was visible.
///
/// iOS plugins send `"1"`/`"0"`, Android sends a boolean and some bridges send
/// a number, so all three are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Foreground {
    /// Boolean flag.
    Flag(bool),
    /// Numeric flag, zero means background.
    Number(i64),
    /// String flag, `"0"` or empty means background.
    Text(String),
}

impl Foreground {
    /// Returns `true` if this value marks a foreground delivery.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Number(n) => *n != 0,
            Self::Text(text) => !(text.is_empty() || text == "0"),
        }
    }
}

impl From<bool> for Foreground {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<&str> for Foreground {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// An inbound push notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Alert text to display.
    #[serde(
        default,
        deserialize_with = "lenient_alert",
        skip_serializing_if = "Option::is_none"
    )]
    pub alert: Option<String>,

    /// Sound resource to play.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    /// Badge number to set on the app icon.
    #[serde(
        default,
        deserialize_with = "lenient_badge",
        skip_serializing_if = "Option::is_none"
    )]
    pub badge: Option<i64>,

    /// Foreground flag; absent means the app was woken from the background.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Foreground>,

    /// Platform-specific event name, e.g. `"message"` or `"registered"`.
    #[serde(
        default,
        deserialize_with = "lenient_event",
        skip_serializing_if = "String::is_empty"
    )]
    pub event: String,

    /// Android registration id, carried on `registered` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regid: Option<String>,

    /// Route to navigate to when the notification wakes the app.
    #[serde(rename = "$state", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// JSON-encoded route parameters.
    #[serde(
        rename = "$stateParams",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub state_params: Option<String>,

    /// Any other fields the native plugin attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notification {
    /// Create an empty notification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the alert text.
    #[must_use]
    pub fn with_alert(mut self, alert: impl Into<String>) -> Self {
        self.alert = Some(alert.into());
        self
    }

    /// Set the sound resource.
    #[must_use]
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// Set the badge number.
    #[must_use]
    pub fn with_badge(mut self, badge: i64) -> Self {
        self.badge = Some(badge);
        self
    }

    /// Set the foreground flag.
    #[must_use]
    pub fn with_foreground(mut self, foreground: impl Into<Foreground>) -> Self {
        self.foreground = Some(foreground.into());
        self
    }

    /// Set the event name.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Set the Android registration id.
    #[must_use]
    pub fn with_regid(mut self, regid: impl Into<String>) -> Self {
        self.regid = Some(regid.into());
        self
    }

    /// Attach a navigation action.
    #[must_use]
    pub fn with_action(mut self, state: impl Into<String>, params: Option<String>) -> Self {
        self.state = Some(state.into());
        self.state_params = params;
        self
    }

    /// Returns `true` if the app was visible when this notification arrived.
    #[must_use]
    pub fn is_foreground(&self) -> bool {
        self.foreground.as_ref().is_some_and(Foreground::is_truthy)
    }

    /// Returns `true` if this is Android's registration-completion event.
    #[must_use]
    pub fn is_registration(&self) -> bool {
        self.event == REGISTERED_EVENT
    }

    /// Alert text, if present and non-empty.
    #[must_use]
    pub fn alert_text(&self) -> Option<&str> {
        self.alert.as_deref().filter(|a| !a.is_empty())
    }

    /// Sound resource, if present and non-empty.
    #[must_use]
    pub fn sound_name(&self) -> Option<&str> {
        self.sound.as_deref().filter(|s| !s.is_empty())
    }
}

/// Accept badges sent as numbers or numeric strings; anything else is dropped.
fn lenient_badge<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accept plain alert strings and APNs alert dictionaries (`body`, then
/// `title`); anything else means no alert.
fn lenient_alert<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Object(dict)) => ["body", "title"]
            .iter()
            .find_map(|key| dict.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    })
}

/// Null or non-string event names decode as the empty event.
fn lenient_event<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_foreground_truthiness() {
        assert!(!Notification::new().is_foreground());
        assert!(!Notification::new().with_foreground(false).is_foreground());
        assert!(!Notification::new().with_foreground("0").is_foreground());
        assert!(!Notification::new().with_foreground("").is_foreground());
        assert!(!Foreground::Number(0).is_truthy());

        assert!(Notification::new().with_foreground(true).is_foreground());
        assert!(Notification::new().with_foreground("1").is_foreground());
        assert!(Foreground::Number(1).is_truthy());
    }

    #[test]
    fn test_wire_names() {
        let notification: Notification = serde_json::from_value(json!({
            "alert": "Hi",
            "foreground": "0",
            "$state": "tabs.home",
            "$stateParams": "{\"id\":5}",
            "coldstart": true
        }))
        .unwrap();

        assert_eq!(notification.alert.as_deref(), Some("Hi"));
        assert_eq!(notification.state.as_deref(), Some("tabs.home"));
        assert_eq!(notification.state_params.as_deref(), Some("{\"id\":5}"));
        assert_eq!(notification.extra.get("coldstart"), Some(&json!(true)));
        assert!(!notification.is_foreground());
    }

    #[test]
    fn test_lenient_badge() {
        let n: Notification = serde_json::from_value(json!({"badge": "7"})).unwrap();
        assert_eq!(n.badge, Some(7));

        let n: Notification = serde_json::from_value(json!({"badge": 3})).unwrap();
        assert_eq!(n.badge, Some(3));

        let n: Notification = serde_json::from_value(json!({"badge": "lots"})).unwrap();
        assert_eq!(n.badge, None);
    }

    #[test]
    fn test_registration_event() {
        let n = Notification::new().with_event("registered").with_regid("abc");
        assert!(n.is_registration());
        assert!(!Notification::new().with_event("message").is_registration());
    }

    #[test]
    fn test_empty_alert_ignored() {
        assert_eq!(Notification::new().with_alert("").alert_text(), None);
        assert_eq!(Notification::new().with_alert("Hi").alert_text(), Some("Hi"));
    }

    #[test]
    fn test_lenient_alert() {
        let n: Notification = serde_json::from_value(json!({
            "alert": {"title": "Order", "body": "Shipped"}
        }))
        .unwrap();
        assert_eq!(n.alert_text(), Some("Shipped"));

        let n: Notification =
            serde_json::from_value(json!({"alert": {"title": "Order"}})).unwrap();
        assert_eq!(n.alert_text(), Some("Order"));

        let n: Notification =
            serde_json::from_value(json!({"alert": 42, "sound": "ping"})).unwrap();
        assert_eq!(n.alert, None);
        assert_eq!(n.sound_name(), Some("ping"));
    }

    #[test]
    fn test_null_event_still_decodes() {
        let n: Notification =
            serde_json::from_value(json!({"event": null, "alert": "Hi"})).unwrap();
        assert_eq!(n.event, "");
        assert_eq!(n.alert_text(), Some("Hi"));

        let n: Notification = serde_json::from_value(json!({"event": 7})).unwrap();
        assert!(!n.is_registration());
    }
}

//! Device tokens and the token broadcast payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by synthesized development tokens.
pub const DEV_TOKEN_PREFIX: &str = "DEV-";

/// Value a transport returns when the real token arrives later as an event.
pub const SENTINEL_TOKEN: &str = "OK";

/// The push platform a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Apple Push Notification service.
    Ios,
    /// Google Cloud Messaging.
    Android,
}

impl Platform {
    /// Identity-store path that collects this platform's tokens.
    #[must_use]
    pub fn token_path(self) -> &'static str {
        match self {
            Self::Ios => "_push.ios_tokens",
            Self::Android => "_push.android_tokens",
        }
    }

    /// Lowercase platform name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// An opaque device token issued by a push transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceToken(String);

impl DeviceToken {
    /// Wrap a token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for synthesized development tokens.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.0.starts_with(DEV_TOKEN_PREFIX)
    }

    /// Returns `true` if the transport signalled that the token comes later.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.0 == SENTINEL_TOKEN
    }

    /// Consume the wrapper.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DeviceToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Broadcast once per successful (re)registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTokenEvent {
    /// The resolved token.
    pub token: DeviceToken,
    /// Platform that issued it.
    pub platform: Platform,
}

impl PlatformTokenEvent {
    /// Create a new token event.
    #[must_use]
    pub fn new(token: impl Into<DeviceToken>, platform: Platform) -> Self {
        Self {
            token: token.into(),
            platform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_paths() {
        assert_eq!(Platform::Ios.token_path(), "_push.ios_tokens");
        assert_eq!(Platform::Android.token_path(), "_push.android_tokens");
    }

    #[test]
    fn test_sentinel_and_dev_tokens() {
        assert!(DeviceToken::from("OK").is_sentinel());
        assert!(!DeviceToken::from("abc").is_sentinel());
        assert!(DeviceToken::from("DEV-1234").is_development());
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("iOS".parse::<Platform>().unwrap(), Platform::Ios);
        assert_eq!("android".parse::<Platform>().unwrap(), Platform::Android);
        assert!("windows".parse::<Platform>().is_err());
    }

    #[test]
    fn test_token_event_serialization() {
        let event = PlatformTokenEvent::new("abc", Platform::Android);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"token": "abc", "platform": "android"}));
    }
}

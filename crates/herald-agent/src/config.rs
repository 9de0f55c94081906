//! Agent configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (HERALD_*)
//! - TOML configuration file

use anyhow::{Context, Result};
use herald_core::{AppContext, RegistrationOverrides};
use herald_protocol::Platform;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application identifier. Push stays disabled without one.
    #[serde(default = "default_app_id")]
    pub app_id: Option<String>,

    /// GCM sender / project id.
    #[serde(default = "default_gcm_sender_id")]
    pub gcm_sender_id: Option<String>,

    /// Push API server.
    #[serde(default)]
    pub push_api_server: Option<String>,

    /// Platform the loopback transport pretends to be.
    #[serde(default = "default_platform")]
    pub platform: Platform,

    /// Registration option overrides.
    #[serde(default = "default_registration")]
    pub registration: RegistrationOverrides,

    /// User identity.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Which platform primitives the host provides.
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,

    /// Loopback transport behaviour.
    #[serde(default)]
    pub loopback: LoopbackConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// User identity configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Identified user; tokens are not synced without one.
    #[serde(default = "default_user_id")]
    pub user_id: Option<String>,
}

/// Host capability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitiesConfig {
    /// Print alerts to stdout instead of logging them.
    #[serde(default)]
    pub native_alert: bool,

    /// Provide media playback.
    #[serde(default)]
    pub sound: bool,

    /// Provide a router for wake actions.
    #[serde(default = "default_true")]
    pub routing: bool,
}

/// Loopback transport configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopbackConfig {
    /// Token returned by iOS registration.
    #[serde(default)]
    pub token: Option<String>,

    /// Registration id delivered as an Android `registered` event.
    #[serde(default)]
    pub regid: Option<String>,

    /// Fail registration with this reason.
    #[serde(default)]
    pub fail_registration: Option<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics export.
    #[serde(default)]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn default_app_id() -> Option<String> {
    env_string("HERALD_APP_ID")
}

fn default_gcm_sender_id() -> Option<String> {
    env_string("HERALD_GCM_SENDER_ID")
}

fn default_user_id() -> Option<String> {
    env_string("HERALD_USER_ID")
}

fn default_platform() -> Platform {
    env_string("HERALD_PLATFORM")
        .and_then(|p| p.parse().ok())
        .unwrap_or(Platform::Ios)
}

fn default_registration() -> RegistrationOverrides {
    RegistrationOverrides {
        development: env_string("HERALD_DEVELOPMENT").map(|v| v == "1" || v == "true"),
        ..RegistrationOverrides::default()
    }
}

fn default_true() -> bool {
    true
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            gcm_sender_id: default_gcm_sender_id(),
            push_api_server: None,
            platform: default_platform(),
            registration: default_registration(),
            identity: IdentityConfig {
                user_id: default_user_id(),
            },
            capabilities: CapabilitiesConfig::default(),
            loopback: LoopbackConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            native_alert: false,
            sound: false,
            routing: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from file or defaults.
    ///
    /// `HERALD_CONFIG` takes precedence over the default search paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        if let Some(path) = env_string("HERALD_CONFIG") {
            let expanded = shellexpand::tilde(&path);
            return Self::from_file(expanded.as_ref());
        }

        let config_paths = [
            "herald.toml",
            "/etc/herald/herald.toml",
            "~/.config/herald/herald.toml",
        ];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// The identified application, if an app id is configured.
    #[must_use]
    pub fn app_context(&self) -> Option<AppContext> {
        let app_id = self.app_id.as_deref()?;
        Some(AppContext {
            app_id: app_id.to_string(),
            gcm_sender_id: self.gcm_sender_id.clone(),
            push_api_server: self.push_api_server.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capabilities() {
        let caps = CapabilitiesConfig::default();
        assert!(!caps.native_alert);
        assert!(!caps.sound);
        assert!(caps.routing);
        assert!(!MetricsConfig::default().enabled);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            app_id = "a1b2c3"
            gcm_sender_id = "123456789"
            platform = "android"

            [registration]
            development = true
            canSetBadge = false

            [identity]
            user_id = "user-1"

            [capabilities]
            sound = true

            [loopback]
            regid = "gcm-regid"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.platform, Platform::Android);
        assert_eq!(config.registration.development, Some(true));
        assert_eq!(config.registration.can_set_badge, Some(false));
        assert_eq!(config.registration.can_show_alert, None);
        assert_eq!(config.identity.user_id.as_deref(), Some("user-1"));
        assert!(config.capabilities.sound);
        assert!(config.capabilities.routing);
        assert_eq!(config.loopback.regid.as_deref(), Some("gcm-regid"));

        let app = config.app_context().unwrap();
        assert_eq!(app.app_id, "a1b2c3");
        assert_eq!(app.gcm_sender_id.as_deref(), Some("123456789"));
    }

    #[test]
    fn test_config_without_app_id() {
        let config: Config = toml::from_str(r#"app_id = "x""#).unwrap();
        assert!(config.app_context().is_some());

        let mut config = config;
        config.app_id = None;
        assert!(config.app_context().is_none());
    }
}

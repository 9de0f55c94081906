//! Device token acquisition.

use herald_protocol::{DeviceToken, DEV_TOKEN_PREFIX};
use herald_transport::{PushTransport, TransportConfig, TransportError};
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

use crate::options::RegistrationOptions;

/// UUID v4 layout used for development tokens.
const DEV_TOKEN_TEMPLATE: &str = "xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx";

/// Synthesize a fresh development token.
///
/// `x` placeholders become random hex digits; `y` is constrained to the
/// variant digits `8`..=`b`.
#[must_use]
pub fn development_token() -> DeviceToken {
    let mut rng = rand::rng();
    let mut token = String::with_capacity(DEV_TOKEN_PREFIX.len() + DEV_TOKEN_TEMPLATE.len());
    token.push_str(DEV_TOKEN_PREFIX);

    for c in DEV_TOKEN_TEMPLATE.chars() {
        let digit = match c {
            'x' => rng.random_range(0..16u32),
            'y' => rng.random_range(0..16u32) & 0x3 | 0x8,
            other => {
                token.push(other);
                continue;
            }
        };
        token.extend(char::from_digit(digit, 16));
    }

    DeviceToken::new(token)
}

/// Requests a device token from the native transport, or synthesizes one.
#[derive(Clone)]
pub struct TokenRegistrar {
    transport: Arc<dyn PushTransport>,
}

impl TokenRegistrar {
    /// Create a registrar over a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn PushTransport>) -> Self {
        Self { transport }
    }

    /// Resolve a single device token.
    ///
    /// Development registrations never touch the transport; they yield once
    /// to the scheduler to mimic a round trip and never fail.
    ///
    /// # Errors
    ///
    /// Returns the transport's error unchanged. There is no retry.
    pub async fn register(
        &self,
        options: &RegistrationOptions,
        config: &TransportConfig,
    ) -> Result<DeviceToken, TransportError> {
        if options.development {
            tokio::task::yield_now().await;
            let token = development_token();
            debug!(token = %token, "Synthesized development token");
            return Ok(token);
        }

        debug!(transport = self.transport.name(), "Requesting device token");
        self.transport.register(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_protocol::Platform;
    use herald_transport::LoopbackTransport;

    fn assert_dev_pattern(token: &str) {
        let body = token.strip_prefix("DEV-").expect("missing DEV- prefix");
        let groups: Vec<&str> = body.split('-').collect();
        let lengths: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        assert_eq!(lengths, [8, 4, 4, 4, 12], "bad layout: {token}");
        assert!(body
            .chars()
            .filter(|c| *c != '-')
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(groups[2].starts_with('4'), "bad version digit: {token}");
        assert!(
            matches!(groups[3].chars().next(), Some('8' | '9' | 'a' | 'b')),
            "bad variant digit: {token}"
        );
    }

    #[test]
    fn test_development_token_pattern() {
        for _ in 0..200 {
            assert_dev_pattern(development_token().as_str());
        }
    }

    #[test]
    fn test_development_tokens_are_fresh() {
        let tokens: std::collections::HashSet<_> = (0..100).map(|_| development_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[tokio::test]
    async fn test_development_skips_transport() {
        let transport = Arc::new(LoopbackTransport::new(Platform::Ios));
        let registrar = TokenRegistrar::new(transport.clone());

        let options = RegistrationOptions::new().development(true);
        let token = registrar
            .register(&options, &TransportConfig::default())
            .await
            .unwrap();

        assert!(token.is_development());
        assert_eq!(transport.register_calls(), 0);
    }

    #[tokio::test]
    async fn test_native_path_passes_config() {
        let transport = Arc::new(LoopbackTransport::new(Platform::Ios).with_token("apns-1"));
        let registrar = TokenRegistrar::new(transport.clone());
        let config = TransportConfig::for_sender(Some("sender".into()));

        let token = registrar
            .register(&RegistrationOptions::new(), &config)
            .await
            .unwrap();

        assert_eq!(token.as_str(), "apns-1");
        assert_eq!(transport.last_config(), Some(config));
    }

    #[tokio::test]
    async fn test_native_failure_propagates() {
        let transport = Arc::new(LoopbackTransport::new(Platform::Ios).with_registration_error("no"));
        let registrar = TokenRegistrar::new(transport.clone());

        let result = registrar
            .register(&RegistrationOptions::new(), &TransportConfig::default())
            .await;

        assert!(matches!(result, Err(TransportError::Registration(_))));
        assert_eq!(transport.register_calls(), 1);
    }
}

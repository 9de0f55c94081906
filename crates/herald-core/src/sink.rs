//! Best-effort token persistence against the current user identity.

use dashmap::DashMap;
use herald_protocol::{DeviceToken, Platform};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Identity store errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No user has been identified yet.
    #[error("user identity not established")]
    NotIdentified,

    /// The store rejected the write.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Key-value sink for per-user data.
pub trait IdentityStore: Send + Sync {
    /// Append `value` to the list stored at `path`.
    ///
    /// With `merge`, a value already present is not added again.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotIdentified`] before a user is identified.
    fn push(&self, path: &str, value: &str, merge: bool) -> Result<(), IdentityError>;
}

/// In-memory identity store.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    user_id: RwLock<Option<String>>,
    data: DashMap<String, Vec<String>>,
}

impl MemoryIdentityStore {
    /// Create an empty store with no identified user.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identify the current user.
    pub fn identify(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        debug!(user = %user_id, "User identified");
        *self
            .user_id
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(user_id);
    }

    /// The identified user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.user_id
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Values stored at `path`.
    #[must_use]
    pub fn values(&self, path: &str) -> Vec<String> {
        self.data
            .get(path)
            .map(|v| v.value().clone())
            .unwrap_or_default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn push(&self, path: &str, value: &str, merge: bool) -> Result<(), IdentityError> {
        if self.user_id().is_none() {
            return Err(IdentityError::NotIdentified);
        }

        let mut entry = self.data.entry(path.to_string()).or_default();
        if merge && entry.iter().any(|v| v == value) {
            return Ok(());
        }
        entry.push(value.to_string());
        Ok(())
    }
}

/// Result of a persistence attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The token was written.
    Stored,
    /// No user identity yet; the token was not synced.
    NotIdentified,
    /// The store failed for another reason.
    Failed,
}

/// Writes resolved tokens into the identity store.
///
/// Never fails towards its caller: errors are logged and reported as a
/// [`PersistOutcome`].
#[derive(Clone)]
pub struct TokenSink {
    store: Arc<dyn IdentityStore>,
}

impl TokenSink {
    /// Create a sink over an identity store.
    #[must_use]
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Persist a token under the platform's path.
    pub fn persist(&self, platform: Platform, token: &DeviceToken) -> PersistOutcome {
        let path = platform.token_path();
        match self.store.push(path, token.as_str(), true) {
            Ok(()) => {
                debug!(path, "Token persisted");
                PersistOutcome::Stored
            }
            Err(IdentityError::NotIdentified) => {
                warn!(
                    path,
                    "Received push token before user identity was established; \
                     it will not be synced. Identify the user before registering for push."
                );
                PersistOutcome::NotIdentified
            }
            Err(e) => {
                warn!(path, error = %e, "Failed to persist push token");
                PersistOutcome::Failed
            }
        }
    }
}

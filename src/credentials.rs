//! Runtime-mutable store for the chat completion API key

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

/// Process-wide holder of the OpenAI API key.
///
/// The key can be swapped or cleared at runtime through the admin endpoints
/// while chat requests are in flight. A request reads the key once when it
/// builds the outgoing call; concurrent in-flight requests may observe a
/// change mid-flight, which is an accepted race (no lock is held across the
/// network call).
#[derive(Clone, Debug, Default)]
pub struct CredentialStore {
    key: Arc<RwLock<Option<SecretString>>>,
}

impl CredentialStore {
    /// Create a store, optionally seeded from startup configuration
    #[must_use]
    pub fn new(initial: Option<String>) -> Self {
        let initial = initial
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Self {
            key: Arc::new(RwLock::new(initial.map(SecretString::from))),
        }
    }

    /// Whether a key is currently configured
    pub async fn is_set(&self) -> bool {
        self.key.read().await.is_some()
    }

    /// Build an `Authorization` header value from the current key.
    ///
    /// The secret leaves the store here; callers must not log the
    /// returned value.
    pub async fn bearer_header(&self) -> Option<String> {
        self.key
            .read()
            .await
            .as_ref()
            .map(|k| format!("Bearer {}", k.expose_secret()))
    }

    /// Replace the key
    pub async fn set(&self, key: String) {
        *self.key.write().await = Some(SecretString::from(key));
    }

    /// Remove the key
    pub async fn clear(&self) {
        *self.key.write().await = None;
    }
}

//! Key/value persistence scopes and the bearer-token accessor.
//!
//! SYSTEM CONTEXT
//! ==============
//! The portal keeps its bearer token under a single key in two scopes: a
//! session scope that dies with the process and a durable scope that survives
//! restarts. Every reader of the token goes through [`TokenStore`] so the
//! session-first lookup order and the clear-both rule live in one place.
//!
//! ERROR HANDLING
//! ==============
//! Storage is treated as always available. Backing failures (file IO, bad
//! JSON on disk) are logged and degrade to "no value", never surfaced.

pub mod file;
pub mod memory;


use std::sync::Arc;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage key holding the bearer token in both scopes.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// A string key/value scope, modelled on browser `Storage`.
pub trait KeyValueStore: Send + Sync {
    /// Return the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str);
}

// =============================================================================
// TOKEN STORE
// =============================================================================

/// Reads, writes and clears the bearer token across both storage scopes.
#[derive(Clone)]
pub struct TokenStore {
    session: Arc<dyn KeyValueStore>,
    durable: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    #[must_use]
    pub fn new(session: Arc<dyn KeyValueStore>, durable: Arc<dyn KeyValueStore>) -> Self {
        Self { session, durable }
    }

    /// Token store backed by two fresh in-memory scopes.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Current token: the session copy wins over the durable copy.
    /// Empty strings count as absent.
    #[must_use]
    pub fn read(&self) -> Option<String> {
        non_empty(self.session.get(AUTH_TOKEN_KEY)).or_else(|| non_empty(self.durable.get(AUTH_TOKEN_KEY)))
    }

    /// Persist `token` to the durable scope.
    ///
    /// `login` is the only caller; nothing else writes the token.
    pub fn write(&self, token: &str) {
        self.durable.set(AUTH_TOKEN_KEY, token);
        tracing::debug!("auth token persisted to durable storage");
    }

    /// Remove the token from both scopes.
    pub fn clear(&self) {
        self.session.remove(AUTH_TOKEN_KEY);
        self.durable.remove(AUTH_TOKEN_KEY);
        tracing::debug!("auth token cleared from session and durable storage");
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

//! Per-entity resource stores backed by the portal API.
//!
//! DESIGN
//! ======
//! Each store owns a [`StoreCell`]: an observable [`StoreState`] snapshot plus
//! an async gate that admits one request at a time. A second `fetch` or
//! `update` issued while one is running waits for it instead of racing it, so
//! an older response can never overwrite a newer one.
//!
//! ERROR HANDLING
//! ==============
//! Failures land in `StoreState::error` and leave `data` untouched. A 401 is
//! the API client's business (it ends the session), so the store records no
//! error for it.

pub mod profile;
pub mod services;


use std::sync::RwLock;

use tokio::sync::{Mutex, MutexGuard};

use crate::net::ApiError;

pub use profile::{MemberProfile, MemberStatus, ProfileStore, ProfileUpdate};
pub use services::{Service, ServicesStore};

/// Observable state of one store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoreState<T> {
    pub data: T,
    pub loading: bool,
    /// Last failure message; empty when the last operation succeeded.
    pub error: String,
}

impl<T> StoreState<T> {
    #[must_use]
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// State plus request gate shared by the concrete stores.
#[derive(Debug, Default)]
pub struct StoreCell<T> {
    state: RwLock<StoreState<T>>,
    gate: Mutex<()>,
}

impl<T: Clone> StoreCell<T> {
    #[must_use]
    pub fn new(data: T) -> Self {
        Self { state: RwLock::new(StoreState { data, loading: false, error: String::new() }), gate: Mutex::new(()) }
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreState<T> {
        self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Wait for any in-flight request on this store to finish.
    pub async fn admit(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    /// Mark a request as started: loading on, error cleared.
    pub fn begin(&self) {
        let mut state = self.write();
        state.loading = true;
        state.error.clear();
    }

    /// Record the outcome of a request started with [`begin`](Self::begin).
    pub fn settle(&self, store: &'static str, result: Result<T, ApiError>) {
        let mut state = self.write();
        state.loading = false;
        match result {
            Ok(data) => state.data = data,
            Err(ApiError::Unauthorized) => {
                tracing::debug!(store, "request ended by 401; session teardown handled by client");
            }
            Err(e) => {
                tracing::warn!(store, error = %e, "store request failed");
                state.error = e.to_string();
            }
        }
    }

    /// Record a failure that happened before any request was sent.
    pub fn reject(&self, message: &str) {
        let mut state = self.write();
        state.loading = false;
        state.error = message.to_owned();
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreState<T>> {
        self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Accept either a bare resource or one wrapped as `{ "data": ... }`.
pub(crate) fn unwrap_envelope(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or_default(),
        other => other,
    }
}

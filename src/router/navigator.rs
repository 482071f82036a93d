//! In-app navigation: session refresh, guard evaluation, history.
//!
//! SYSTEM CONTEXT
//! ==============
//! The API client cannot navigate on its own. When it sees a 401 it sends a
//! [`NavigationSignal`] and the navigator applies it through the same guarded
//! path as any user navigation, so history stays intact.

#[cfg(test)]
#[path = "navigator_test.rs"]
mod navigator_test;

use std::sync::Arc;

use tokio::sync::mpsc;

use super::guard::{GuardDecision, guard};
use super::table::{Route, RouteTable, normalize_path};
use crate::auth::AuthState;

/// Upper bound on guard redirects followed for one navigation.
pub const MAX_REDIRECTS: usize = 8;

/// Requests pushed to the navigator from outside the routing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationSignal {
    /// The server rejected the session; go to `redirect`.
    SessionExpired { redirect: String },
}

pub type NavigationSender = mpsc::UnboundedSender<NavigationSignal>;
pub type NavigationReceiver = mpsc::UnboundedReceiver<NavigationSignal>;

/// Create the signal channel shared by the API client and the navigator.
#[must_use]
pub fn navigation_channel() -> (NavigationSender, NavigationReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("no route matches {0}")]
    NotFound(String),
    #[error("redirect loop while navigating to {0}")]
    TooManyRedirects(String),
}

/// A completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Route the user landed on.
    pub route: Route,
    /// Paths visited before landing, in order, starting with the requested one.
    pub redirected_from: Vec<String>,
}

impl Navigation {
    #[must_use]
    pub fn was_redirected(&self) -> bool {
        !self.redirected_from.is_empty()
    }
}

pub struct Navigator {
    table: RouteTable,
    auth: Arc<AuthState>,
    signals: Option<NavigationReceiver>,
    history: Vec<String>,
}

impl Navigator {
    #[must_use]
    pub fn new(table: RouteTable, auth: Arc<AuthState>) -> Self {
        Self { table, auth, signals: None, history: Vec::new() }
    }

    /// Attach the receiving end of [`navigation_channel`].
    #[must_use]
    pub fn with_signals(mut self, signals: NavigationReceiver) -> Self {
        self.signals = Some(signals);
        self
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Paths landed on so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    #[must_use]
    pub fn current(&self) -> Option<&Route> {
        self.history.last().and_then(|p| self.table.resolve(p))
    }

    /// Navigate to `path`, following guard redirects.
    ///
    /// # Errors
    ///
    /// [`NavigationError::NotFound`] when `path` (or a redirect target) has no
    /// route; [`NavigationError::TooManyRedirects`] after [`MAX_REDIRECTS`] hops.
    pub fn navigate(&mut self, path: &str) -> Result<Navigation, NavigationError> {
        let requested = normalize_path(path);
        let mut current = requested.clone();
        let mut redirected_from = Vec::new();

        for _ in 0..=MAX_REDIRECTS {
            self.auth.check_auth();
            let session = self.auth.session();
            let route = self
                .table
                .resolve(&current)
                .ok_or_else(|| NavigationError::NotFound(current.clone()))?;

            match guard(route, &session) {
                GuardDecision::Allow => {
                    let route = route.clone();
                    tracing::debug!(path = %route.path, hops = redirected_from.len(), "navigated");
                    self.history.push(route.path.clone());
                    return Ok(Navigation { route, redirected_from });
                }
                GuardDecision::Redirect(to) => {
                    tracing::debug!(from = %current, to, "guard redirect");
                    redirected_from.push(std::mem::replace(&mut current, to.to_owned()));
                }
            }
        }

        tracing::warn!(path = %requested, "redirect limit reached");
        Err(NavigationError::TooManyRedirects(requested))
    }

    /// Return to the previous history entry, re-running the guard.
    /// `None` when there is nothing to go back to.
    pub fn back(&mut self) -> Option<Result<Navigation, NavigationError>> {
        if self.history.len() < 2 {
            return None;
        }
        self.history.pop();
        let previous = self.history.pop()?;
        Some(self.navigate(&previous))
    }

    /// Apply every queued signal. Returns the outcome of the last one applied.
    pub fn apply_pending_signals(&mut self) -> Option<Result<Navigation, NavigationError>> {
        let mut pending = Vec::new();
        if let Some(rx) = self.signals.as_mut() {
            while let Ok(signal) = rx.try_recv() {
                pending.push(signal);
            }
        }

        let mut outcome = None;
        for signal in pending {
            match signal {
                NavigationSignal::SessionExpired { redirect } => {
                    tracing::info!(%redirect, "session expired; redirecting");
                    outcome = Some(self.navigate(&redirect));
                }
            }
        }
        outcome
    }
}

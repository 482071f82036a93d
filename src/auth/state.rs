//! Authentication session state for the current portal user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Shared by the navigator (which re-validates before every route change) and
//! the API client (which tears the session down on 401). One instance per
//! application session, passed around as `Arc<AuthState>`.
//!
//! DESIGN
//! ======
//! The session is a two-state enum behind a `std::sync::RwLock`. No method
//! awaits while holding the lock, so a check-then-decide sequence in the
//! navigator cannot interleave with another navigation.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use super::claims::{self, Claims, DecodeError, Role};
use crate::storage::TokenStore;

/// Current authentication session.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthSession {
    #[default]
    Unauthenticated,
    Authenticated(Claims),
}

impl AuthSession {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub fn user(&self) -> Option<&Claims> {
        match self {
            Self::Authenticated(claims) => Some(claims),
            Self::Unauthenticated => None,
        }
    }

    /// Recognized role of the authenticated user.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user().and_then(Claims::role)
    }
}

/// Errors from [`AuthState::login`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(#[from] DecodeError),
    #[error("token expired at {exp}")]
    Expired { exp: i64 },
}

/// Owner of the session and the token persistence it is derived from.
pub struct AuthState {
    tokens: TokenStore,
    session: RwLock<AuthSession>,
}

impl AuthState {
    /// Build the state and validate whatever token is already persisted.
    #[must_use]
    pub fn new(tokens: TokenStore) -> Self {
        let state = Self { tokens, session: RwLock::new(AuthSession::Unauthenticated) };
        state.check_auth();
        state
    }

    #[must_use]
    pub fn shared(tokens: TokenStore) -> Arc<Self> {
        Arc::new(Self::new(tokens))
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Re-derive the session from persisted storage. Returns whether the
    /// user is authenticated afterwards.
    pub fn check_auth(&self) -> bool {
        self.check_auth_at(now_millis())
    }

    /// [`check_auth`](Self::check_auth) with an explicit clock, in unix milliseconds.
    pub fn check_auth_at(&self, now_ms: i64) -> bool {
        let next = match self.tokens.read() {
            None => AuthSession::Unauthenticated,
            Some(token) => match validate(&token, now_ms) {
                Ok(claims) => AuthSession::Authenticated(claims),
                Err(e) => {
                    tracing::info!(error = %e, "discarding stored auth token");
                    self.tokens.clear();
                    AuthSession::Unauthenticated
                }
            },
        };
        let authenticated = next.is_authenticated();
        *self.write_session() = next;
        authenticated
    }

    /// Validate `token`, persist it, and mark the session authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the token cannot be decoded or is already
    /// expired. The session is left unauthenticated and nothing is persisted.
    pub fn login(&self, token: &str) -> Result<Claims, AuthError> {
        self.login_at(token, now_millis())
    }

    /// [`login`](Self::login) with an explicit clock, in unix milliseconds.
    ///
    /// # Errors
    ///
    /// See [`login`](Self::login).
    pub fn login_at(&self, token: &str, now_ms: i64) -> Result<Claims, AuthError> {
        let claims = match validate(token, now_ms) {
            Ok(claims) => claims,
            Err(e) => {
                *self.write_session() = AuthSession::Unauthenticated;
                tracing::warn!(error = %e, "login rejected");
                return Err(e);
            }
        };
        self.tokens.write(token);
        tracing::info!(role = claims.role_name().unwrap_or("unknown"), "logged in");
        *self.write_session() = AuthSession::Authenticated(claims.clone());
        Ok(claims)
    }

    /// Drop the session and remove the token from both storage scopes.
    pub fn logout(&self) {
        *self.write_session() = AuthSession::Unauthenticated;
        self.tokens.clear();
        tracing::info!("logged out");
    }

    /// Snapshot of the session as of the last transition.
    #[must_use]
    pub fn session(&self) -> AuthSession {
        self.session.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.read().unwrap_or_else(std::sync::PoisonError::into_inner).is_authenticated()
    }

    #[must_use]
    pub fn user(&self) -> Option<Claims> {
        self.session().user().cloned()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.session.read().unwrap_or_else(std::sync::PoisonError::into_inner).role()
    }

    /// Landing route for the current user, if their role is recognized.
    #[must_use]
    pub fn home_path(&self) -> Option<&'static str> {
        self.role().map(Role::home_path)
    }

    fn write_session(&self) -> std::sync::RwLockWriteGuard<'_, AuthSession> {
        self.session.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn validate(token: &str, now_ms: i64) -> Result<Claims, AuthError> {
    let claims = claims::decode(token)?;
    if claims.is_expired_at(now_ms) {
        // is_expired_at only returns true when exp is present
        return Err(AuthError::Expired { exp: claims.exp().unwrap_or_default() });
    }
    Ok(claims)
}

/// Wall clock in unix milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

//! Pre-navigation access policy.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`guard`] is a pure decision over a target route and a session snapshot.
//! The [`Navigator`](super::Navigator) refreshes the session with
//! `check_auth` before calling it, so an expired token never reaches here as
//! authenticated.
//!
//! Rules, first match wins:
//! 1. `/` sends users to their role home, everyone else to member login.
//! 2. Guest-only pages bounce authenticated users with a known role home.
//! 3. Auth-required pages send anonymous users to the matching portal login.
//! 4. Role-restricted pages send other roles to their own home.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use super::table::Route;
use crate::auth::{AuthSession, Role};

/// Where unauthenticated or unrecognized users end up by default.
pub const MEMBER_LOGIN_PATH: &str = "/member/login";

/// Outcome of evaluating the guard for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

impl GuardDecision {
    #[must_use]
    pub fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decide whether `session` may enter `target`.
#[must_use]
pub fn guard(target: &Route, session: &AuthSession) -> GuardDecision {
    let role = session.role();

    if target.is_root() {
        return GuardDecision::Redirect(role.map_or(MEMBER_LOGIN_PATH, Role::home_path));
    }

    if target.meta.guest_only
        && let Some(role) = role
    {
        return GuardDecision::Redirect(role.home_path());
    }

    if target.meta.requires_auth && !session.is_authenticated() {
        return GuardDecision::Redirect(login_path_for(target));
    }

    if let Some(required) = target.meta.role {
        return match role {
            Some(actual) if actual == required => GuardDecision::Allow,
            Some(actual) => GuardDecision::Redirect(actual.home_path()),
            None => GuardDecision::Redirect(MEMBER_LOGIN_PATH),
        };
    }

    GuardDecision::Allow
}

/// Login page of the portal that owns `target`.
fn login_path_for(target: &Route) -> &'static str {
    match target.meta.role {
        Some(role) => role.login_path(),
        None => MEMBER_LOGIN_PATH,
    }
}

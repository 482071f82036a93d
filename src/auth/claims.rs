//! Bearer-token payload decoding and portal roles.
//!
//! TRADE-OFFS
//! ==========
//! Decoding establishes shape, not trust: the signature segment is never
//! checked. The server re-validates every API call, so a forged payload only
//! changes which screens the client is willing to show. Verifying against the
//! issuer's public key would close that gap.

#[cfg(test)]
#[path = "claims_test.rs"]
mod claims_test;

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Standard alphabet, padding optional. URL-safe input is mapped onto it first.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

// =============================================================================
// ROLE
// =============================================================================

/// Portal role carried in the `role` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Office staff managing services, applications and appointments.
    Admin,
    /// Registered PWD applicant.
    Member,
}

impl Role {
    /// Landing route for an authenticated user of this role.
    #[must_use]
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Member => "/member",
        }
    }

    /// Login route for this role's portal.
    #[must_use]
    pub fn login_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin/login",
            Role::Member => "/member/login",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `role` claim naming neither portal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

// =============================================================================
// CLAIMS
// =============================================================================

/// Claim set decoded from a token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    #[must_use]
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Raw `role` claim, recognized or not.
    #[must_use]
    pub fn role_name(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    /// Recognized role, or `None` when the claim is missing or unknown.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role_name().and_then(|r| r.parse().ok())
    }

    /// Expiry in unix seconds. Fractional values are truncated.
    #[must_use]
    pub fn exp(&self) -> Option<i64> {
        self.0.get("exp").and_then(numeric_seconds)
    }

    /// Subject claim, when the issuer sets one.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// Expiry in unix milliseconds, keeping any fractional second.
    #[must_use]
    pub fn exp_millis(&self) -> Option<i64> {
        self.0.get("exp").and_then(numeric_millis)
    }

    /// True when `exp` is present and `exp * 1000 < now_ms`.
    #[must_use]
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.exp_millis().is_some_and(|exp_ms| exp_ms < now_ms)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn numeric_seconds(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(int) = number.as_i64() {
        return Some(int);
    }
    number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)
}

/// `value * 1000`, floored. For an integer `now_ms`, `floor(x) < now_ms`
/// holds exactly when `x < now_ms`, so the expiry boundary does not move.
#[allow(clippy::cast_possible_truncation)]
fn numeric_millis(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(int) = number.as_i64() {
        return Some(int.saturating_mul(1000));
    }
    number.as_f64().filter(|f| f.is_finite()).map(|f| (f * 1000.0).floor() as i64)
}

// =============================================================================
// DECODE
// =============================================================================

/// Why a token could not be turned into [`Claims`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("token has no payload segment")]
    MissingPayload,
    #[error("payload is not valid base64: {0}")]
    Base64(String),
    #[error("payload is not valid JSON: {0}")]
    Json(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("exp claim is not a number")]
    InvalidExp,
}

/// Decode the payload segment of `token` without verifying its signature.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the token has fewer than two segments, the
/// payload is not base64, or the decoded bytes are not a JSON object with a
/// numeric (or absent/null) `exp`.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let payload = token.split('.').nth(1).ok_or(DecodeError::MissingPayload)?;
    let normalized = payload.replace('-', "+").replace('_', "/");
    let bytes = PAYLOAD_ENGINE
        .decode(normalized.trim_end_matches('='))
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| DecodeError::Json(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(DecodeError::NotAnObject);
    };
    match map.get("exp") {
        None | Some(Value::Null) => {}
        Some(exp) if numeric_seconds(exp).is_some() => {}
        Some(_) => return Err(DecodeError::InvalidExp),
    }
    Ok(Claims(map))
}

/// Build an unsigned `header.payload.sig` token around `payload`.
#[cfg(test)]
pub(crate) fn unsigned_token(payload: &Value) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = engine.encode(payload.to_string());
    format!("{header}.{body}.sig")
}

//! API client errors.

use super::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered 401. The session has already been torn down.
    #[error("session is no longer valid; sign in again")]
    Unauthorized,

    /// Any other non-success status, passed through unmodified.
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A success response whose body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("request body encode failed: {0}")]
    Encode(String),
}

impl ApiError {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Status error with the best message available from `body`.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = server_message(body).unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("request failed")
                .to_owned()
        });
        Self::Status { status, message }
    }
}

/// `message` or `error` string field of a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(ToOwned::to_owned)
}

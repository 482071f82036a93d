//! Authenticated JSON client for the portal API.
//!
//! ERROR HANDLING
//! ==============
//! A 401 means the session is gone. The client logs the user out (clearing
//! both token scopes), signals the navigator to show the member login, and
//! returns [`ApiError::Unauthorized`]. It never retries. Every other status
//! is handed back to the caller as [`ApiError::Status`].

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::transport::{HttpRequest, HttpTransport, Method, ReqwestTransport};
use crate::auth::AuthState;
use crate::config::PortalConfig;
use crate::router::{MEMBER_LOGIN_PATH, NavigationSender, NavigationSignal};

const UNAUTHORIZED: u16 = 401;

pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    auth: Arc<AuthState>,
    signals: Option<NavigationSender>,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>, auth: Arc<AuthState>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { base_url, transport, auth, signals: None }
    }

    /// Client over reqwest, configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &PortalConfig, auth: Arc<AuthState>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.timeouts)?;
        Ok(Self::new(config.api_base_url.clone(), Arc::new(transport), auth))
    }

    /// Route 401 reactions to a navigator.
    #[must_use]
    pub fn with_signals(mut self, signals: NavigationSender) -> Self {
        self.signals = Some(signals);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<AuthState> {
        &self.auth
    }

    /// `GET path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send); also [`ApiError::Decode`] on an unexpected body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.send(Method::Get, path, None).await?;
        decode_body(&body)
    }

    /// `PUT path` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode_body(body)?;
        let text = self.send(Method::Put, path, Some(body)).await?;
        decode_body(&text)
    }

    /// `POST path` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode_body(body)?;
        let text = self.send(Method::Post, path, Some(body)).await?;
        decode_body(&text)
    }

    /// `DELETE path`, ignoring any response body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::Delete, path, None).await.map(|_| ())
    }

    /// Send one request and return the success body.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] on 401 (after tearing the session down),
    /// [`ApiError::Status`] on other non-2xx statuses, and
    /// [`ApiError::Transport`] when no response arrived.
    pub async fn send(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> Result<String, ApiError> {
        let request = self.build_request(method, path, body);
        tracing::debug!(method = method.as_str(), url = %request.url, "api request");

        let response = self.transport.send(request).await?;

        if response.status == UNAUTHORIZED {
            self.handle_unauthorized(path);
            return Err(ApiError::Unauthorized);
        }
        if !(200..300).contains(&response.status) {
            tracing::warn!(method = method.as_str(), path, status = response.status, "api error response");
            return Err(ApiError::from_status(response.status, &response.body));
        }
        Ok(response.body)
    }

    fn build_request(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> HttpRequest {
        let mut headers = vec![
            ("Content-Type".to_owned(), "application/json".to_owned()),
            ("Accept".to_owned(), "application/json".to_owned()),
        ];
        if let Some(token) = self.auth.tokens().read() {
            headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
        }
        HttpRequest { method, url: self.url(path), headers, body }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    fn handle_unauthorized(&self, path: &str) {
        tracing::warn!(path, "api returned 401; ending session");
        self.auth.logout();
        if let Some(signals) = &self.signals {
            let signal = NavigationSignal::SessionExpired { redirect: MEMBER_LOGIN_PATH.to_owned() };
            if signals.send(signal).is_err() {
                tracing::debug!("navigator gone; 401 redirect dropped");
            }
        }
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))
}

fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

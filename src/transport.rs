//! Transport abstraction for the lobby API.
//!
//! The [`Transport`] trait is a single request → response primitive. It knows
//! nothing about the lobby's rules: it returns `Ok` for *every* HTTP status the
//! server answers with and `Err` only when no answer arrived at all. Turning a
//! status into a domain error is [`classify`](crate::classify::classify)'s job.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use card_lobby_client::transport::{ApiRequest, ApiResponse, Transport, TransportError};
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
//!         // Send `request` to the server and hand back whatever it answered.
//!         Ok(ApiResponse::new(200, "[]"))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::classify::TransportOutcome;
use crate::error::LobbyError;
use crate::protocol::Method;

/// Why a request got no answer from the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection refused, reset, DNS or TLS failure, ...
    #[error("request failed: {0}")]
    Failed(String),
    /// The transport's own deadline elapsed.
    #[error("request timed out")]
    TimedOut,
}

impl From<TransportError> for TransportOutcome {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Failed(cause) => Self::Failed(cause),
            TransportError::TimedOut => Self::TimedOut,
        }
    }
}

/// One outgoing API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the server root, e.g. `/api/games/7`.
    pub path: String,
    /// JSON body, if the call has one.
    pub body: Option<serde_json::Value>,
    /// Bearer credential to attach, if the session has one.
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_bearer(mut self, bearer: Option<String>) -> Self {
        self.bearer = bearer;
        self
    }

    /// Decode the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::Serialization`] if there is no body or it does not match `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, LobbyError> {
        let body = self.body.clone().unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(body)?)
    }
}

/// The server's answer: status plus raw body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A response whose body is `value` serialized as JSON.
    pub fn json(status: u16, value: &impl serde::Serialize) -> Self {
        // Serializing plain data structures into a `String` cannot fail.
        let body = serde_json::to_string(value).unwrap_or_default();
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A request/response transport to the lobby server.
///
/// # Object Safety
///
/// This trait is object-safe; the client stores it as `Arc<dyn Transport>` so
/// one connection pool serves every component.
///
/// # Concurrency
///
/// `execute` takes `&self` and may be called from several tasks at once.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Perform one request.
    ///
    /// Returns:
    /// - `Ok(response)`: the server answered, whatever the status
    /// - `Err(TransportError::Failed(_))`: no answer (connection refused, reset, ...)
    /// - `Err(TransportError::TimedOut)`: the transport's own deadline elapsed
    ///
    /// # Errors
    ///
    /// See above. Implementations must not map HTTP statuses to errors.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

//! HTTP transport implementation using `reqwest`.
//!
//! [`HttpTransport`] sends each [`ApiRequest`] to `base_url + path`, attaching
//! the credential both as an `Authorization: Bearer` header and as the `token`
//! cookie the lobby server reads.
//!
//! # Feature gate
//!
//! This module is only available when the `transport-http` feature is enabled
//! (it is enabled by default).

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, COOKIE};

use crate::client::LobbyConfig;
use crate::protocol::Method;
use crate::session::DEFAULT_SLOT;
use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};

/// A [`Transport`] backed by a pooled `reqwest` client.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for `base_url` (e.g. `http://localhost:8080`).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Failed`] if the HTTP client cannot be
    /// initialized (e.g. the TLS backend fails to load).
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Failed(e.to_string()))?;
        Ok(Self::with_client(base_url, client))
    }

    /// Build a transport from a [`LobbyConfig`], applying its user agent.
    ///
    /// The request timeout is enforced by the client pipeline, not here.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn from_config(config: &LobbyConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Failed(e.to_string()))?;
        Ok(Self::with_client(&config.base_url, client))
    }

    /// Wrap an existing `reqwest` client (custom TLS, proxies, ...).
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };

        if let Some(token) = request.bearer.as_deref() {
            let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| TransportError::Failed(format!("credential is not a valid header: {e}")))?;
            let cookie = HeaderValue::from_str(&format!("{DEFAULT_SLOT}={token}"))
                .map_err(|e| TransportError::Failed(format!("credential is not a valid cookie: {e}")))?;
            builder = builder.header(AUTHORIZATION, bearer).header(COOKIE, cookie);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        tracing::debug!(url = %url, status, "http response");
        Ok(ApiResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::TimedOut
    } else {
        TransportError::Failed(e.to_string())
    }
}

#[cfg(test)]
#[cfg(feature = "transport-http")]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    #[test]
    fn http_transport_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpTransport>();
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let t = HttpTransport::new("http://localhost:8080/").unwrap();
        assert_eq!(t.base_url(), "http://localhost:8080");
        assert_eq!(t.url("/api/games"), "http://localhost:8080/api/games");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_failure() {
        let t = HttpTransport::new("http://127.0.0.1:1").unwrap();
        let err = t
            .execute(ApiRequest::new(Method::Get, "/api/games"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Failed(_)));
    }

    /// Serve exactly one request with a canned raw HTTP response and hand the
    /// raw request text back through the returned receiver.
    async fn one_shot_server(response: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let declared = text
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + declared {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&buf).to_string());
        });

        (format!("http://{addr}"), rx)
    }

    #[tokio::test]
    async fn error_status_is_returned_not_raised() {
        let (url, _rx) = one_shot_server(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 14\r\nConnection: close\r\n\r\nGame not found",
        )
        .await;
        let t = HttpTransport::new(&url).unwrap();
        let response = t
            .execute(ApiRequest::new(Method::Get, "/api/games/99"))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body, "Game not found");
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn credential_sent_as_bearer_and_cookie() {
        let (url, rx) = one_shot_server(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 31\r\nConnection: close\r\n\r\n{\"message\":\"Joined successful\"}",
        )
        .await;
        let t = HttpTransport::new(&url).unwrap();
        let request = ApiRequest::new(Method::Post, "/api/games/join")
            .with_body(serde_json::json!({ "game_id": 7 }))
            .with_bearer(Some("abc.def.ghi".into()));
        let response = t.execute(request).await.unwrap();
        assert_eq!(response.status, 200);

        let raw = rx.await.unwrap();
        let lower = raw.to_ascii_lowercase();
        assert!(raw.starts_with("POST /api/games/join"));
        assert!(lower.contains("authorization: bearer abc.def.ghi"));
        assert!(lower.contains("cookie: token=abc.def.ghi"));
        assert!(raw.contains(r#"{"game_id":7}"#));
    }
}

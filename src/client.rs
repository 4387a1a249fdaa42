//! Lobby client entry point and the shared request pipeline.
//!
//! [`LobbyClient`] is a cheap, cloneable handle that bundles a [`Transport`],
//! an injected [`SessionStore`] and the [`LobbyConfig`]. It hands out the three
//! API-facing components, which all funnel their calls through one pipeline:
//!
//! 1. mutating calls claim an in-flight permit for `(action, target)`
//! 2. the session's credential is attached, if there is one
//! 3. the request runs under the configured timeout
//! 4. non-success answers are classified into a typed [`LobbyError`]
//!
//! Nothing is retried and nothing is cached between calls.
//!
//! # Example
//!
//! ```rust,ignore
//! let session = Arc::new(SessionStore::init(FileStorage::new(dir, "token"))?);
//! let client = LobbyClient::connect(LobbyConfig::new("http://localhost:8080"), session)?;
//!
//! client.account().login("alice", "hunter2").await?;
//! let id = client.catalog().create_game("Duel").await?;
//! let view = client.games().get_detail(id).await?;
//! assert!(view.is_creator);
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::account::AccountClient;
use crate::catalog::GameCatalogClient;
use crate::classify::{classify, Action, TransportOutcome};
use crate::controller::GameSessionController;
use crate::error::{LobbyError, Result};
use crate::inflight::{InFlightGuard, InFlightTarget};
use crate::protocol::MessageResponse;
use crate::session::SessionStore;
use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};

/// Server the client talks to when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Players a game needs before the server lets its creator start it.
pub const DEFAULT_MIN_PLAYERS_TO_START: usize = 4;

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`LobbyClient`].
///
/// # Example
///
/// ```
/// use card_lobby_client::client::LobbyConfig;
/// use std::time::Duration;
///
/// let config = LobbyConfig::new("http://localhost:8080")
///     .with_request_timeout(Some(Duration::from_secs(3)));
/// assert_eq!(config.request_timeout, Some(Duration::from_secs(3)));
/// assert_eq!(config.min_players_to_start, 4);
/// ```
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Root URL of the lobby server, without a trailing slash.
    pub base_url: String,
    /// Upper bound on a single request. `None` waits indefinitely.
    ///
    /// Defaults to **10 seconds**.
    pub request_timeout: Option<Duration>,
    /// Player count below which a `start` is expected to fail.
    ///
    /// Only used for diagnostics; the server decides. Defaults to **4**.
    pub min_players_to_start: usize,
    /// `User-Agent` sent by the HTTP transport.
    pub user_agent: String,
}

impl LobbyConfig {
    /// Create a configuration for `base_url` with default values.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            min_players_to_start: DEFAULT_MIN_PLAYERS_TO_START,
            user_agent: concat!("card-lobby-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Uses `LOBBY_BASE_URL` and `LOBBY_REQUEST_TIMEOUT_SECS` (`0` disables
    /// the timeout), falling back to defaults if unset or unparsable.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("LOBBY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(base_url);
        if let Some(secs) = std::env::var("LOBBY_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config
    }

    /// Set the per-request timeout. `None` disables it.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the expected minimum player count for `start`.
    #[must_use]
    pub fn with_min_players_to_start(mut self, min_players: usize) -> Self {
        self.min_players_to_start = min_players;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

// ── Request pipeline ────────────────────────────────────────────────

/// The pipeline every component sends its requests through.
#[derive(Clone)]
pub(crate) struct Api {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    inflight: InFlightGuard,
    config: Arc<LobbyConfig>,
}

impl Api {
    pub(crate) fn session(&self) -> &SessionStore {
        &self.session
    }

    pub(crate) fn config(&self) -> &LobbyConfig {
        &self.config
    }

    /// The stored credential, or an authentication error without any I/O.
    pub(crate) fn require_credential(&self, action: Action) -> Result<String> {
        self.session
            .credential()
            .ok_or_else(|| LobbyError::not_logged_in(action))
    }

    /// Run `request` and return the successful response.
    pub(crate) async fn send(
        &self,
        action: Action,
        target: InFlightTarget,
        request: ApiRequest,
    ) -> Result<ApiResponse> {
        let _permit = if action.is_mutating() {
            Some(self.inflight.acquire(action, target)?)
        } else {
            None
        };

        let request = request.with_bearer(self.session.credential());
        let request_id = Uuid::new_v4();
        debug!(
            %request_id,
            %action,
            method = request.method.as_str(),
            path = %request.path,
            authenticated = request.bearer.is_some(),
            "sending request"
        );

        let outcome = match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.execute(request))
                .await
                .unwrap_or(Err(TransportError::TimedOut)),
            None => self.transport.execute(request).await,
        };

        let failure = match outcome {
            Ok(response) if response.is_success() => {
                debug!(%request_id, status = response.status, "request succeeded");
                return Ok(response);
            }
            Ok(response) => TransportOutcome::Status {
                status: response.status,
                body: response.body,
            },
            Err(e) => e.into(),
        };

        let err = classify(action, failure);
        warn!(%request_id, %action, kind = %err.kind(), "request failed: {err}");
        Err(err)
    }

    /// Run `request` and decode the successful body as JSON.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        action: Action,
        target: InFlightTarget,
        request: ApiRequest,
    ) -> Result<T> {
        let response = self.send(action, target, request).await?;
        serde_json::from_str(&response.body).map_err(|e| {
            warn!(%action, "undecodable response body: {e}");
            LobbyError::Serialization(e)
        })
    }

    /// Run `request` and read the `{ "message": ... }` acknowledgement.
    ///
    /// Plain-text and empty bodies are accepted as the message itself.
    pub(crate) async fn send_message(
        &self,
        action: Action,
        target: InFlightTarget,
        request: ApiRequest,
    ) -> Result<String> {
        let response = self.send(action, target, request).await?;
        let message = serde_json::from_str::<MessageResponse>(&response.body)
            .map(|m| m.message)
            .unwrap_or_else(|_| response.body.trim().to_string());
        Ok(message)
    }
}

// ── Client handle ───────────────────────────────────────────────────

/// Handle to the lobby server.
///
/// Clones share the transport, the session and the in-flight registry.
#[derive(Clone)]
pub struct LobbyClient {
    api: Api,
}

impl LobbyClient {
    /// Create a client over any [`Transport`].
    ///
    /// The [`SessionStore`] is injected so the caller owns its lifecycle and
    /// can share it with other clients.
    pub fn new(
        transport: impl Transport,
        session: Arc<SessionStore>,
        config: LobbyConfig,
    ) -> Self {
        Self {
            api: Api {
                transport: Arc::new(transport),
                session,
                inflight: InFlightGuard::new(),
                config: Arc::new(config),
            },
        }
    }

    /// Create a client over an [`HttpTransport`](crate::HttpTransport) built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Failed`] if the HTTP client cannot be built.
    #[cfg(feature = "transport-http")]
    pub fn connect(
        config: LobbyConfig,
        session: Arc<SessionStore>,
    ) -> std::result::Result<Self, TransportError> {
        let transport = crate::transports::HttpTransport::from_config(&config)?;
        Ok(Self::new(transport, session, config))
    }

    /// Login, registration and the current user's profile.
    pub fn account(&self) -> AccountClient {
        AccountClient::new(self.api.clone())
    }

    /// Listing and creating games.
    pub fn catalog(&self) -> GameCatalogClient {
        GameCatalogClient::new(self.api.clone())
    }

    /// Detail, join, start and delete for individual games.
    pub fn games(&self) -> GameSessionController {
        GameSessionController::new(self.api.clone())
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.api.session
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.api.config
    }

    /// Whether a mutating `action` on `target` is currently outstanding.
    pub fn is_in_flight(&self, action: Action, target: &InFlightTarget) -> bool {
        self.api.inflight.is_active(action, target)
    }
}

impl std::fmt::Debug for LobbyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LobbyClient")
            .field("base_url", &self.api.config.base_url)
            .field("authenticated", &self.api.session.is_authenticated())
            .finish()
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
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
    use crate::error::ErrorKind;
    use crate::protocol::Method;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    // ── Mock transport ──────────────────────────────────────────────

    /// Replays scripted responses and records every request.
    struct MockTransport {
        responses: StdMutex<VecDeque<std::result::Result<ApiResponse, TransportError>>>,
        sent: Arc<StdMutex<Vec<ApiRequest>>>,
    }

    impl MockTransport {
        fn new(
            responses: Vec<std::result::Result<ApiResponse, TransportError>>,
        ) -> (Self, Arc<StdMutex<Vec<ApiRequest>>>) {
            let sent = Arc::new(StdMutex::new(Vec::new()));
            let transport = Self {
                responses: StdMutex::new(VecDeque::from(responses)),
                sent: Arc::clone(&sent),
            };
            (transport, sent)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn execute(
            &self,
            request: ApiRequest,
        ) -> std::result::Result<ApiResponse, TransportError> {
            self.sent.lock().unwrap().push(request);
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(response) => response,
                // Nothing scripted: hang so timeouts can be exercised.
                None => std::future::pending().await,
            }
        }
    }

    fn client_with(
        responses: Vec<std::result::Result<ApiResponse, TransportError>>,
        config: LobbyConfig,
    ) -> (LobbyClient, Arc<StdMutex<Vec<ApiRequest>>>) {
        let (transport, sent) = MockTransport::new(responses);
        let client = LobbyClient::new(transport, Arc::new(SessionStore::in_memory()), config);
        (client, sent)
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[test]
    fn config_defaults() {
        let config = LobbyConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Some(DEFAULT_REQUEST_TIMEOUT));
        assert_eq!(config.min_players_to_start, 4);
        assert!(config.user_agent.starts_with("card-lobby-client/"));
    }

    #[test]
    fn config_builder_methods() {
        let config = LobbyConfig::new("http://example.test/")
            .with_request_timeout(None)
            .with_min_players_to_start(5)
            .with_user_agent("tests");
        assert_eq!(config.base_url, "http://example.test");
        assert!(config.request_timeout.is_none());
        assert_eq!(config.min_players_to_start, 5);
        assert_eq!(config.user_agent, "tests");
    }

    #[tokio::test]
    async fn bearer_attached_only_when_logged_in() {
        let (client, sent) = client_with(
            vec![
                Ok(ApiResponse::new(200, "[]")),
                Ok(ApiResponse::new(200, "[]")),
            ],
            LobbyConfig::default(),
        );
        let request = ApiRequest::new(Method::Get, "/api/games");

        client
            .api
            .send(Action::ListGames, InFlightTarget::Unscoped, request.clone())
            .await
            .unwrap();
        client.session().set_credential(Some("a.b.c")).unwrap();
        client
            .api
            .send(Action::ListGames, InFlightTarget::Unscoped, request)
            .await
            .unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].bearer, None);
        assert_eq!(sent[1].bearer.as_deref(), Some("a.b.c"));
    }

    #[tokio::test]
    async fn error_status_is_classified() {
        let (client, _sent) = client_with(
            vec![Ok(ApiResponse::new(403, "Creator cannot join their own game"))],
            LobbyConfig::default(),
        );
        let err = client
            .api
            .send(
                Action::Join,
                InFlightTarget::Game(1),
                ApiRequest::new(Method::Post, "/api/games/join"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(
            err.server_detail(),
            Some("Creator cannot join their own game")
        );
    }

    #[tokio::test]
    async fn network_failure_is_transport_error() {
        let (client, _sent) = client_with(
            vec![Err(TransportError::Failed("connection refused".into()))],
            LobbyConfig::default(),
        );
        let err = client
            .api
            .send(
                Action::GameDetail,
                InFlightTarget::Game(1),
                ApiRequest::new(Method::Get, "/api/games/1"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn configured_timeout_fires() {
        let (client, _sent) = client_with(
            vec![],
            LobbyConfig::default().with_request_timeout(Some(Duration::from_millis(50))),
        );
        let err = client
            .api
            .send(
                Action::Start,
                InFlightTarget::Game(3),
                ApiRequest::new(Method::Post, "/api/games/3/start"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LobbyError::Timeout { action: Action::Start }));
        // Permit released after the timeout.
        assert!(!client.is_in_flight(Action::Start, &InFlightTarget::Game(3)));
    }

    #[tokio::test]
    async fn undecodable_body_is_serialization_error() {
        let (client, _sent) = client_with(
            vec![Ok(ApiResponse::new(200, "<html>"))],
            LobbyConfig::default(),
        );
        let err = client
            .api
            .send_json::<Vec<crate::protocol::GameSummary>>(
                Action::ListGames,
                InFlightTarget::Unscoped,
                ApiRequest::new(Method::Get, "/api/games"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LobbyError::Serialization(_)));
    }

    #[tokio::test]
    async fn plain_text_acknowledgement_is_accepted() {
        let (client, _sent) = client_with(
            vec![Ok(ApiResponse::new(200, "Game started\n"))],
            LobbyConfig::default(),
        );
        let message = client
            .api
            .send_message(
                Action::Start,
                InFlightTarget::Game(1),
                ApiRequest::new(Method::Post, "/api/games/1/start"),
            )
            .await
            .unwrap();
        assert_eq!(message, "Game started");
    }

    #[tokio::test]
    async fn debug_impl_for_client() {
        let (client, _sent) = client_with(vec![], LobbyConfig::default());
        let printed = format!("{client:?}");
        assert!(printed.contains("LobbyClient"));
        assert!(printed.contains("authenticated: false"));
    }
}

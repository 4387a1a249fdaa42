//! Listing and creating games.

use tracing::{info, warn};

use crate::classify::Action;
use crate::client::Api;
use crate::error::{LobbyError, Result};
use crate::inflight::InFlightTarget;
use crate::protocol::{paths, CreateGameRequest, CreatedGame, GameId, GameSummary, Method};
use crate::transport::ApiRequest;

/// Result of [`GameCatalogClient::list_games`].
///
/// A failed listing still yields a (empty) game list, paired with the
/// classified error; the caller decides which of the two to show.
#[derive(Debug)]
pub struct GameListing {
    pub games: Vec<GameSummary>,
    pub error: Option<LobbyError>,
}

impl GameListing {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Collapse into a plain `Result`, discarding the empty list on failure.
    ///
    /// # Errors
    ///
    /// Returns the classified listing error, if there was one.
    pub fn into_result(self) -> Result<Vec<GameSummary>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.games),
        }
    }
}

/// The game catalog. Obtain one with [`LobbyClient::catalog`](crate::LobbyClient::catalog).
#[derive(Clone)]
pub struct GameCatalogClient {
    api: Api,
}

impl GameCatalogClient {
    pub(crate) fn new(api: Api) -> Self {
        Self { api }
    }

    /// Fetch every game the server lists. Allowed while logged out.
    pub async fn list_games(&self) -> GameListing {
        let request = ApiRequest::new(Method::Get, paths::GAMES);
        // The server sends `null` rather than `[]` when there are no games.
        match self
            .api
            .send_json::<Option<Vec<GameSummary>>>(
                Action::ListGames,
                InFlightTarget::Unscoped,
                request,
            )
            .await
        {
            Ok(games) => GameListing {
                games: games.unwrap_or_default(),
                error: None,
            },
            Err(err) => {
                warn!("game listing unavailable: {err}");
                GameListing {
                    games: Vec::new(),
                    error: Some(err),
                }
            }
        }
    }

    /// Create a game named `name` owned by the logged-in user.
    ///
    /// The returned id can be passed straight to
    /// [`GameSessionController`](crate::GameSessionController).
    ///
    /// # Errors
    ///
    /// - [`LobbyError::Authentication`] immediately, without a request, when logged out
    /// - [`LobbyError::Validation`] immediately when `name` is blank
    pub async fn create_game(&self, name: &str) -> Result<GameId> {
        self.api.require_credential(Action::CreateGame)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(LobbyError::invalid(Action::CreateGame));
        }

        let body = serde_json::to_value(CreateGameRequest {
            game_name: name.to_string(),
        })?;
        let request = ApiRequest::new(Method::Post, paths::NEW_GAME).with_body(body);
        // Two creates collapse only when they ask for the same name.
        let target = InFlightTarget::Name(name.to_string());
        let created: CreatedGame = self
            .api
            .send_json(Action::CreateGame, target, request)
            .await?;

        info!(game = created.id, name, "game created");
        Ok(created.id)
    }
}

impl std::fmt::Debug for GameCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameCatalogClient").finish_non_exhaustive()
    }
}

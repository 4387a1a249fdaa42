//! Game lifecycle: detail, join, start and delete.
//!
//! Games move `pending → in-progress → finished`, and only the server moves
//! them. The controller requests a transition and interprets the answer; it
//! never patches a [`GameDetail`] locally. After any successful mutating call,
//! fetch the detail again with [`GameSessionController::get_detail`].
//!
//! Concurrent joins are settled by the server. The loser of a join race gets a
//! [`LobbyError::Conflict`], which [`GameSessionController::join_idempotent`]
//! folds into [`JoinOutcome::AlreadyJoined`]. A second join from the same
//! client while the first is outstanding becomes [`JoinOutcome::Pending`].

use tracing::{info, warn};

use crate::classify::Action;
use crate::client::Api;
use crate::error::{ErrorKind, LobbyError, Result};
use crate::inflight::InFlightTarget;
use crate::protocol::{paths, GameDetail, GameId, JoinGameRequest, Method};
use crate::transport::ApiRequest;

/// A point-in-time copy of a game, plus what it means for the current user.
///
/// `is_joined` and `is_creator` come from the credential's *unverified*
/// subject id. Use them to decide what to show, never to decide what is
/// allowed; the server re-checks every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    pub detail: GameDetail,
    /// The current user holds a seat in this game.
    pub is_joined: bool,
    /// The current user created this game.
    pub is_creator: bool,
}

impl GameView {
    fn new(detail: GameDetail, subject: Option<i64>) -> Self {
        let is_joined = subject.is_some_and(|id| detail.has_player(id));
        let is_creator = subject == Some(detail.creator_id());
        Self {
            detail,
            is_joined,
            is_creator,
        }
    }

    /// Whether the UI should offer a "join" action.
    pub fn can_offer_join(&self) -> bool {
        !self.is_creator && !self.is_joined && self.detail.status().accepts_players()
    }
}

/// The result of a join attempt that treats "already joined" as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// This call added the user to the game.
    Joined { message: String },
    /// The user was already a member; another request got there first.
    AlreadyJoined { message: String },
    /// An identical join from this client is still outstanding. Its result
    /// is not known yet; refetch the detail once it settles.
    Pending { message: String },
}

impl JoinOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Joined { message }
            | Self::AlreadyJoined { message }
            | Self::Pending { message } => message,
        }
    }
}

/// Per-game lifecycle operations. Obtain one with
/// [`LobbyClient::games`](crate::LobbyClient::games).
#[derive(Clone)]
pub struct GameSessionController {
    api: Api,
}

impl GameSessionController {
    pub(crate) fn new(api: Api) -> Self {
        Self { api }
    }

    /// Fetch a fresh copy of game `id`.
    ///
    /// # Errors
    ///
    /// - [`LobbyError::NotFound`] if the game does not exist
    /// - [`LobbyError::Authentication`] if the server requires a login
    pub async fn get_detail(&self, id: GameId) -> Result<GameView> {
        let detail: GameDetail = self
            .api
            .send_json(
                Action::GameDetail,
                InFlightTarget::Game(id),
                ApiRequest::new(Method::Get, paths::game(id)),
            )
            .await?;
        Ok(GameView::new(detail, self.api.session().identity()))
    }

    /// Ask to join game `id` and return the server's message.
    ///
    /// # Errors
    ///
    /// - [`LobbyError::Authentication`] immediately when logged out
    /// - [`LobbyError::NotFound`] if the game does not exist
    /// - [`LobbyError::Authorization`] if the user created the game, or the
    ///   server no longer admits players
    /// - [`LobbyError::Conflict`] if the user is already a member
    /// - [`LobbyError::InFlight`] if this join is already outstanding
    pub async fn join(&self, id: GameId) -> Result<String> {
        self.api.require_credential(Action::Join)?;
        let body = serde_json::to_value(JoinGameRequest { game_id: id })?;
        let message = self
            .api
            .send_message(
                Action::Join,
                InFlightTarget::Game(id),
                ApiRequest::new(Method::Post, paths::JOIN_GAME).with_body(body),
            )
            .await?;
        info!(game = id, "joined game");
        Ok(message)
    }

    /// Like [`join`](Self::join), but a lost join race or a repeated click
    /// is not a failure.
    ///
    /// # Errors
    ///
    /// Every error [`join`](Self::join) returns except [`LobbyError::Conflict`]
    /// and [`LobbyError::InFlight`].
    pub async fn join_idempotent(&self, id: GameId) -> Result<JoinOutcome> {
        match self.join(id).await {
            Ok(message) => Ok(JoinOutcome::Joined { message }),
            Err(err) if err.is_conflict() => {
                info!(game = id, "already a member");
                Ok(JoinOutcome::AlreadyJoined {
                    message: err.user_message(),
                })
            }
            Err(err @ LobbyError::InFlight { .. }) => {
                info!(game = id, "join already in flight");
                Ok(JoinOutcome::Pending {
                    message: err.user_message(),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Ask the server to start game `id`.
    ///
    /// On success every player has a role and a character in the next
    /// [`get_detail`](Self::get_detail).
    ///
    /// # Errors
    ///
    /// - [`LobbyError::Authentication`] immediately when logged out
    /// - [`LobbyError::Validation`] if the game has too few players or has
    ///   already started; [`LobbyError::server_detail`] says which
    /// - [`LobbyError::Authorization`] if the user is not the creator
    /// - [`LobbyError::NotFound`] if the game does not exist
    pub async fn start(&self, id: GameId) -> Result<String> {
        self.api.require_credential(Action::Start)?;
        let result = self
            .api
            .send_message(
                Action::Start,
                InFlightTarget::Game(id),
                ApiRequest::new(Method::Post, paths::start_game(id)),
            )
            .await;
        match &result {
            Ok(_) => info!(game = id, "game started"),
            Err(err) if err.kind() == ErrorKind::Validation => warn!(
                game = id,
                min_players = self.api.config().min_players_to_start,
                detail = err.server_detail().unwrap_or_default(),
                "start rejected"
            ),
            Err(_) => {}
        }
        result
    }

    /// Permanently remove game `id`. Creator only.
    ///
    /// Failures are logged at `warn` as well as returned, so callers that
    /// ignore the result still leave a trace.
    ///
    /// # Errors
    ///
    /// - [`LobbyError::Authentication`] immediately when logged out
    /// - [`LobbyError::Authorization`] if the user is not the creator
    /// - [`LobbyError::NotFound`] if the game does not exist
    /// - [`LobbyError::Transport`] for anything else
    pub async fn delete(&self, id: GameId) -> Result<()> {
        let result = self.delete_inner(id).await;
        match &result {
            Ok(()) => info!(game = id, "game deleted"),
            Err(err) => warn!(game = id, kind = %err.kind(), "error deleting game: {err}"),
        }
        result
    }

    async fn delete_inner(&self, id: GameId) -> Result<()> {
        self.api.require_credential(Action::Delete)?;
        self.api
            .send(
                Action::Delete,
                InFlightTarget::Game(id),
                ApiRequest::new(Method::Delete, paths::delete_game(id)),
            )
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for GameSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSessionController").finish_non_exhaustive()
    }
}

/// Returns `true` if `err` means the game no longer takes new players.
///
/// Servers answer a late join either with a 403 or a 400; both mean the
/// game has left `pending`, unless the caller is the creator.
pub fn is_closed_to_joins(err: &LobbyError) -> bool {
    err.action() == Some(Action::Join)
        && matches!(err.kind(), ErrorKind::Authorization | ErrorKind::Validation)
}

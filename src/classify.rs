//! Action-aware classification of transport outcomes.
//!
//! The same HTTP status means different things for different calls: a 409 on
//! `join` is "already joined", a 409 on `register` is "username taken", and a
//! 400 on `start` is "not startable right now". [`classify`] holds the whole table in
//! one place so call sites never branch on status codes themselves.

use std::fmt;

use crate::error::{ErrorKind, LobbyError};

/// A protocol action issued by the client.
///
/// Each variant corresponds to one row of the lobby server's API surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Login,
    Register,
    FetchIdentity,
    ListGames,
    CreateGame,
    GameDetail,
    Join,
    Start,
    Delete,
}

impl Action {
    /// Returns `true` for actions that change server state.
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Self::Register | Self::CreateGame | Self::Join | Self::Start | Self::Delete
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::FetchIdentity => "fetch identity",
            Self::ListGames => "list games",
            Self::CreateGame => "create game",
            Self::GameDetail => "game detail",
            Self::Join => "join game",
            Self::Start => "start game",
            Self::Delete => "delete game",
        };
        f.write_str(name)
    }
}

/// What came back from the transport for a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    /// The server answered with a non-success status.
    Status { status: u16, body: String },
    /// The request never got an answer (connection refused, reset, TLS, ...).
    Failed(String),
    /// The configured timeout elapsed first.
    TimedOut,
}

/// Maps an `(action, status)` pair onto a domain error kind.
pub fn kind_for_status(action: Action, status: u16) -> ErrorKind {
    use Action::*;
    use ErrorKind::*;

    match (action, status) {
        (Login, 400 | 401) => Authentication,

        (Register, 400) => Validation,
        (Register, 409) => Conflict,

        (CreateGame, 400) => Validation,
        (GameDetail, 400) => Validation,

        (Join, 400) => Validation,
        (Join, 403) => Authorization,
        (Join, 409) => Conflict,

        (Start, 400) => Validation,
        (Start, 403) => Authorization,

        (Delete, 403) => Authorization,

        (FetchIdentity | GameDetail | Join | Start | Delete, 404) => NotFound,

        (_, 401) => Authentication,
        _ => Transport,
    }
}

/// Returns the user-visible message for a failure of `kind` during `action`.
pub fn message_for(action: Action, kind: ErrorKind) -> String {
    use Action::*;
    use ErrorKind::*;

    let message = match (action, kind) {
        (Login, Authentication) => "Invalid credentials!",
        (Login, _) => "Login failed. Please try again later.",

        (Register, Conflict) => "Username already taken!",
        (Register, Validation) => "Registration details are invalid.",
        (Register, _) => "Registration failed!",

        (FetchIdentity, Authentication) => "Your session has expired. Please log in again.",
        (FetchIdentity, NotFound) => "Your account could not be found.",
        (FetchIdentity, _) => "Failed to load your profile.",

        (ListGames, Authentication) => "Please log in to see the games.",
        (ListGames, _) => "Failed to load games. Please try again later.",

        (CreateGame, Authentication) => "Please log in to create a game.",
        (CreateGame, Validation) => "Please enter a name for the game.",
        (CreateGame, _) => "Failed to create game.",

        (GameDetail, Authentication) => "Please log in to view this game.",
        (GameDetail, NotFound) => "Game not found! Please check the Game ID and try again.",
        (GameDetail, Validation) => "Please enter a valid game ID.",
        (GameDetail, _) => "Failed to load game details. Please try again later.",

        (Join, Authentication) => "Unauthorized! Please login to join the game.",
        (Join, Authorization) => "You cannot join your own game.",
        (Join, NotFound) => "Game not found! Please check the Game ID and try again.",
        (Join, Conflict) => "You have already joined this game.",
        (Join, Validation) => "This game is no longer accepting players.",
        (Join, _) => "An error occurred. Please try again later.",

        (Start, Authentication) => "Unauthorized! Please login to start the game.",
        (Start, Authorization) => "Only the game creator can start the game.",
        (Start, NotFound) => "Game not found! Please check the Game ID and try again.",
        // Too few players and already started both arrive as 400; the cause
        // is in `server_detail`.
        (Start, Validation) => "This game cannot be started in its current state.",
        (Start, _) => "An error occurred while starting the game. Please try again.",

        (Delete, Authentication) => "Unauthorized! Please login to delete the game.",
        (Delete, Authorization) => "Only the game creator can delete the game.",
        (Delete, NotFound) => "Game not found! It may already have been deleted.",
        (Delete, _) => "An error occurred while deleting the game.",
    };
    message.to_string()
}

/// Translates a transport outcome into a typed [`LobbyError`].
///
/// Pure: no logging, no side effects.
pub fn classify(action: Action, outcome: TransportOutcome) -> LobbyError {
    match outcome {
        TransportOutcome::TimedOut => LobbyError::Timeout { action },
        TransportOutcome::Failed(cause) => LobbyError::network(action, cause),
        TransportOutcome::Status { status, body } => {
            let kind = kind_for_status(action, status);
            let message = message_for(action, kind);
            let detail = {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            };
            match kind {
                ErrorKind::Authentication => LobbyError::Authentication {
                    action,
                    message,
                    detail,
                },
                ErrorKind::Authorization => LobbyError::Authorization {
                    action,
                    message,
                    detail,
                },
                ErrorKind::NotFound => LobbyError::NotFound {
                    action,
                    message,
                    detail,
                },
                ErrorKind::Conflict => LobbyError::Conflict {
                    action,
                    message,
                    detail,
                },
                ErrorKind::Validation => LobbyError::Validation {
                    action,
                    message,
                    detail,
                },
                ErrorKind::Transport | ErrorKind::Duplicate => LobbyError::Transport {
                    action,
                    message,
                    status: Some(status),
                    detail,
                },
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn status(code: u16) -> TransportOutcome {
        TransportOutcome::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn join_table() {
        assert_eq!(kind_for_status(Action::Join, 401), ErrorKind::Authentication);
        assert_eq!(kind_for_status(Action::Join, 403), ErrorKind::Authorization);
        assert_eq!(kind_for_status(Action::Join, 404), ErrorKind::NotFound);
        assert_eq!(kind_for_status(Action::Join, 409), ErrorKind::Conflict);
        assert_eq!(kind_for_status(Action::Join, 500), ErrorKind::Transport);
    }

    #[test]
    fn start_table() {
        assert_eq!(kind_for_status(Action::Start, 400), ErrorKind::Validation);
        assert_eq!(kind_for_status(Action::Start, 401), ErrorKind::Authentication);
        assert_eq!(kind_for_status(Action::Start, 403), ErrorKind::Authorization);
        assert_eq!(kind_for_status(Action::Start, 404), ErrorKind::NotFound);
        assert_eq!(kind_for_status(Action::Start, 409), ErrorKind::Transport);
    }

    #[test]
    fn same_status_differs_by_action() {
        assert_eq!(kind_for_status(Action::Register, 409), ErrorKind::Conflict);
        assert_eq!(kind_for_status(Action::Start, 409), ErrorKind::Transport);
        assert_eq!(kind_for_status(Action::Login, 400), ErrorKind::Authentication);
        assert_eq!(kind_for_status(Action::Start, 400), ErrorKind::Validation);
        assert_eq!(kind_for_status(Action::ListGames, 404), ErrorKind::Transport);
        assert_eq!(kind_for_status(Action::GameDetail, 404), ErrorKind::NotFound);
    }

    #[test]
    fn classify_keeps_server_body_as_detail() {
        let err = classify(
            Action::Join,
            TransportOutcome::Status {
                status: 409,
                body: "Player already joined this game\n".into(),
            },
        );
        assert!(err.is_conflict());
        assert_eq!(err.server_detail(), Some("Player already joined this game"));
        assert_eq!(err.user_message(), "You have already joined this game.");
    }

    #[test]
    fn classify_unmapped_status_keeps_status() {
        let err = classify(Action::Delete, status(500));
        match err {
            LobbyError::Transport { status, detail, .. } => {
                assert_eq!(status, Some(500));
                assert!(detail.is_none());
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn classify_network_failures() {
        let err = classify(Action::ListGames, TransportOutcome::Failed("refused".into()));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.server_detail(), Some("refused"));

        let err = classify(Action::Start, TransportOutcome::TimedOut);
        assert!(matches!(err, LobbyError::Timeout { action: Action::Start }));
    }

    #[test]
    fn start_validation_message_does_not_guess_the_cause() {
        let err = classify(Action::Start, status(400));
        assert!(!err.user_message().contains("players"));

        let err = classify(
            Action::Start,
            TransportOutcome::Status {
                status: 400,
                body: "Game has already started\n".into(),
            },
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.server_detail(), Some("Game has already started"));
    }

    #[test]
    fn mutating_actions() {
        assert!(Action::Join.is_mutating());
        assert!(Action::Delete.is_mutating());
        assert!(!Action::GameDetail.is_mutating());
        assert!(!Action::Login.is_mutating());
    }
}

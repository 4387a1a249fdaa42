//! Error types for the card lobby client.
//!
//! Every failure a caller can observe is a [`LobbyError`]. Failures coming
//! back from the server are classified once, at the request boundary, by
//! [`classify`](crate::classify::classify); callers never see raw status codes.

use std::fmt;

use thiserror::Error;

use crate::classify::Action;

/// The fixed taxonomy of domain error kinds.
///
/// Every [`LobbyError`] maps onto exactly one kind via [`LobbyError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No credential, or the server rejected it.
    Authentication,
    /// Authenticated, but forbidden by an ownership rule.
    Authorization,
    /// The referenced game or user does not exist.
    NotFound,
    /// The server state already satisfies the request (e.g. duplicate join).
    Conflict,
    /// The request violates a precondition (e.g. too few players).
    Validation,
    /// Network failure, timeout, undecodable body or any unmapped status.
    Transport,
    /// A duplicate trigger collapsed by the in-flight guard.
    Duplicate,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::Duplicate => "duplicate",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when using the lobby client.
#[derive(Debug, Error)]
pub enum LobbyError {
    /// No credential is stored, or the server rejected the one sent.
    #[error("{action}: {message}")]
    Authentication {
        action: Action,
        /// User-visible message.
        message: String,
        /// Body text returned by the server, if any.
        detail: Option<String>,
    },

    /// The caller is authenticated but not allowed to do this.
    #[error("{action}: {message}")]
    Authorization {
        action: Action,
        message: String,
        detail: Option<String>,
    },

    /// The game or user does not exist.
    #[error("{action}: {message}")]
    NotFound {
        action: Action,
        message: String,
        detail: Option<String>,
    },

    /// The requested state already holds on the server.
    #[error("{action}: {message}")]
    Conflict {
        action: Action,
        message: String,
        detail: Option<String>,
    },

    /// The request breaks a precondition.
    #[error("{action}: {message}")]
    Validation {
        action: Action,
        message: String,
        detail: Option<String>,
    },

    /// The transport failed, or the server answered with an unmapped status.
    #[error("{action}: {message}")]
    Transport {
        action: Action,
        message: String,
        /// HTTP status, when the server answered at all.
        status: Option<u16>,
        detail: Option<String>,
    },

    /// The request did not complete within the configured timeout.
    #[error("{action}: request timed out")]
    Timeout { action: Action },

    /// An identical mutating request is still outstanding.
    #[error("{action}: an identical request is already in flight")]
    InFlight { action: Action },

    /// Failed to encode a request or decode a response body.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The durable credential slot could not be read or written.
    #[error("credential storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl LobbyError {
    /// Returns the domain kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Authorization { .. } => ErrorKind::Authorization,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Transport { .. }
            | Self::Timeout { .. }
            | Self::Serialization(_)
            | Self::Storage(_) => ErrorKind::Transport,
            Self::InFlight { .. } => ErrorKind::Duplicate,
        }
    }

    /// Returns the action that failed, when known.
    pub fn action(&self) -> Option<Action> {
        match self {
            Self::Authentication { action, .. }
            | Self::Authorization { action, .. }
            | Self::NotFound { action, .. }
            | Self::Conflict { action, .. }
            | Self::Validation { action, .. }
            | Self::Transport { action, .. }
            | Self::Timeout { action }
            | Self::InFlight { action } => Some(*action),
            Self::Serialization(_) | Self::Storage(_) => None,
        }
    }

    /// Returns a message suitable for showing to the end user.
    ///
    /// The message depends on both the kind and the action, so a 403 on
    /// `join` reads differently from a 403 on `start`.
    pub fn user_message(&self) -> String {
        match self {
            Self::Authentication { message, .. }
            | Self::Authorization { message, .. }
            | Self::NotFound { message, .. }
            | Self::Conflict { message, .. }
            | Self::Validation { message, .. }
            | Self::Transport { message, .. } => message.clone(),
            Self::Timeout { .. } => "The server took too long to respond. Please try again.".into(),
            Self::InFlight { .. } => "This request is already being processed.".into(),
            Self::Serialization(_) => {
                "The server sent a response this client could not understand.".into()
            }
            Self::Storage(_) => "Your session could not be saved on this device.".into(),
        }
    }

    /// Returns the raw body text the server sent with the failure, if any.
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            Self::Authentication { detail, .. }
            | Self::Authorization { detail, .. }
            | Self::NotFound { detail, .. }
            | Self::Conflict { detail, .. }
            | Self::Validation { detail, .. }
            | Self::Transport { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Shorthand for `self.kind() == ErrorKind::Conflict`.
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Builds an authentication error raised locally, before any request.
    pub(crate) fn not_logged_in(action: Action) -> Self {
        Self::Authentication {
            action,
            message: crate::classify::message_for(action, ErrorKind::Authentication),
            detail: None,
        }
    }

    /// Builds a validation error raised locally, before any request.
    pub(crate) fn invalid(action: Action) -> Self {
        Self::Validation {
            action,
            message: crate::classify::message_for(action, ErrorKind::Validation),
            detail: None,
        }
    }

    /// Builds a transport error for a network-level failure.
    pub(crate) fn network(action: Action, cause: impl fmt::Display) -> Self {
        Self::Transport {
            action,
            message: crate::classify::message_for(action, ErrorKind::Transport),
            status: None,
            detail: Some(cause.to_string()),
        }
    }
}

/// A specialized [`Result`] type for lobby client operations.
pub type Result<T> = std::result::Result<T, LobbyError>;

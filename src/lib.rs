//! # Card Lobby Client
//!
//! Async client for the session and game-lifecycle API of a turn-based card
//! game lobby.
//!
//! The server is authoritative for every game. This crate holds the user's
//! credential, sends lobby requests, and turns each server answer into either
//! a typed value or a classified [`LobbyError`].
//!
//! ## Features
//!
//! - **Transport-agnostic**: implement the [`Transport`] trait for any backend
//! - **HTTP built-in**: the default `transport-http` feature provides [`HttpTransport`]
//! - **Durable sessions**: a [`SessionStore`] over any [`CredentialStorage`] slot
//! - **Typed failures**: every error has one [`ErrorKind`] and a user-facing message
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use card_lobby_client::{LobbyClient, LobbyConfig, SessionStore};
//!
//! let session = Arc::new(SessionStore::in_memory());
//! let client = LobbyClient::connect(LobbyConfig::from_env(), session)?;
//!
//! client.account().login("alice", "hunter2").await?;
//! let id = client.catalog().create_game("Duel").await?;
//! client.games().start(id).await?;
//! let view = client.games().get_detail(id).await?;
//! ```

pub mod account;
pub mod catalog;
pub mod classify;
pub mod client;
pub mod controller;
pub mod error;
pub mod inflight;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use account::AccountClient;
pub use catalog::{GameCatalogClient, GameListing};
pub use classify::Action;
pub use client::{LobbyClient, LobbyConfig};
pub use controller::{GameSessionController, GameView, JoinOutcome};
pub use error::{ErrorKind, LobbyError};
pub use inflight::InFlightTarget;
pub use protocol::{GameDetail, GameId, GameStatus, GameSummary, Player, UserId};
pub use session::{CredentialStorage, FileStorage, MemoryStorage, SessionStore};
pub use transport::{ApiRequest, ApiResponse, Transport, TransportError};

#[cfg(feature = "transport-http")]
pub use transports::HttpTransport;

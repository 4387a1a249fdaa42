//! Wire-compatible types for the lobby server's JSON API.
//!
//! Field names follow the server's snake_case JSON. Key adaptations:
//!
//! - timestamps stay `String` (RFC 3339 as sent by the server)
//! - the server's `"No Role"` / `"No Character"` placeholders read as `None`
//! - every status spelling the server has used maps onto [`GameStatus`]

use serde::{Deserialize, Deserializer, Serialize};

// ── Type aliases ────────────────────────────────────────────────────

/// Server-assigned game identifier.
pub type GameId = i64;

/// Server-assigned user identifier (the credential's subject).
pub type UserId = i64;

// ── Endpoints ───────────────────────────────────────────────────────

/// HTTP method of an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// Paths of the lobby API.
pub mod paths {
    use super::GameId;

    pub const LOGIN: &str = "/api/login";
    pub const REGISTER: &str = "/api/register";
    pub const CURRENT_USER: &str = "/api/user";
    pub const GAMES: &str = "/api/games";
    pub const NEW_GAME: &str = "/api/games/new";
    pub const JOIN_GAME: &str = "/api/games/join";

    pub fn game(id: GameId) -> String {
        format!("/api/games/{id}")
    }

    pub fn start_game(id: GameId) -> String {
        format!("/api/games/{id}/start")
    }

    pub fn delete_game(id: GameId) -> String {
        format!("/api/games/{id}/delete")
    }
}

// ── Enums ───────────────────────────────────────────────────────────

/// Lifecycle state of a game session: `pending → in-progress → finished`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum GameStatus {
    /// Accepting players; roles not yet assigned.
    #[default]
    #[serde(rename = "pending", alias = "waiting")]
    Pending,
    /// Started; every player has a role and a character.
    #[serde(
        rename = "in-progress",
        alias = "in_progress",
        alias = "started",
        alias = "Started"
    )]
    InProgress,
    #[serde(rename = "finished")]
    Finished,
    /// A status this client does not know about.
    #[serde(other, rename = "unknown")]
    Unknown,
}

impl GameStatus {
    pub fn accepts_players(self) -> bool {
        self == Self::Pending
    }
}

// ── Requests ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGameRequest {
    pub game_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGameRequest {
    pub game_id: GameId,
}

// ── Responses ───────────────────────────────────────────────────────

/// Body of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Body of a successful game creation. Only `id` is guaranteed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedGame {
    pub id: GameId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
}

/// A registered user, as returned by `/api/user` and `/api/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: String,
}

/// One row of the game listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: GameId,
    #[serde(rename = "game_name")]
    pub name: String,
    pub creator_name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
}

/// The `game` object of a detail response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: GameId,
    #[serde(rename = "game_name")]
    pub name: String,
    pub creator_id: UserId,
    #[serde(default)]
    pub status: GameStatus,
    #[serde(default)]
    pub created_at: String,
}

/// A player seated in a game.
///
/// `role` and `character` are `None` until the game is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<GameId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    #[serde(
        default,
        alias = "role_",
        deserialize_with = "assigned",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
    #[serde(
        default,
        deserialize_with = "assigned",
        skip_serializing_if = "Option::is_none"
    )]
    pub character: Option<String>,
}

impl Player {
    /// The user this seat belongs to.
    ///
    /// Falls back to `id` for servers that key players by user id.
    pub fn subject_id(&self) -> UserId {
        self.user_id.unwrap_or(self.id)
    }

    /// `true` once both role and character are assigned.
    pub fn is_assigned(&self) -> bool {
        self.role.is_some() && self.character.is_some()
    }
}

/// Full detail of one game: `{ "game": {...}, "players": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDetail {
    pub game: GameRecord,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub players: Vec<Player>,
}

impl GameDetail {
    pub fn id(&self) -> GameId {
        self.game.id
    }

    pub fn creator_id(&self) -> UserId {
        self.game.creator_id
    }

    pub fn status(&self) -> GameStatus {
        self.game.status
    }

    /// Whether `user` holds a seat in this game.
    pub fn has_player(&self, user: UserId) -> bool {
        self.players.iter().any(|p| p.subject_id() == user)
    }
}

/// Placeholder strings the server uses for "not yet assigned".
const UNASSIGNED: &[&str] = &["No Role", "No Character"];

fn assigned<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| {
        let s = s.trim();
        !s.is_empty() && !UNASSIGNED.contains(&s)
    }))
}

// The server encodes an empty player list as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

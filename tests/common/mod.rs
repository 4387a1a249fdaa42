#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for card lobby client integration tests.
//!
//! Provides a scripted [`MockTransport`], an in-process [`MockLobbyServer`]
//! that enforces the lobby rules, and helpers for building clients.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};

use card_lobby_client::protocol::{
    paths, CreateGameRequest, JoinGameRequest, LoginRequest, Method, RegisterRequest,
};
use card_lobby_client::{
    ApiRequest, ApiResponse, LobbyClient, LobbyConfig, SessionStore, Transport, TransportError,
};

// ── Credentials ─────────────────────────────────────────────────────

/// Build a three-segment credential whose payload is `payload`.
pub fn credential_with_payload(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

/// A credential for user `id`, shaped like the server's.
pub fn credential_for(id: i64) -> String {
    credential_with_payload(&json!({ "user_id": id, "exp": 4_102_444_800_u64 }))
}

// ── MockTransport ───────────────────────────────────────────────────

type Scripted = Result<ApiResponse, TransportError>;

/// Replays scripted responses in order and records every request.
///
/// When the script runs out, `execute` never completes.
pub struct MockTransport {
    responses: StdMutex<VecDeque<Scripted>>,
    pub sent: Arc<StdMutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    pub fn new(responses: Vec<Scripted>) -> (Self, Arc<StdMutex<Vec<ApiRequest>>>) {
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
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None => std::future::pending().await,
        }
    }
}

/// A client over a scripted transport with a fresh in-memory session.
pub fn scripted_client(responses: Vec<Scripted>) -> (LobbyClient, Arc<StdMutex<Vec<ApiRequest>>>) {
    let (transport, sent) = MockTransport::new(responses);
    let client = LobbyClient::new(
        transport,
        Arc::new(SessionStore::in_memory()),
        LobbyConfig::default(),
    );
    (client, sent)
}

// ── MockLobbyServer ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct User {
    id: i64,
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone)]
struct Seat {
    id: i64,
    user_id: i64,
    username: String,
    role: Option<String>,
    character: Option<String>,
}

#[derive(Debug, Clone)]
struct Game {
    id: i64,
    name: String,
    creator_id: i64,
    started: bool,
    seats: Vec<Seat>,
}

#[derive(Debug, Default)]
struct LobbyState {
    users: Vec<User>,
    tokens: HashMap<String, i64>,
    games: BTreeMap<i64, Game>,
    next_user: i64,
    next_game: i64,
    next_seat: i64,
}

const ROLES: &[&str] = &["Sheriff", "Deputy", "Outlaw", "Renegade"];
const CHARACTERS: &[&str] = &["Bart Cassidy", "Black Jack", "Calamity Janet", "El Gringo"];

/// An in-process lobby backend.
///
/// Clones share state, so several clients (one per user) can talk to the
/// same lobby. Every request is recorded, in order, in [`requests`](Self::requests).
#[derive(Clone, Default)]
pub struct MockLobbyServer {
    state: Arc<StdMutex<LobbyState>>,
    requests: Arc<StdMutex<Vec<ApiRequest>>>,
    latency: Option<Duration>,
}

impl MockLobbyServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency`, to hold requests open.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number the next created game `id`.
    pub fn with_first_game_id(self, id: i64) -> Self {
        self.state.lock().unwrap().next_game = id - 1;
        self
    }

    /// Register `username` with password `"secret"` directly in the store.
    pub fn seed_user(&self, username: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_user += 1;
        let id = state.next_user;
        state.users.push(User {
            id,
            username: username.to_string(),
            email: format!("{username}@example.test"),
            password: "secret".to_string(),
        });
        id
    }

    /// A client for this server with a fresh in-memory session.
    pub fn client(&self) -> LobbyClient {
        LobbyClient::new(
            self.clone(),
            Arc::new(SessionStore::in_memory()),
            LobbyConfig::default(),
        )
    }

    /// Seed `username` and return a client already logged in as them.
    pub async fn logged_in(&self, username: &str) -> LobbyClient {
        self.seed_user(username);
        let client = self.client();
        client
            .account()
            .login(username, "secret")
            .await
            .expect("seeded login");
        client
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of recorded requests to `path`.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn seat_count(&self, game: i64) -> usize {
        self.state
            .lock()
            .unwrap()
            .games
            .get(&game)
            .map_or(0, |g| g.seats.len())
    }

    pub fn game_exists(&self, game: i64) -> bool {
        self.state.lock().unwrap().games.contains_key(&game)
    }

    fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let mut state = self.state.lock().unwrap();
        let caller = request
            .bearer
            .as_ref()
            .and_then(|token| state.tokens.get(token).copied());

        let segments: Vec<&str> = request.path.trim_matches('/').split('/').collect();
        match (request.method, segments.as_slice()) {
            (Method::Post, _) if request.path == paths::LOGIN => login(&mut state, request),
            (Method::Post, _) if request.path == paths::REGISTER => register(&mut state, request),
            (Method::Get, _) if request.path == paths::CURRENT_USER => match caller {
                Some(id) => {
                    let user = state.users.iter().find(|u| u.id == id).unwrap();
                    ApiResponse::json(200, &profile_json(user))
                }
                None => unauthorized(),
            },
            (Method::Get, _) if request.path == paths::GAMES => list(&state),
            (Method::Post, _) if request.path == paths::NEW_GAME => match caller {
                Some(id) => create(&mut state, id, request),
                None => unauthorized(),
            },
            (Method::Post, _) if request.path == paths::JOIN_GAME => match caller {
                Some(id) => join(&mut state, id, request),
                None => unauthorized(),
            },
            (Method::Get, ["api", "games", id]) => match (caller, id.parse()) {
                (None, _) => unauthorized(),
                (Some(_), Ok(game)) => detail(&state, game),
                (Some(_), Err(_)) => ApiResponse::new(400, "Invalid game ID\n"),
            },
            (Method::Post, ["api", "games", id, "start"]) => match (caller, id.parse()) {
                (None, _) => unauthorized(),
                (Some(user), Ok(game)) => start(&mut state, user, game),
                (Some(_), Err(_)) => ApiResponse::new(400, "Invalid game ID\n"),
            },
            (Method::Delete, ["api", "games", id, "delete"]) => match (caller, id.parse()) {
                (None, _) => unauthorized(),
                (Some(user), Ok(game)) => delete(&mut state, user, game),
                (Some(_), Err(_)) => ApiResponse::new(400, "Invalid game ID\n"),
            },
            _ => ApiResponse::new(404, "404 page not found\n"),
        }
    }
}

#[async_trait]
impl Transport for MockLobbyServer {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.handle(&request))
    }
}

fn unauthorized() -> ApiResponse {
    ApiResponse::new(401, "Unauthorized\n")
}

fn profile_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "created_at": "2024-05-01T12:00:00Z",
    })
}

fn login(state: &mut LobbyState, request: &ApiRequest) -> ApiResponse {
    let Ok(body) = request.body_as::<LoginRequest>() else {
        return ApiResponse::new(400, "Invalid request payload\n");
    };
    let Some(id) = state
        .users
        .iter()
        .find(|u| u.username == body.username && u.password == body.password)
        .map(|u| u.id)
    else {
        return ApiResponse::new(401, "Invalid username or password\n");
    };
    let token = credential_for(id);
    state.tokens.insert(token.clone(), id);
    ApiResponse::json(200, &json!({ "token": token }))
}

fn register(state: &mut LobbyState, request: &ApiRequest) -> ApiResponse {
    let Ok(body) = request.body_as::<RegisterRequest>() else {
        return ApiResponse::new(400, "Invalid request payload\n");
    };
    if body.username.trim().is_empty() || body.password.is_empty() {
        return ApiResponse::new(400, "Username and password are required\n");
    }
    if state.users.iter().any(|u| u.username == body.username) {
        return ApiResponse::new(409, "Username already exists\n");
    }
    state.next_user += 1;
    let user = User {
        id: state.next_user,
        username: body.username,
        email: body.email,
        password: body.password,
    };
    let response = ApiResponse::json(201, &profile_json(&user));
    state.users.push(user);
    response
}

fn username(state: &LobbyState, id: i64) -> String {
    state
        .users
        .iter()
        .find(|u| u.id == id)
        .map(|u| u.username.clone())
        .unwrap_or_default()
}

fn status_of(game: &Game) -> &'static str {
    if game.started {
        "Started"
    } else {
        "waiting"
    }
}

fn list(state: &LobbyState) -> ApiResponse {
    if state.games.is_empty() {
        return ApiResponse::new(200, "null");
    }
    let games: Vec<Value> = state
        .games
        .values()
        .map(|g| {
            json!({
                "id": g.id,
                "game_name": g.name,
                "creator_id": g.creator_id,
                "creator_name": username(state, g.creator_id),
                "status": status_of(g),
                "created_at": "2024-05-01T12:00:00Z",
            })
        })
        .collect();
    ApiResponse::json(200, &games)
}

/// Seat ids start at 1001 so they never collide with user ids.
fn seat_for(state: &mut LobbyState, user_id: i64) -> Seat {
    state.next_seat += 1;
    Seat {
        id: 1000 + state.next_seat,
        user_id,
        username: username(state, user_id),
        role: None,
        character: None,
    }
}

fn create(state: &mut LobbyState, caller: i64, request: &ApiRequest) -> ApiResponse {
    let Ok(body) = request.body_as::<CreateGameRequest>() else {
        return ApiResponse::new(400, "Invalid request payload\n");
    };
    if body.game_name.trim().is_empty() {
        return ApiResponse::new(400, "Game name is required\n");
    }
    state.next_game += 1;
    let id = state.next_game;
    let creator_seat = seat_for(state, caller);
    state.games.insert(
        id,
        Game {
            id,
            name: body.game_name.clone(),
            creator_id: caller,
            started: false,
            seats: vec![creator_seat],
        },
    );
    ApiResponse::json(
        201,
        &json!({ "id": id, "game_name": body.game_name, "creator_id": caller, "status": "waiting" }),
    )
}

fn detail(state: &LobbyState, id: i64) -> ApiResponse {
    let Some(game) = state.games.get(&id) else {
        return ApiResponse::new(404, "Game not found\n");
    };
    let players: Vec<Value> = game
        .seats
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "user_id": s.user_id,
                "game_id": game.id,
                "username": s.username,
                "health": 4,
                "role": s.role.as_deref().unwrap_or("No Role"),
                "character": s.character.as_deref().unwrap_or("No Character"),
            })
        })
        .collect();
    ApiResponse::json(
        200,
        &json!({
            "game": {
                "id": game.id,
                "game_name": game.name,
                "creator_id": game.creator_id,
                "status": status_of(game),
                "created_at": "2024-05-01T12:00:00Z",
            },
            "players": players,
        }),
    )
}

fn join(state: &mut LobbyState, caller: i64, request: &ApiRequest) -> ApiResponse {
    let Ok(JoinGameRequest { game_id }) = request.body_as::<JoinGameRequest>() else {
        return ApiResponse::new(400, "Invalid request payload\n");
    };
    let Some(game) = state.games.get(&game_id) else {
        return ApiResponse::new(404, "Game not found\n");
    };
    if game.creator_id == caller {
        return ApiResponse::new(403, "Creator cannot join their own game\n");
    }
    if game.seats.iter().any(|s| s.user_id == caller) {
        return ApiResponse::new(409, "User already joined this game\n");
    }
    if game.started {
        return ApiResponse::new(403, "Game has already started\n");
    }
    let seat = seat_for(state, caller);
    if let Some(game) = state.games.get_mut(&game_id) {
        game.seats.push(seat);
    }
    ApiResponse::json(200, &json!({ "message": "Successfully joined the game" }))
}

fn start(state: &mut LobbyState, caller: i64, id: i64) -> ApiResponse {
    let Some(game) = state.games.get_mut(&id) else {
        return ApiResponse::new(404, "Game not found\n");
    };
    if game.creator_id != caller {
        return ApiResponse::new(403, "Only the creator can start the game\n");
    }
    if game.started {
        return ApiResponse::new(400, "Game has already started\n");
    }
    if game.seats.len() < 4 {
        return ApiResponse::new(400, "Not enough players to start the game\n");
    }
    for (n, seat) in game.seats.iter_mut().enumerate() {
        seat.role = Some(ROLES[n % ROLES.len()].to_string());
        seat.character = Some(CHARACTERS[n % CHARACTERS.len()].to_string());
    }
    game.started = true;
    ApiResponse::json(200, &json!({ "message": "Game started successfully" }))
}

fn delete(state: &mut LobbyState, caller: i64, id: i64) -> ApiResponse {
    let Some(game) = state.games.get(&id) else {
        return ApiResponse::new(404, "Game not found\n");
    };
    if game.creator_id != caller {
        return ApiResponse::new(403, "Only the creator can delete this game\n");
    }
    state.games.remove(&id);
    ApiResponse::json(200, &json!({ "message": "Game deleted successfully" }))
}

//! # Basic Lobby Demo
//!
//! Walks one user through the lobby over HTTP:
//!
//! 1. Restore a saved session, or log in
//! 2. List the open games
//! 3. Create a game and show its detail
//! 4. Try to start it (fails until four players have joined)
//!
//! ## Running
//!
//! ```sh
//! # Start the lobby backend on localhost:8080, then:
//! LOBBY_USER=alice LOBBY_PASSWORD=secret cargo run --example basic_lobby
//!
//! # Override the server URL:
//! LOBBY_BASE_URL=http://my-server:8080 cargo run --example basic_lobby
//! ```

use std::sync::Arc;

use card_lobby_client::{ErrorKind, FileStorage, LobbyClient, LobbyConfig, SessionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=card_lobby_client=debug` to see every request.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let config = LobbyConfig::from_env();
    tracing::info!("Using lobby at {}", config.base_url);

    // The credential survives between runs in the temp directory.
    let storage = FileStorage::new(std::env::temp_dir(), "card-lobby-token");
    let session = Arc::new(SessionStore::init(storage)?);
    let client = LobbyClient::connect(config, session)?;

    // ── Login ───────────────────────────────────────────────────────
    if client.session().is_authenticated() {
        tracing::info!("Restored session for user {:?}", client.session().identity());
    } else {
        let user = std::env::var("LOBBY_USER").unwrap_or_else(|_| "alice".to_string());
        let password = std::env::var("LOBBY_PASSWORD").unwrap_or_else(|_| "secret".to_string());
        if let Err(e) = client.account().login(&user, &password).await {
            tracing::error!("{}", e.user_message());
            return Ok(());
        }
    }

    match client.account().current_user().await {
        Ok(me) => tracing::info!("Logged in as {} <{}>", me.username, me.email),
        Err(e) if e.kind() == ErrorKind::Authentication => {
            // Stale credential from an earlier run.
            tracing::warn!("Saved session expired; run again to log in");
            client.account().logout()?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    // ── Catalog ─────────────────────────────────────────────────────
    let listing = client.catalog().list_games().await;
    if let Some(err) = &listing.error {
        tracing::warn!("{}", err.user_message());
    }
    for game in &listing.games {
        tracing::info!("#{} {} (by {})", game.id, game.name, game.creator_name);
    }

    // ── Lifecycle ───────────────────────────────────────────────────
    let id = client.catalog().create_game("Demo table").await?;
    let view = client.games().get_detail(id).await?;
    tracing::info!(
        "Created #{id} \"{}\" with {} player(s), status {:?}",
        view.detail.game.name,
        view.detail.players.len(),
        view.detail.status()
    );

    match client.games().start(id).await {
        Ok(message) => tracing::info!("{message}"),
        Err(e) => tracing::info!("Start refused: {}", e.user_message()),
    }

    client.games().delete(id).await?;
    tracing::info!("Deleted #{id}");
    Ok(())
}

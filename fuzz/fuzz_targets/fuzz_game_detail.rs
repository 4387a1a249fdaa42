#![no_main]

use card_lobby_client::protocol::{GameDetail, GameSummary};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw-byte path, including serde_json's own UTF-8 validation.
    let _ = serde_json::from_slice::<GameDetail>(data);
    let _ = serde_json::from_slice::<Option<Vec<GameSummary>>>(data);

    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(detail) = serde_json::from_str::<GameDetail>(s) {
            // Derived queries must never panic on decoded input.
            let _ = detail.has_player(detail.creator_id());
            let _ = detail.players.iter().filter(|p| p.is_assigned()).count();
        }
    }
});

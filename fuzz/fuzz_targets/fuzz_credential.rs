#![no_main]

use card_lobby_client::session::decode_subject;
use card_lobby_client::SessionStore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(credential) = std::str::from_utf8(data) else {
        return;
    };
    let _ = decode_subject(credential);

    // Whatever the payload, a stored credential means "authenticated".
    let session = SessionStore::in_memory();
    if session.set_credential(Some(credential)).is_ok() {
        assert_eq!(session.is_authenticated(), !credential.is_empty());
    }
});

//! Credential ownership and derived identity.
//!
//! A [`SessionStore`] holds the single bearer credential for one user session
//! and writes it through to a [`CredentialStorage`] slot on every change, so a
//! restarted client can pick the session back up with [`SessionStore::init`].
//!
//! The subject id is read from the token's payload *without* verifying the
//! signature. It is a UI hint only: the server re-checks every ownership rule.
//!
//! # Example
//!
//! ```
//! use card_lobby_client::session::{MemoryStorage, SessionStore};
//!
//! let session = SessionStore::init(MemoryStorage::default()).unwrap();
//! assert!(!session.is_authenticated());
//!
//! session.set_credential(Some("not-a-jwt")).unwrap();
//! assert!(session.is_authenticated());
//! assert_eq!(session.identity(), None);
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::Result;
use crate::protocol::UserId;

/// Name of the credential slot when none is given.
pub const DEFAULT_SLOT: &str = "token";

// ── Storage ─────────────────────────────────────────────────────────

/// A single named, durable slot holding the credential string.
///
/// This is deliberately not a key-value store: one slot, present or absent.
pub trait CredentialStorage: Send + Sync + 'static {
    /// Read the slot. `Ok(None)` means the slot does not exist.
    fn load(&self) -> io::Result<Option<String>>;

    /// Create or overwrite the slot.
    fn store(&self, credential: &str) -> io::Result<()>;

    /// Remove the slot entirely. Removing an absent slot is not an error.
    fn remove(&self) -> io::Result<()>;
}

/// In-process storage. Clones share the same slot, which lets tests simulate
/// a reload by building a second [`SessionStore`] over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    /// Returns the raw slot contents.
    pub fn peek(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CredentialStorage for MemoryStorage {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.peek())
    }

    fn store(&self, credential: &str) -> io::Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(credential.to_string());
        Ok(())
    }

    fn remove(&self) -> io::Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// File-backed storage: the slot is one file named after the slot in `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Use `dir/<slot>` as the credential file. `dir` must already exist.
    pub fn new(dir: impl AsRef<Path>, slot: &str) -> Self {
        Self {
            path: dir.as_ref().join(slot),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStorage for FileStorage {
    fn load(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn store(&self, credential: &str) -> io::Result<()> {
        std::fs::write(&self.path, credential)
    }

    fn remove(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

// ── Credential decoding ─────────────────────────────────────────────

/// Why a credential's payload could not be read.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("credential is not a dot-separated token")]
    Malformed,
    #[error("payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload carries no numeric subject")]
    MissingSubject,
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    sub: Option<serde_json::Value>,
}

/// Extract the subject id from a JWT-shaped credential's payload.
///
/// The signature is not checked. `user_id` is preferred; a numeric `sub`
/// is accepted as a fallback.
pub fn decode_subject(credential: &str) -> std::result::Result<UserId, DecodeError> {
    let mut parts = credential.split('.');
    let payload = match (parts.next(), parts.next()) {
        (Some(_header), Some(payload)) if !payload.is_empty() => payload,
        _ => return Err(DecodeError::Malformed),
    };

    // Accept both alphabets and stray padding.
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes())?;
    let claims: Claims = serde_json::from_slice(&bytes)?;

    if let Some(id) = claims.user_id {
        return Ok(id);
    }
    match claims.sub {
        Some(serde_json::Value::Number(n)) => n.as_i64().ok_or(DecodeError::MissingSubject),
        Some(serde_json::Value::String(s)) => s.parse().map_err(|_| DecodeError::MissingSubject),
        _ => Err(DecodeError::MissingSubject),
    }
}

/// Best-effort wrapper around [`decode_subject`]: failures are logged, never raised.
fn identity_of(credential: &str) -> Option<UserId> {
    match decode_subject(credential) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("could not decode credential payload: {e}");
            None
        }
    }
}

// ── SessionStore ────────────────────────────────────────────────────

#[derive(Default)]
struct SessionState {
    credential: Option<String>,
    subject: Option<UserId>,
}

/// Owner of the current credential and the identity derived from it.
///
/// Invariant: `is_authenticated() == credential().is_some()`, whether or not
/// the payload could be decoded.
pub struct SessionStore {
    storage: Box<dyn CredentialStorage>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    /// Open a session over `storage`, restoring any credential already there.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::Storage`](crate::LobbyError::Storage) if the slot
    /// exists but cannot be read.
    pub fn init(storage: impl CredentialStorage) -> Result<Self> {
        let credential = storage.load()?.filter(|c| !c.is_empty());
        let subject = credential.as_deref().and_then(identity_of);
        debug!(
            restored = credential.is_some(),
            subject = ?subject,
            "session initialized"
        );
        Ok(Self {
            storage: Box::new(storage),
            state: RwLock::new(SessionState {
                credential,
                subject,
            }),
        })
    }

    /// A session over fresh [`MemoryStorage`].
    pub fn in_memory() -> Self {
        Self {
            storage: Box::new(MemoryStorage::default()),
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Store or clear the credential.
    ///
    /// `None` (or an empty string) removes the durable slot and clears the
    /// derived identity. The in-memory view changes even if the write fails.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::Storage`](crate::LobbyError::Storage) if the
    /// durable slot could not be updated.
    pub fn set_credential(&self, credential: Option<&str>) -> Result<()> {
        let credential = credential.filter(|c| !c.is_empty());
        let subject = credential.and_then(identity_of);
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.credential = credential.map(str::to_string);
            state.subject = subject;
        }
        match credential {
            Some(token) => {
                debug!(subject = ?subject, "credential stored");
                self.storage.store(token)?;
            }
            None => {
                debug!("credential cleared");
                self.storage.remove()?;
            }
        }
        Ok(())
    }

    /// The current credential, if any.
    pub fn credential(&self) -> Option<String> {
        self.read().credential.clone()
    }

    /// The subject id decoded from the credential. Untrusted.
    pub fn identity(&self) -> Option<UserId> {
        self.read().subject
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().credential.is_some()
    }

    /// Same as `set_credential(None)`.
    ///
    /// # Errors
    ///
    /// See [`set_credential`](Self::set_credential).
    pub fn logout(&self) -> Result<()> {
        self.set_credential(None)
    }

    /// End this session object. The durable slot is left as it is, so a later
    /// [`init`](Self::init) over the same storage restores the session.
    pub fn teardown(self) {
        debug!(
            authenticated = self.is_authenticated(),
            "session torn down"
        );
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("SessionStore")
            .field("credential", &state.credential.as_ref().map(|_| "<redacted>"))
            .field("subject", &state.subject)
            .finish()
    }
}

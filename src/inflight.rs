//! At-most-one-in-flight guard for mutating calls.
//!
//! A double click, or two tasks reacting to the same event, must not send two
//! identical mutating requests. [`InFlightGuard::acquire`] hands out one
//! [`InFlightPermit`] per `(action, target)` key; a second caller gets
//! [`LobbyError::InFlight`] until the permit is dropped. Calls that differ in
//! their target, such as two creates with different names, never collide.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::classify::Action;
use crate::error::{LobbyError, Result};
use crate::protocol::GameId;

/// What a mutating request acts on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InFlightTarget {
    /// Nothing distinguishes one call from another.
    Unscoped,
    /// An existing game.
    Game(GameId),
    /// A resource that does not exist yet, named by the caller (game name,
    /// username).
    Name(String),
}

/// Key of an in-flight request: the action and what it acts on.
pub type InFlightKey = (Action, InFlightTarget);

/// Shared registry of outstanding mutating requests.
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<InFlightKey>>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `(action, target)`.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::InFlight`] if the key is already claimed.
    pub fn acquire(&self, action: Action, target: InFlightTarget) -> Result<InFlightPermit> {
        let key = (action, target);
        let inserted = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        if !inserted {
            debug!(%action, target = ?key.1, "duplicate request collapsed");
            return Err(LobbyError::InFlight { action });
        }
        Ok(InFlightPermit {
            key,
            active: Arc::clone(&self.active),
        })
    }

    /// Whether `(action, target)` is currently claimed.
    pub fn is_active(&self, action: Action, target: &InFlightTarget) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(action, target.clone()))
    }
}

/// Releases its key when dropped, including when the owning future is cancelled.
#[derive(Debug)]
pub struct InFlightPermit {
    key: InFlightKey,
    active: Arc<Mutex<HashSet<InFlightKey>>>,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

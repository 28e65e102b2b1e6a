//! Registry of live sessions.
//!
//! Sessions add themselves after a successful handshake and remove themselves
//! during teardown. Callers only ever observe owned snapshots, never a live
//! view of the map.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use thiserror::Error;
use tracing::debug;

use crate::isolation::IsolationMode;
use crate::session::SessionId;
use crate::transport::ConnectionCloser;

pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Errors raised when registering a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A session with the same identity is already registered.
    #[error("session {id} is already registered")]
    Duplicate { id: SessionId },
    /// A thread panicked while holding the registry lock.
    #[error("session registry lock poisoned")]
    Poisoned,
}

/// Registry record for one live session.
#[derive(Debug)]
pub struct SessionEntry {
    id: SessionId,
    mode: IsolationMode,
    peer: String,
    registered_at: SystemTime,
    closer: Option<ConnectionCloser>,
}

impl SessionEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(id: SessionId, mode: IsolationMode, peer: impl Into<String>) -> Self {
        Self {
            id,
            mode,
            peer: peer.into(),
            registered_at: SystemTime::now(),
            closer: None,
        }
    }

    /// Attaches a handle used to force the connection closed.
    #[must_use]
    pub fn with_closer(mut self, closer: ConnectionCloser) -> Self {
        self.closer = Some(closer);
        self
    }

    /// Session identity.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Owned description of this entry.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            mode: self.mode,
            peer: self.peer.clone(),
            registered_at: self.registered_at,
        }
    }
}

/// Point-in-time description of a registered session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Session identity.
    pub id: SessionId,
    /// Isolation the session selected.
    pub mode: IsolationMode,
    /// Remote peer label.
    pub peer: String,
    /// When the session registered.
    pub registered_at: SystemTime,
}

/// Shared coordinator tracking active sessions.
pub trait SessionRegistry: Send + Sync {
    /// Registers `entry`. Fails rather than overwrite an existing identity.
    fn add(&self, entry: SessionEntry) -> Result<(), RegistryError>;

    /// Removes and returns the entry for `id`.
    ///
    /// Removing an absent identity returns `None`, so repeated teardown is
    /// harmless. Never fails, even after a lock holder panicked.
    fn remove(&self, id: SessionId) -> Option<SessionEntry>;

    /// Owned summaries of all registered sessions, in no particular order.
    fn snapshot(&self) -> Vec<SessionSummary>;

    /// Number of registered sessions.
    fn len(&self) -> usize;

    /// Returns `true` when no session is registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mutex-guarded registry used by the daemon.
#[derive(Debug, Default)]
pub struct LiveSessions {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
}

impl LiveSessions {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces every registered connection closed and returns how many were.
    ///
    /// Entries stay registered; each session observes the closed connection
    /// and removes itself through its normal teardown.
    pub fn close_all(&self) -> usize {
        let sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut closed = 0;
        for closer in sessions.values().filter_map(|entry| entry.closer.as_ref()) {
            closer.close();
            closed += 1;
        }
        debug!(target: REGISTRY_TARGET, closed, "closed live sessions");
        closed
    }
}

impl SessionRegistry for LiveSessions {
    fn add(&self, entry: SessionEntry) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.lock().map_err(|_| RegistryError::Poisoned)?;
        match sessions.entry(entry.id) {
            Entry::Occupied(_) => Err(RegistryError::Duplicate { id: entry.id }),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    fn remove(&self, id: SessionId) -> Option<SessionEntry> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    fn snapshot(&self) -> Vec<SessionSummary> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(SessionEntry::summary)
            .collect()
    }

    fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

//! Isolation scopes selected by each session during its handshake.
//!
//! A session either joins the process-wide shared scope or receives a private
//! scope that lives exactly as long as the session. Command processors only
//! ever see an [`IsolationScope`] and interact with its [`Namespace`]; they do
//! not branch on which kind of scope they were handed.

mod namespace;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub use self::namespace::Namespace;

use crate::session::SessionId;

/// Token a peer sends during the handshake to request a private scope.
pub const PRIVATE_TOKEN: &str = "private";

/// Isolation requested by a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationMode {
    /// Share definitions with every other shared session.
    Shared,
    /// Keep definitions visible to this session only.
    Private,
}

impl IsolationMode {
    /// Interprets a handshake token.
    ///
    /// Only the exact token `private` selects a private scope; anything else,
    /// including differently cased spellings, selects the shared scope.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        if token == PRIVATE_TOKEN {
            Self::Private
        } else {
            Self::Shared
        }
    }

    /// Lower-case name used in logs and summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability granting access to the namespace a session operates in.
#[derive(Debug, Clone)]
pub enum IsolationScope {
    /// Process-wide namespace shared by all shared sessions.
    Shared(Arc<Namespace>),
    /// Namespace owned by a single session.
    Private(Arc<Namespace>),
}

impl IsolationScope {
    /// Namespace backing this scope.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        match self {
            Self::Shared(namespace) | Self::Private(namespace) => namespace,
        }
    }

    /// Mode this scope was created for.
    #[must_use]
    pub const fn mode(&self) -> IsolationMode {
        match self {
            Self::Shared(_) => IsolationMode::Shared,
            Self::Private(_) => IsolationMode::Private,
        }
    }
}

/// Source of isolation scopes for new sessions.
pub trait ScopeProvider: Send + Sync {
    /// Returns the process-wide shared scope.
    fn shared(&self) -> IsolationScope;

    /// Creates a fresh private scope for `session`.
    fn create_private(&self, session: SessionId) -> IsolationScope;

    /// Releases a scope at session teardown.
    ///
    /// Discarding the shared scope is a no-op.
    fn discard(&self, scope: &IsolationScope);
}

/// Scope provider owning the shared namespace and tracking private scopes.
#[derive(Debug)]
pub struct ScopeTable {
    shared: Arc<Namespace>,
    live_private: AtomicUsize,
}

impl ScopeTable {
    /// Creates a table with an empty shared namespace.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Namespace::new("shared")),
            live_private: AtomicUsize::new(0),
        }
    }

    /// Number of private scopes created and not yet discarded.
    #[must_use]
    pub fn live_private_scopes(&self) -> usize {
        self.live_private.load(Ordering::SeqCst)
    }
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeProvider for ScopeTable {
    fn shared(&self) -> IsolationScope {
        IsolationScope::Shared(Arc::clone(&self.shared))
    }

    fn create_private(&self, session: SessionId) -> IsolationScope {
        self.live_private.fetch_add(1, Ordering::SeqCst);
        IsolationScope::Private(Arc::new(Namespace::new(session.to_string())))
    }

    fn discard(&self, scope: &IsolationScope) {
        if let IsolationScope::Private(namespace) = scope {
            namespace.clear();
            // Saturate so a stray double discard cannot wrap the counter.
            let _ = self
                .live_private
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                    count.checked_sub(1)
                });
        }
    }
}

//! Command dispatch contract between sessions and the command interpreter.
//!
//! Sessions hand every inbound line to a [`CommandProcessor`] together with
//! their identity and isolation scope. The processor answers with a [`Reply`]
//! which either carries one response line or asks the session to close.

mod reference;

pub use self::reference::ReferenceProcessor;

use crate::isolation::IsolationScope;
use crate::session::SessionId;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Outcome of dispatching one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send `text` back as a single line. An empty string is still a reply.
    Line(String),
    /// Send nothing and end the session gracefully.
    Close,
}

impl Reply {
    /// Builds a line reply.
    #[must_use]
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(text.into())
    }
}

/// Interprets commands on behalf of sessions.
///
/// Implementations are shared between all session threads and may be called
/// concurrently. A call may block; the calling session waits for it.
pub trait CommandProcessor: Send + Sync {
    /// Processes `command` (terminator already stripped) for `session`.
    fn dispatch(&self, command: &str, session: SessionId, scope: &IsolationScope) -> Reply;
}

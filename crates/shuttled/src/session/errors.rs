//! Error and outcome types for session lifecycles.

use std::fmt;
use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::registry::RegistryError;

use super::lines::LineError;

/// Reasons the isolation handshake can fail.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The peer closed the connection before sending a token.
    #[error("peer closed the connection before sending an isolation token")]
    Closed,
    /// The stream ended before the token line was terminated.
    #[error("isolation token line was not terminated ({bytes} bytes received)")]
    Unterminated { bytes: usize },
    /// The token line exceeded the line limit.
    #[error("isolation token line exceeds {limit} bytes")]
    TooLong { limit: usize },
    /// The token line was not valid UTF-8.
    #[error("isolation token is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] FromUtf8Error),
    /// Reading from or duplicating the connection failed.
    #[error("connection I/O failed during handshake: {0}")]
    Io(#[source] io::Error),
}

impl From<LineError> for HandshakeError {
    fn from(error: LineError) -> Self {
        match error {
            LineError::Io(source) => Self::Io(source),
            LineError::TooLong { limit } => Self::TooLong { limit },
            LineError::Unterminated { bytes } => Self::Unterminated { bytes },
            LineError::InvalidUtf8(source) => Self::InvalidUtf8(source),
        }
    }
}

impl From<io::Error> for HandshakeError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// Failures that end a session abnormally.
///
/// None of these escape the session thread; they are reported and logged.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The isolation token could not be read. The session never registered.
    #[error("handshake failed: {source}")]
    Handshake {
        #[source]
        source: HandshakeError,
    },
    /// Reading a command or writing a reply failed.
    #[error("transport fault: {source}")]
    Transport {
        #[source]
        source: LineError,
    },
    /// The registry refused the session.
    #[error("registration refused: {source}")]
    Registration {
        #[source]
        source: RegistryError,
    },
}

impl SessionError {
    pub(crate) fn handshake(source: impl Into<HandshakeError>) -> Self {
        Self::Handshake {
            source: source.into(),
        }
    }

    pub(crate) fn transport(source: impl Into<LineError>) -> Self {
        Self::Transport {
            source: source.into(),
        }
    }
}

/// Why a registered session stopped serving commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndReason {
    /// The processor asked to close.
    Closed,
    /// The peer closed its side of the connection.
    EndOfStream,
    /// A transport fault, refused registration or a panic ended the session.
    Fault,
}

impl EndReason {
    /// Lower-case label used in structured logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::EndOfStream => "end_of_stream",
            Self::Fault => "fault",
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

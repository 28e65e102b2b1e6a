use std::fmt;
use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;

/// Why the supervisor stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// `SIGTERM`.
    Terminate,
    /// `SIGINT`.
    Interrupt,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`. The bridge has no configuration to reload, so it stops.
    Hangup,
    /// Stop requested in-process rather than by a signal.
    Requested,
}

impl StopCause {
    const SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

    /// Maps a delivered signal number onto a cause.
    #[must_use]
    pub fn from_signal(signal: i32) -> Option<Self> {
        match signal {
            SIGTERM => Some(Self::Terminate),
            SIGINT => Some(Self::Interrupt),
            SIGQUIT => Some(Self::Quit),
            SIGHUP => Some(Self::Hangup),
            _ => None,
        }
    }

    /// Name used in shutdown logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Terminate => "SIGTERM",
            Self::Interrupt => "SIGINT",
            Self::Quit => "SIGQUIT",
            Self::Hangup => "SIGHUP",
            Self::Requested => "requested",
        }
    }
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blocks the supervisor until the bridge should stop.
pub trait ShutdownSignal: Send + Sync {
    /// Returns once a stop has been requested, naming what asked for it.
    fn wait(&self) -> Result<StopCause, ShutdownError>;
}

/// Errors raised while waiting for a stop request.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Signal handlers could not be registered.
    #[error("failed to install signal handlers: {source}")]
    Install {
        #[source]
        source: io::Error,
    },
    /// The signal iterator finished without yielding a handled signal.
    #[error("signal stream ended before a termination signal arrived")]
    StreamEnded,
}

/// Stops the bridge on the first termination signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Builds the signal listener.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<StopCause, ShutdownError> {
        let mut signals =
            Signals::new(StopCause::SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        signals
            .forever()
            .find_map(StopCause::from_signal)
            .ok_or(ShutdownError::StreamEnded)
    }
}

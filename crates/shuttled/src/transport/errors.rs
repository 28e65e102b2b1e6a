//! Failures raised while binding or serving the session socket.

use std::io;
use std::net::SocketAddr;

#[cfg(unix)]
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced while binding or running the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Host name lookup failed.
    #[error("cannot resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    /// Lookup succeeded but produced no usable address.
    #[error("{host}:{port} resolved to no addresses")]
    ResolveEmpty { host: String, port: u16 },
    /// Binding the TCP socket failed.
    #[error("cannot bind TCP listener on {addr}: {source}")]
    BindTcp {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// Switching the listening socket to non-blocking mode failed.
    #[error("cannot make listener non-blocking: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    /// The accept thread could not be started.
    #[error("cannot spawn accept thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },
    /// Unix endpoints were configured on a platform without them.
    #[cfg(not(unix))]
    #[error("unix socket endpoint {endpoint} is not supported on this platform")]
    UnsupportedUnix { endpoint: String },
    /// Binding the Unix socket failed.
    #[cfg(unix)]
    #[error("cannot bind unix listener at {path}: {source}")]
    BindUnix {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// Another process is serving the configured socket.
    #[cfg(unix)]
    #[error("unix socket {path} is served by another process")]
    UnixInUse { path: Utf8PathBuf },
    /// The socket path is occupied by something that is not a socket.
    #[cfg(unix)]
    #[error("{path} exists and is not a unix socket")]
    UnixNotSocket { path: Utf8PathBuf },
    /// Reading metadata for an existing socket path failed.
    #[cfg(unix)]
    #[error("cannot inspect existing unix socket {path}: {source}")]
    UnixMetadata {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// Probing an existing socket failed for a reason other than staleness.
    #[cfg(unix)]
    #[error("cannot probe existing unix socket {path}: {source}")]
    UnixProbe {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// Removing a stale socket file failed.
    #[cfg(unix)]
    #[error("cannot remove stale unix socket {path}: {source}")]
    UnixCleanup {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked.
    #[error("accept thread panicked")]
    ThreadPanic,
}

//! Connection abstractions shared by the listener and the session layer.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use tracing::debug;

use super::LISTENER_TARGET;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Byte stream of one accepted connection.
#[derive(Debug)]
pub enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ConnectionStream {
    /// Opens another handle to the same underlying socket.
    ///
    /// Sessions use independent handles for reading, writing and forced
    /// shutdown so none of them needs to share a mutable borrow.
    pub fn try_clone(&self) -> io::Result<Self> {
        match self {
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
        }
    }

    /// Describes the remote peer for logs and registry summaries.
    #[must_use]
    pub fn peer_label(&self) -> String {
        match self {
            Self::Tcp(stream) => stream
                .peer_addr()
                .map_or_else(|_| String::from("tcp:unknown"), |addr| format!("tcp:{addr}")),
            #[cfg(unix)]
            Self::Unix(stream) => stream
                .peer_addr()
                .ok()
                .and_then(|addr| addr.as_pathname().map(|path| path.display().to_string()))
                .map_or_else(|| String::from("unix"), |path| format!("unix:{path}")),
        }
    }

    fn shutdown(&self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Handle able to close a connection from outside its session thread.
///
/// Closing shuts down both directions of the socket. A session blocked in a
/// read observes end-of-stream (or a transport fault) and tears down normally.
#[derive(Debug)]
pub struct ConnectionCloser {
    stream: ConnectionStream,
}

impl ConnectionCloser {
    /// Derives a closer from a live connection.
    pub fn for_stream(stream: &ConnectionStream) -> io::Result<Self> {
        stream.try_clone().map(|stream| Self { stream })
    }

    /// Shuts the connection down. Repeated calls are harmless.
    pub fn close(&self) {
        if let Err(error) = self.stream.shutdown()
            && error.kind() != io::ErrorKind::NotConnected
        {
            debug!(
                target: LISTENER_TARGET,
                error = %error,
                "connection shutdown failed"
            );
        }
    }
}

/// Handles accepted socket connections.
///
/// The listener numbers connections from 1 in accept order and passes that
/// sequence number along with the stream.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Name given to the thread serving connection `sequence`.
    fn thread_name(&self, sequence: u64) -> String {
        format!("connection-{sequence}")
    }

    /// Takes ownership of one connection. Runs on a thread dedicated to it.
    fn handle(&self, sequence: u64, stream: ConnectionStream);
}

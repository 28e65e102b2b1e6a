//! Per-connection sessions.
//!
//! A session owns one accepted connection. It reads a single isolation token,
//! registers with the [`SessionRegistry`], and then runs a strictly sequential
//! read, dispatch and write loop until the peer disconnects, the processor
//! asks to close, or the transport fails. Every exit path converges on one
//! teardown that deregisters the session, discards a private scope and closes
//! the connection.
//!
//! ```text
//! peer                              session
//!  | "private\n"  ------------------>  handshake: select scope
//!  |                                   register
//!  | "define x 1\n" ---------------->  dispatch
//!  | <--------------------- "ok\n"
//!  | "bye\n" ----------------------->  dispatch -> Close
//!  | <-------------------- (closed)    teardown
//! ```

mod errors;
mod handler;
mod handshake;
mod lines;
mod teardown;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

pub use self::errors::{EndReason, HandshakeError, SessionError};
pub use self::handler::SessionConnectionHandler;
pub use self::lines::{LineError, LineReader, LineWriter};

use crate::dispatch::{CommandProcessor, Reply};
use crate::health::SessionReporter;
use crate::isolation::{IsolationMode, IsolationScope, ScopeProvider};
use crate::registry::{SessionEntry, SessionRegistry};
use crate::transport::{ConnectionCloser, ConnectionStream};

use self::teardown::Teardown;

pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Opaque, immutable session identity rendered as `session-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Lifecycle position of a session. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Connected; the token has been read but the session is not registered.
    Handshaking,
    /// Registered and serving commands.
    Active,
    /// Torn down.
    Terminated,
}

impl SessionState {
    /// Moves to `next` if it lies ahead; returns whether the state changed.
    pub fn advance(&mut self, next: Self) -> bool {
        if next > *self {
            *self = next;
            true
        } else {
            false
        }
    }
}

/// Shared collaborators every session needs.
#[derive(Clone)]
pub struct SessionContext {
    registry: Arc<dyn SessionRegistry>,
    scopes: Arc<dyn ScopeProvider>,
    processor: Arc<dyn CommandProcessor>,
    reporter: Arc<dyn SessionReporter>,
    max_line_bytes: usize,
}

impl SessionContext {
    /// Bundles the session collaborators with the default line limit.
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        scopes: Arc<dyn ScopeProvider>,
        processor: Arc<dyn CommandProcessor>,
        reporter: Arc<dyn SessionReporter>,
    ) -> Self {
        Self {
            registry,
            scopes,
            processor,
            reporter,
            max_line_bytes: shuttle_config::DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Overrides the inbound line limit.
    #[must_use]
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Registry sessions join while active.
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn SessionRegistry> {
        &self.registry
    }

    /// Source of isolation scopes.
    #[must_use]
    pub fn scopes(&self) -> &Arc<dyn ScopeProvider> {
        &self.scopes
    }

    /// Observer notified of lifecycle events.
    #[must_use]
    pub fn reporter(&self) -> &Arc<dyn SessionReporter> {
        &self.reporter
    }

    /// Inbound line limit in bytes.
    #[must_use]
    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("registry_len", &self.registry.len())
            .field("max_line_bytes", &self.max_line_bytes)
            .finish_non_exhaustive()
    }
}

/// One accepted connection after its handshake.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    peer: String,
    reader: LineReader<ConnectionStream>,
    writer: LineWriter<ConnectionStream>,
    closer: ConnectionCloser,
    registry_closer: ConnectionCloser,
    mode: IsolationMode,
    state: SessionState,
}

impl Session {
    /// Performs the handshake on `stream` and records the requested isolation.
    ///
    /// Reads exactly one line. Nothing is allocated or registered here: the
    /// scope is created by [`Session::run`], so dropping an unrun session
    /// leaves no private scope behind.
    pub fn open(
        id: SessionId,
        stream: ConnectionStream,
        max_line_bytes: usize,
    ) -> Result<Self, SessionError> {
        let peer = stream.peer_label();
        let write_half = stream.try_clone().map_err(SessionError::handshake)?;
        let closer = ConnectionCloser::for_stream(&stream).map_err(SessionError::handshake)?;
        let registry_closer =
            ConnectionCloser::for_stream(&stream).map_err(SessionError::handshake)?;

        let mut reader = LineReader::new(stream, max_line_bytes);
        let mode = handshake::read_isolation_mode(&mut reader).map_err(SessionError::handshake)?;
        debug!(
            target: SESSION_TARGET,
            session = %id,
            peer = %peer,
            mode = %mode,
            "handshake complete"
        );

        Ok(Self {
            id,
            peer,
            reader,
            writer: LineWriter::new(write_half),
            closer,
            registry_closer,
            mode,
            state: SessionState::Handshaking,
        })
    }

    /// Session identity.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Remote peer label.
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Isolation requested during the handshake.
    #[must_use]
    pub fn mode(&self) -> IsolationMode {
        self.mode
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Command line reader.
    pub fn reader(&mut self) -> &mut LineReader<ConnectionStream> {
        &mut self.reader
    }

    /// Reply writer.
    pub fn writer(&mut self) -> &mut LineWriter<ConnectionStream> {
        &mut self.writer
    }

    /// Allocates the scope, registers, serves commands until the session
    /// ends, then tears down.
    ///
    /// Faults are reported through the context's [`SessionReporter`] before
    /// being returned; they never affect other sessions.
    pub fn run(self, context: &SessionContext) -> Result<EndReason, SessionError> {
        let Self {
            id,
            peer,
            mut reader,
            mut writer,
            closer,
            registry_closer,
            mode,
            mut state,
        } = self;
        let reporter = context.reporter.as_ref();
        let scope = match mode {
            IsolationMode::Private => context.scopes.create_private(id),
            IsolationMode::Shared => context.scopes.shared(),
        };
        let mut teardown = Teardown::new(
            id,
            &mut state,
            &scope,
            &closer,
            context.registry.as_ref(),
            context.scopes.as_ref(),
        );

        let entry = SessionEntry::new(id, scope.mode(), peer).with_closer(registry_closer);
        if let Err(source) = context.registry.add(entry) {
            let error = SessionError::Registration { source };
            reporter.registration_failed(id, &error);
            teardown.finish();
            reporter.session_ended(id, EndReason::Fault);
            return Err(error);
        }
        teardown.registered();
        reporter.session_started(id, scope.mode());

        let outcome = serve(
            id,
            &scope,
            &mut reader,
            &mut writer,
            context.processor.as_ref(),
        );
        teardown.finish();

        match &outcome {
            Ok(reason) => reporter.session_ended(id, *reason),
            Err(error) => {
                reporter.transport_fault(id, error);
                reporter.session_ended(id, EndReason::Fault);
            }
        }
        outcome
    }
}

fn serve(
    id: SessionId,
    scope: &IsolationScope,
    reader: &mut LineReader<ConnectionStream>,
    writer: &mut LineWriter<ConnectionStream>,
    processor: &dyn CommandProcessor,
) -> Result<EndReason, SessionError> {
    loop {
        let command = match reader.read_line() {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(EndReason::EndOfStream),
            Err(LineError::Unterminated { bytes }) => {
                debug!(
                    target: SESSION_TARGET,
                    session = %id,
                    bytes,
                    "discarding unterminated command at end of stream"
                );
                return Ok(EndReason::EndOfStream);
            }
            Err(source) => return Err(SessionError::transport(source)),
        };

        match processor.dispatch(&command, id, scope) {
            Reply::Line(text) => writer.write_line(&text).map_err(SessionError::transport)?,
            Reply::Close => return Ok(EndReason::Closed),
        }
    }
}

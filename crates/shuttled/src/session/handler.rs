//! Glue between the socket listener and the session lifecycle.

use std::panic::{self, AssertUnwindSafe};

use tracing::error;

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::{EndReason, SESSION_TARGET, Session, SessionContext, SessionId};

/// Connection handler running one [`Session`] per accepted connection.
///
/// The listener's accept sequence number becomes the session identity, so
/// each serving thread is named after its session.
#[derive(Debug, Clone)]
pub struct SessionConnectionHandler {
    context: SessionContext,
}

impl SessionConnectionHandler {
    /// Creates a handler serving sessions with `context`.
    #[must_use]
    pub fn new(context: SessionContext) -> Self {
        Self { context }
    }

    /// Collaborators shared by the sessions this handler starts.
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }
}

impl ConnectionHandler for SessionConnectionHandler {
    fn thread_name(&self, sequence: u64) -> String {
        SessionId::new(sequence).to_string()
    }

    fn handle(&self, sequence: u64, stream: ConnectionStream) {
        let id = SessionId::new(sequence);
        let context = &self.context;
        let session = match Session::open(id, stream, context.max_line_bytes()) {
            Ok(session) => session,
            Err(error) => {
                context.reporter().handshake_failed(id, &error);
                return;
            }
        };

        // Teardown already ran while unwinding; only the report is left.
        if panic::catch_unwind(AssertUnwindSafe(|| session.run(context))).is_err() {
            error!(
                target: SESSION_TARGET,
                session = %id,
                "command processor panicked"
            );
            context.reporter().session_ended(id, EndReason::Fault);
        }
    }
}

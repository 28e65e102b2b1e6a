//! Per-connection session bridge.
//!
//! `shuttled` accepts connections on a Unix or TCP socket and runs one
//! session per connection on its own thread. Each session reads a single
//! isolation token, `private` or anything else for shared, then registers in
//! the live session registry and relays command lines to a
//! [`CommandProcessor`] one at a time until the peer hangs up or the
//! processor asks to close. Whatever ends the session, teardown removes it
//! from the registry, discards its private scope and closes the connection
//! exactly once.
//!
//! The process layer loads configuration through `shuttle-config`, installs
//! structured telemetry, binds the listener and waits for a termination
//! signal. On shutdown it stops accepting, closes every live connection via
//! the registry and waits briefly for sessions to drain.

mod bootstrap;
mod dispatch;
mod health;
mod isolation;
mod process;
mod registry;
mod session;
mod telemetry;
mod transport;

pub use bootstrap::{
    Bridge, BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{CommandProcessor, ReferenceProcessor, Reply};
pub use health::{
    HealthReporter, SessionReporter, StructuredHealthReporter, StructuredSessionReporter,
};
pub use isolation::{
    IsolationMode, IsolationScope, Namespace, PRIVATE_TOKEN, ScopeProvider, ScopeTable,
};
pub use process::{
    LaunchError, LaunchPlan, ShutdownError, ShutdownSignal, StopCause, SystemShutdownSignal,
    run_bridge, run_bridge_with,
};
pub use registry::{LiveSessions, RegistryError, SessionEntry, SessionRegistry, SessionSummary};
pub use session::{
    EndReason, HandshakeError, LineError, LineReader, LineWriter, Session,
    SessionConnectionHandler, SessionContext, SessionError, SessionId, SessionState,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{
    ConnectionCloser, ConnectionHandler, ConnectionStream, ListenerError, ListenerHandle,
    SocketListener,
};

#[cfg(test)]
mod tests;

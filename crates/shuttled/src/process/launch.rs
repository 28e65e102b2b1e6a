//! Startup sequencing and orderly shutdown of the bridge.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::dispatch::{CommandProcessor, ReferenceProcessor};
use crate::health::{
    HealthReporter, SessionReporter, StructuredHealthReporter, StructuredSessionReporter,
};
use crate::isolation::ScopeTable;
use crate::registry::{LiveSessions, SessionRegistry};
use crate::session::{SessionConnectionHandler, SessionContext};
use crate::transport::SocketListener;

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

const DRAIN_POLL: Duration = Duration::from_millis(20);

/// Collaborators the bridge runs with.
pub struct LaunchPlan<L, S> {
    /// Resolves configuration.
    pub loader: L,
    /// Blocks until shutdown is requested.
    pub shutdown: S,
    /// Observes bootstrap.
    pub health: Arc<dyn HealthReporter>,
    /// Observes session lifecycles.
    pub sessions: Arc<dyn SessionReporter>,
    /// Handles every command line.
    pub processor: Arc<dyn CommandProcessor>,
}

impl LaunchPlan<SystemConfigLoader, SystemShutdownSignal> {
    /// Production collaborators.
    #[must_use]
    pub fn system() -> Self {
        Self {
            loader: SystemConfigLoader,
            shutdown: SystemShutdownSignal::new(),
            health: Arc::new(StructuredHealthReporter::new()),
            sessions: Arc::new(StructuredSessionReporter::new()),
            processor: Arc::new(ReferenceProcessor::new()),
        }
    }
}

/// Runs the bridge until a termination signal arrives.
pub fn run_bridge() -> Result<(), LaunchError> {
    run_bridge_with(LaunchPlan::system())
}

/// Runs the bridge with injected collaborators.
///
/// Returns after the listener has stopped, every live connection has been
/// closed and the accept thread has been joined.
pub fn run_bridge_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        shutdown,
        health,
        sessions: session_reporter,
        processor,
    } = plan;

    let config = bootstrap_with(&loader, health.as_ref())?.into_config();
    info!(
        target: PROCESS_TARGET,
        socket = %config.listen_socket(),
        "starting bridge"
    );
    let listener = SocketListener::bind(config.listen_socket())?;

    let registry = Arc::new(LiveSessions::new());
    let scopes = Arc::new(ScopeTable::new());
    let context = SessionContext::new(
        registry.clone(),
        scopes.clone(),
        processor,
        session_reporter,
    )
    .with_max_line_bytes(config.max_line_bytes());
    let handle = listener.start(Arc::new(SessionConnectionHandler::new(context)))?;
    info!(target: PROCESS_TARGET, "bridge ready");

    let stop = shutdown.wait();
    match &stop {
        Ok(cause) => info!(target: PROCESS_TARGET, %cause, "shutdown requested"),
        Err(error) => warn!(target: PROCESS_TARGET, %error, "shutdown wait failed; stopping"),
    }

    handle.shutdown();
    let closed = registry.close_all();
    let remaining = drain_sessions(registry.as_ref(), SHUTDOWN_TIMEOUT);
    if remaining > 0 {
        warn!(
            target: PROCESS_TARGET,
            remaining,
            timeout_ms = SHUTDOWN_TIMEOUT.as_millis(),
            "sessions still registered after shutdown budget"
        );
    }
    handle.join()?;
    let cause = stop?;
    info!(
        target: PROCESS_TARGET,
        %cause,
        closed,
        remaining,
        live_private_scopes = scopes.live_private_scopes(),
        "shutdown sequence completed"
    );
    Ok(())
}

/// Waits up to `budget` for every session to deregister; returns the number
/// still registered.
///
/// Sessions accepted before the listener stopped may still be mid-handshake
/// when the first sweep runs, so every poll closes whatever registered since.
fn drain_sessions(registry: &LiveSessions, budget: Duration) -> usize {
    let deadline = Instant::now() + budget;
    loop {
        let remaining = registry.len();
        if remaining == 0 || Instant::now() >= deadline {
            return remaining;
        }
        thread::sleep(DRAIN_POLL);
        registry.close_all();
    }
}

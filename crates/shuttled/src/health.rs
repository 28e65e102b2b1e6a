//! Structured reporting for daemon and session lifecycle events.

use std::sync::Arc;

use shuttle_config::Config;

use crate::bootstrap::BootstrapError;
use crate::isolation::IsolationMode;
use crate::session::{EndReason, SessionError, SessionId};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");
const SESSION_EVENTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Observer trait used to surface bootstrap events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }
}

/// Observer notified as sessions move through their lifecycle.
pub trait SessionReporter: Send + Sync {
    /// The handshake failed; the session never registered.
    fn handshake_failed(&self, session: SessionId, error: &SessionError);

    /// The session registered and is about to serve commands.
    fn session_started(&self, session: SessionId, mode: IsolationMode);

    /// The session finished teardown.
    fn session_ended(&self, session: SessionId, reason: EndReason);

    /// Reading a command or writing a reply failed.
    fn transport_fault(&self, session: SessionId, error: &SessionError);

    /// The registry refused the session.
    fn registration_failed(&self, session: SessionId, error: &SessionError);
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting bridge bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.listen_socket(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            max_line_bytes = config.max_line_bytes(),
            "bridge bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "bridge bootstrap failed"
        );
    }
}

/// Session reporter emitting one structured event per lifecycle step.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredSessionReporter;

impl StructuredSessionReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SessionReporter for StructuredSessionReporter {
    fn handshake_failed(&self, session: SessionId, error: &SessionError) {
        tracing::warn!(
            target: SESSION_EVENTS_TARGET,
            event = "handshake_failed",
            session = %session,
            error = %error,
            "session handshake failed"
        );
    }

    fn session_started(&self, session: SessionId, mode: IsolationMode) {
        tracing::info!(
            target: SESSION_EVENTS_TARGET,
            event = "session_started",
            session = %session,
            mode = %mode,
            "session started"
        );
    }

    fn session_ended(&self, session: SessionId, reason: EndReason) {
        tracing::debug!(
            target: SESSION_EVENTS_TARGET,
            event = "session_ended",
            session = %session,
            reason = %reason,
            "session torn down"
        );
    }

    fn transport_fault(&self, session: SessionId, error: &SessionError) {
        tracing::warn!(
            target: SESSION_EVENTS_TARGET,
            event = "transport_fault",
            session = %session,
            error = %error,
            "session transport fault"
        );
    }

    fn registration_failed(&self, session: SessionId, error: &SessionError) {
        tracing::error!(
            target: SESSION_EVENTS_TARGET,
            event = "registration_failed",
            session = %session,
            error = %error,
            "session registration refused"
        );
    }
}

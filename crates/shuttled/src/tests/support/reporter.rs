//! Recording doubles for the health and session observers.

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use shuttle_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::{HealthReporter, SessionReporter};
use crate::isolation::IsolationMode;
use crate::session::{EndReason, SessionError, SessionId};

/// Bootstrap events observed during a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
}

/// Records bootstrap events in order.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }
}

/// Session lifecycle events observed during a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    HandshakeFailed(SessionId),
    Started(SessionId, IsolationMode),
    Ended(SessionId, EndReason),
    TransportFault(SessionId),
    RegistrationFailed(SessionId),
}

/// Records session events from every session thread.
#[derive(Debug, Default)]
pub struct RecordingSessionReporter {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSessionReporter {
    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .expect("session reporter mutex poisoned")
            .clone()
    }

    /// Events whose `session_ended` report carried `reason`.
    #[must_use]
    pub fn ended_with(&self, reason: EndReason) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, SessionEvent::Ended(_, recorded) if *recorded == reason))
            .count()
    }

    /// Polls until `predicate` holds for the recorded events or `timeout` passes.
    pub fn wait_for(
        &self,
        timeout: Duration,
        predicate: impl Fn(&[SessionEvent]) -> bool,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if predicate(&self.events()) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn record(&self, event: SessionEvent) {
        self.events
            .lock()
            .expect("session reporter mutex poisoned")
            .push(event);
    }
}

impl SessionReporter for RecordingSessionReporter {
    fn handshake_failed(&self, session: SessionId, _error: &SessionError) {
        self.record(SessionEvent::HandshakeFailed(session));
    }

    fn session_started(&self, session: SessionId, mode: IsolationMode) {
        self.record(SessionEvent::Started(session, mode));
    }

    fn session_ended(&self, session: SessionId, reason: EndReason) {
        self.record(SessionEvent::Ended(session, reason));
    }

    fn transport_fault(&self, session: SessionId, _error: &SessionError) {
        self.record(SessionEvent::TransportFault(session));
    }

    fn registration_failed(&self, session: SessionId, _error: &SessionError) {
        self.record(SessionEvent::RegistrationFailed(session));
    }
}

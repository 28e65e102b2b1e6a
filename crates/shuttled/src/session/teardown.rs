use tracing::debug;

use crate::isolation::{IsolationScope, ScopeProvider};
use crate::registry::SessionRegistry;
use crate::transport::ConnectionCloser;

use super::{SESSION_TARGET, SessionId, SessionState};

/// Releases everything a session holds, exactly once.
///
/// Teardown runs when [`Teardown::finish`] is called or, failing that, when the
/// guard drops, which includes unwinding out of a panicking processor.
pub(crate) struct Teardown<'a> {
    id: SessionId,
    registered: bool,
    finished: bool,
    state: &'a mut SessionState,
    scope: &'a IsolationScope,
    closer: &'a ConnectionCloser,
    registry: &'a dyn SessionRegistry,
    scopes: &'a dyn ScopeProvider,
}

impl<'a> Teardown<'a> {
    pub(crate) fn new(
        id: SessionId,
        state: &'a mut SessionState,
        scope: &'a IsolationScope,
        closer: &'a ConnectionCloser,
        registry: &'a dyn SessionRegistry,
        scopes: &'a dyn ScopeProvider,
    ) -> Self {
        Self {
            id,
            registered: false,
            finished: false,
            state,
            scope,
            closer,
            registry,
            scopes,
        }
    }

    /// Records that the registry accepted the session and marks it active.
    ///
    /// Only registered sessions are removed at teardown, so a refused
    /// registration never evicts the entry that caused the refusal.
    pub(crate) fn registered(&mut self) {
        self.registered = true;
        self.state.advance(SessionState::Active);
    }

    pub(crate) fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        if self.registered && self.registry.remove(self.id).is_none() {
            debug!(
                target: SESSION_TARGET,
                session = %self.id,
                "session was already absent from the registry"
            );
        }
        self.scopes.discard(self.scope);
        self.closer.close();
        self.state.advance(SessionState::Terminated);
    }
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

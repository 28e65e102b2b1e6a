//! Behavioural and integration suites for the bridge.

mod session_behaviour;
pub(crate) mod support;

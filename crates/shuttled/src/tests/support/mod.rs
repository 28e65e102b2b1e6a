//! Shared doubles and fixtures for the bridge test suites.

mod config_loader;
mod reporter;
mod world;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter, RecordingSessionReporter, SessionEvent};
pub use world::{ClientOutcome, SessionWorld, WAIT_TIMEOUT, session_world};

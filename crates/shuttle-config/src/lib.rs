//! Layered configuration for the shuttle bridge daemon.
//!
//! Values resolve from built-in defaults, then a TOML file (`--config-path`,
//! `SHUTTLE_CONFIG_PATH` or a discovered `.shuttle.toml`), then `SHUTTLE_*`
//! environment variables, and finally command-line flags.

mod defaults;
mod logging;
mod socket;

use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_LINE_BYTES, DEFAULT_TCP_PORT, default_log_filter,
    default_log_filter_string, default_log_format, default_max_line_bytes,
    default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use ortho_config::{OrthoConfig, OrthoError, OrthoResult};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved runtime configuration for `shuttled`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "SHUTTLE")]
pub struct Config {
    /// Endpoint accepting session connections.
    #[ortho_config(default = default_socket_endpoint())]
    pub listen_socket: SocketEndpoint,
    /// `tracing` filter directive applied to the subscriber.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output encoding for log records.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Largest inbound line a session accepts, terminator included.
    #[ortho_config(default = default_max_line_bytes())]
    pub max_line_bytes: usize,
}

impl Config {
    /// Endpoint accepting session connections.
    #[must_use]
    pub fn listen_socket(&self) -> &SocketEndpoint {
        &self.listen_socket
    }

    /// Filter directive for the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output encoding for log records.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Inbound line limit in bytes.
    #[must_use]
    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_socket: default_socket_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

#[cfg(unix)]
use camino::Utf8PathBuf;
#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// TCP port used when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 9781;

/// Log filter expression applied when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Upper bound on a single inbound line, terminator included.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Directory component placed under the runtime directory.
const SOCKET_NAMESPACE: &str = "shuttle";

/// File name of the bridge socket.
const SOCKET_FILE_NAME: &str = "shuttled.sock";

/// Default log filter expression.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default log filter as an owned string.
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default log output encoding.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default inbound line limit in bytes.
#[must_use]
pub fn default_max_line_bytes() -> usize {
    DEFAULT_MAX_LINE_BYTES
}

/// Computes the socket the bridge listens on when none is configured.
///
/// On Unix this is `$XDG_RUNTIME_DIR/shuttle/shuttled.sock`. Without a runtime
/// directory the socket lives under the temporary directory in a per-user
/// namespace so accounts sharing `/tmp` do not collide.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    default_socket_endpoint_inner()
}

#[cfg(unix)]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    let (mut base, per_user) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push(SOCKET_NAMESPACE);
    if per_user {
        base.push(user_namespace());
    }

    SocketEndpoint::unix(base.join(SOCKET_FILE_NAME))
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(std::env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}

//! Configuration loaders for bootstrap and process scenarios.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoError;
use shuttle_config::{Config, OrthoConfig, SocketEndpoint};
use tempfile::TempDir;

use crate::bootstrap::ConfigLoader;

/// Loader pointing the listen socket into a private temporary directory.
pub struct TestConfigLoader {
    dir: TempDir,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temporary socket directory"),
        }
    }

    /// Socket path inside a not-yet-created subdirectory.
    #[must_use]
    pub fn socket_path(&self) -> Utf8PathBuf {
        let path = self.dir.path().join("run").join("shuttled.sock");
        Utf8PathBuf::from_path_buf(path).expect("temporary socket path is UTF-8")
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            listen_socket: SocketEndpoint::unix(self.socket_path()),
            log_filter: "off".to_owned(),
            ..Config::default()
        })
    }
}

/// Loader that fails because the command line names an unsupported scheme.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter([
            OsString::from("shuttled"),
            OsString::from("--listen-socket"),
            OsString::from("ftp://example.invalid/socket"),
        ])
    }
}

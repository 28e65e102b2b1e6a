//! Running bridge used by the session behaviour scenarios.

use std::cell::RefCell;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use shuttle_config::SocketEndpoint;

use crate::dispatch::ReferenceProcessor;
use crate::isolation::ScopeTable;
use crate::registry::{LiveSessions, SessionRegistry};
use crate::session::{SessionConnectionHandler, SessionContext};
use crate::transport::{ListenerHandle, SocketListener};

use super::reporter::RecordingSessionReporter;

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bridge listening on an ephemeral loopback port with recording observers.
pub struct BridgeWorld {
    pub registry: Arc<LiveSessions>,
    pub scopes: Arc<ScopeTable>,
    pub reporter: Arc<RecordingSessionReporter>,
    address: SocketAddr,
    handle: Option<ListenerHandle>,
}

impl BridgeWorld {
    #[must_use]
    pub fn start() -> Self {
        let registry = Arc::new(LiveSessions::new());
        let scopes = Arc::new(ScopeTable::new());
        let reporter = Arc::new(RecordingSessionReporter::default());
        let context = SessionContext::new(
            registry.clone(),
            scopes.clone(),
            Arc::new(ReferenceProcessor::new()),
            reporter.clone(),
        );
        let listener = SocketListener::bind(&SocketEndpoint::tcp("127.0.0.1", 0))
            .expect("bind loopback listener");
        let address = listener.local_addr().expect("loopback address");
        let handle = listener
            .start(Arc::new(SessionConnectionHandler::new(context)))
            .expect("start listener");
        Self {
            registry,
            scopes,
            reporter,
            address,
            handle: Some(handle),
        }
    }

    /// Opens a client and sends its isolation token.
    #[must_use]
    pub fn connect(&self, token: &str) -> Client {
        let mut stream = TcpStream::connect(self.address).expect("connect client");
        stream
            .set_read_timeout(Some(WAIT_TIMEOUT))
            .expect("client read timeout");
        stream
            .write_all(format!("{token}\n").as_bytes())
            .expect("send token");
        Client::new(stream)
    }

    /// Opens a client without sending anything.
    #[must_use]
    pub fn connect_raw(&self) -> Client {
        let stream = TcpStream::connect(self.address).expect("connect client");
        stream
            .set_read_timeout(Some(WAIT_TIMEOUT))
            .expect("client read timeout");
        Client::new(stream)
    }

    /// Polls until the registry holds exactly `expected` sessions.
    pub fn wait_for_registered(&self, expected: usize) -> bool {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        loop {
            if self.registry.len() == expected {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for BridgeWorld {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown();
            self.registry.close_all();
            let _ = handle.join();
        }
    }
}

/// Line-oriented client connection.
pub struct Client {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl Client {
    fn new(stream: TcpStream) -> Self {
        let reader = BufReader::new(stream.try_clone().expect("clone client stream"));
        Self {
            writer: stream,
            reader,
        }
    }

    /// Writes raw bytes without framing.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).expect("send bytes");
    }

    /// Sends one command line.
    pub fn send(&mut self, command: &str) {
        self.send_raw(format!("{command}\n").as_bytes());
    }

    /// Reads one reply line without its terminator, or `None` at end of stream.
    pub fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).expect("read reply");
        if read == 0 {
            return None;
        }
        Some(line.trim_end_matches('\n').to_owned())
    }

    /// Sends `command` and returns the reply line.
    pub fn request(&mut self, command: &str) -> Option<String> {
        self.send(command);
        self.read_line()
    }

    /// Reads everything until the bridge closes the connection.
    pub fn read_to_end(&mut self) -> String {
        let mut rest = String::new();
        self.reader.read_to_string(&mut rest).expect("read to end");
        rest
    }

    /// Closes both directions of the connection.
    pub fn hang_up(self) {
        let _ = self.writer.shutdown(Shutdown::Both);
    }
}

/// Outcome of one client in the concurrent isolation scenario.
#[derive(Debug)]
pub struct ClientOutcome {
    pub index: usize,
    pub defined: Option<String>,
    pub resolved: Option<String>,
    pub after_bye: String,
}

impl ClientOutcome {
    /// The client defined, resolved its own value, then saw a silent close.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.defined.as_deref() == Some("ok")
            && self.resolved.as_deref() == Some(format!("value-{}", self.index).as_str())
            && self.after_bye.is_empty()
    }
}

/// Scenario state shared by the session behaviour suites.
pub struct SessionWorld {
    pub bridge: BridgeWorld,
    pub client: Option<Client>,
    pub definers: Vec<Client>,
    pub reply: Option<String>,
    pub peak_registered: bool,
    pub outcomes: Vec<ClientOutcome>,
}

impl SessionWorld {
    /// The most recently connected client.
    pub fn client(&mut self) -> &mut Client {
        self.client.as_mut().expect("no client connected")
    }
}

/// Fresh scenario state around a newly started bridge.
#[must_use]
pub fn session_world() -> RefCell<SessionWorld> {
    RefCell::new(SessionWorld {
        bridge: BridgeWorld::start(),
        client: None,
        definers: Vec::new(),
        reply: None,
        peak_registered: false,
        outcomes: Vec::new(),
    })
}

// Bridge Session Pool: one logical TCP session per username toward the Game
// Server, with a decoded-frame fan-out any number of consumers can read
// from (SSE writers, one-shot HTTP correlations).

use crate::domain::SubscribeError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

const FANOUT_CAPACITY: usize = 256;
pub const REGISTER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum ConnectError {
    Io(std::io::Error),
    Subscribe(SubscribeError),
}

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectError::Io(err) => write!(f, "failed to reach game server: {err}"),
            ConnectError::Subscribe(err) => write!(f, "registration failed: {err}"),
        }
    }
}

impl std::error::Error for ConnectError {}

/// One TCP connection to the Game Server, registered under a single
/// username. Decoded inbound frames are fanned out on `frames_tx`; the
/// `connected` flag flips false the moment the reader task observes EOF or
/// an error, which is what `BridgeSessionPool::connect` checks to decide
/// reuse vs. replace.
pub struct BridgeSession {
    writer: Mutex<OwnedWriteHalf>,
    frames_tx: broadcast::Sender<Value>,
    connected: Arc<AtomicBool>,
}

impl BridgeSession {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub async fn send(&self, value: &Value) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(value).expect("outbound frame always serializes");
        line.push(b'\n');
        self.writer.lock().await.write_all(&line).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Value> {
        self.frames_tx.subscribe()
    }

    /// Waits (up to `timeout`) for the first frame matching `predicate` on
    /// an already-subscribed receiver.
    ///
    /// Callers MUST create `rx` via `subscribe()` before sending whatever
    /// request is expected to trigger the reply. A `broadcast::Receiver`
    /// only sees messages sent after it was created, so subscribing after
    /// the send races the game server's reader task: a fast reply can be
    /// fanned out (and dropped, since `frames_tx.send` silently drops a
    /// frame when nobody is subscribed yet) before this receiver exists.
    pub async fn await_reply(
        mut rx: broadcast::Receiver<Value>,
        timeout: Duration,
        predicate: impl Fn(&Value) -> bool,
    ) -> Result<Value, SubscribeError> {
        let wait = async {
            loop {
                match rx.recv().await {
                    Ok(value) if predicate(&value) => return Ok(value),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "bridge session fan-out lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(SubscribeError::SessionClosed)
                    }
                }
            }
        };
        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(SubscribeError::Timeout),
        }
    }
}

/// Maps username -> BridgeSession.
#[derive(Default)]
pub struct BridgeSessionPool {
    sessions: Mutex<HashMap<String, Arc<BridgeSession>>>,
    game_server_addr: String,
}

impl BridgeSessionPool {
    pub fn new(game_server_addr: String) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            game_server_addr,
        }
    }

    pub async fn get(&self, username: &str) -> Option<Arc<BridgeSession>> {
        self.sessions.lock().await.get(username).cloned()
    }

    /// Reuses an existing connected session, replaces a stale one, or
    /// creates a fresh one; only returns once REGISTER_OK has been observed
    /// for `username`.
    pub async fn connect(&self, username: &str) -> Result<Arc<BridgeSession>, ConnectError> {
        if let Some(existing) = self.get(username).await {
            if existing.is_connected() {
                return Ok(existing);
            }
            debug!(username, "replacing stale bridge session");
        }

        let session = self.establish(username).await?;
        self.sessions
            .lock()
            .await
            .insert(username.to_string(), session.clone());
        Ok(session)
    }

    async fn establish(&self, username: &str) -> Result<Arc<BridgeSession>, ConnectError> {
        let stream = TcpStream::connect(&self.game_server_addr)
            .await
            .map_err(ConnectError::Io)?;
        let (read_half, write_half) = stream.into_split();
        let (frames_tx, _) = broadcast::channel(FANOUT_CAPACITY);
        let connected = Arc::new(AtomicBool::new(true));

        tokio::spawn(run_reader(
            BufReader::new(read_half),
            frames_tx.clone(),
            connected.clone(),
            username.to_string(),
        ));

        let session = Arc::new(BridgeSession {
            writer: Mutex::new(write_half),
            frames_tx,
            connected,
        });

        let rx = session.subscribe();
        session
            .send(&serde_json::json!({"type": "REGISTER", "username": username}))
            .await
            .map_err(ConnectError::Io)?;

        let expected = username.to_string();
        BridgeSession::await_reply(rx, REGISTER_TIMEOUT, move |frame| {
            frame.get("type").and_then(|t| t.as_str()) == Some("REGISTER_OK")
                && frame.get("username").and_then(|u| u.as_str()) == Some(expected.as_str())
        })
        .await
        .map_err(ConnectError::Subscribe)?;

        Ok(session)
    }
}

async fn run_reader(
    mut reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    frames_tx: broadcast::Sender<Value>,
    connected: Arc<AtomicBool>,
    username: String,
) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!(username, "game server closed session");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(value) => {
                        let _ = frames_tx.send(value);
                    }
                    Err(err) => {
                        warn!(username, error = %err, "dropping malformed frame from game server");
                    }
                }
            }
            Err(err) => {
                warn!(username, error = %err, "read error from game server");
                break;
            }
        }
    }
    connected.store(false, Ordering::Release);
}

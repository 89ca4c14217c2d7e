// Shared primitives for one-time server bootstrapping across integration tests.
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

static SERVER_ADDR: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

/// Ensures the test server is running and returns its `host:port`.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_addr = Arc::new(OnceLock::<String>::new());
        let published_addr_thread = Arc::clone(&published_addr);
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_addr_thread.set(addr.to_string());
                game_server::run(listener).await.expect("server failed");
            });
        });
        wait_for_readiness(published_addr);
    });

    SERVER_ADDR.get().expect("server addr should be initialized").as_str()
}

fn wait_for_readiness(published_addr: Arc<OnceLock<String>>) {
    let addr = loop {
        if let Some(addr) = published_addr.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };
    let _ = SERVER_ADDR.set(addr.clone());

    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server did not become ready in time");
}

/// A single client connection: wraps the raw newline-delimited JSON protocol
/// behind small send/recv helpers so scenario tests read like a transcript.
pub struct TestClient {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect() -> Self {
        let addr = ensure_server();
        let stream = TcpStream::connect(addr).await.expect("connect to test server");
        let (read_half, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer,
        }
    }

    pub async fn send(&mut self, value: serde_json::Value) {
        let mut line = serde_json::to_vec(&value).expect("serialize test frame");
        line.push(b'\n');
        self.writer.write_all(&line).await.expect("write test frame");
    }

    pub async fn recv(&mut self) -> serde_json::Value {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .await
            .expect("read test frame");
        assert!(n > 0, "connection closed unexpectedly while awaiting a frame");
        serde_json::from_str(line.trim()).expect("test frame should be valid json")
    }

    /// Reads frames until one whose `type` matches `expected_type`, discarding
    /// any unrelated frames this connection wasn't waiting on (e.g. a chat
    /// broadcast interleaved with the reply a test cares about).
    pub async fn recv_type(&mut self, expected_type: &str) -> serde_json::Value {
        loop {
            let frame = self.recv().await;
            if frame.get("type").and_then(|t| t.as_str()) == Some(expected_type) {
                return frame;
            }
        }
    }
}

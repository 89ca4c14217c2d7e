// Frame Codec: newline-delimited JSON over a byte stream.
//
// A frame is one line. Blank lines are dropped. A line that doesn't start
// with `{` or `[` is silently ignored (keeps the connection alive against
// stray whitespace or keepalive bytes without risking a malformed-JSON log
// storm). A line that looks like an HTTP request (`GET `, `POST `, `HEAD `)
// terminates the connection outright — it's almost certainly a stray health
// prober or browser hitting the raw port, not a client of this protocol.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tracing::debug;

pub enum Frame {
    Message(Value),
    /// Line decoded but wasn't valid JSON or didn't parse as an object/array;
    /// skip it and keep reading.
    Skip,
    /// Looked like an HTTP request; caller should close the connection.
    HttpProbe,
}

const HTTP_PREFIXES: &[&str] = &["GET ", "POST ", "HEAD ", "PUT ", "DELETE ", "OPTIONS "];

pub struct FrameReader {
    lines: BufReader<OwnedReadHalf>,
}

impl FrameReader {
    pub fn new(read_half: OwnedReadHalf) -> Self {
        Self {
            lines: BufReader::new(read_half),
        }
    }

    /// Reads the next frame. `Ok(None)` means clean EOF.
    pub async fn next_frame(&mut self) -> std::io::Result<Option<Frame>> {
        let mut line = String::new();
        let bytes_read = self.lines.read_line(&mut line).await?;
        if bytes_read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Some(Frame::Skip));
        }
        if HTTP_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            return Ok(Some(Frame::HttpProbe));
        }
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return Ok(Some(Frame::Skip));
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) if value.is_object() || value.is_array() => Ok(Some(Frame::Message(value))),
            Ok(_) => Ok(Some(Frame::Skip)),
            Err(err) => {
                debug!(error = %err, "dropping malformed frame");
                Ok(Some(Frame::Skip))
            }
        }
    }
}

// Per-connection bootstrap and run loop. One task per accepted socket reads
// frames and feeds them to the Dispatcher; a second, implicit, path is the
// connection's outbox channel, drained concurrently via `tokio::select!` so
// a slow reader never blocks broadcasts meant for other connections.

use crate::interface_adapters::codec::{Frame, FrameReader};
use crate::interface_adapters::state::AppState;
use crate::use_cases::connections::ConnId;
use crate::use_cases::dispatcher::Dispatcher;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

fn next_conn_id() -> ConnId {
    NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed)
}

enum LoopControl {
    Continue,
    Disconnect,
}

/// Owns one accepted socket end-to-end: registers the connection, runs the
/// read/write loop, and always de-registers on the way out. A disconnect is
/// never treated as EXIT_GAME — the Game Registry is untouched here.
pub async fn handle_connection(stream: TcpStream, state: Arc<AppState>) {
    let conn_id = next_conn_id();
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = FrameReader::new(read_half);
    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<Value>();

    state.connections.register(conn_id, outbox_tx).await;
    info!(conn_id, peer, "connection accepted");

    loop {
        let control = tokio::select! {
            frame = reader.next_frame() => {
                match frame {
                    Ok(Some(Frame::Message(value))) => {
                        let dispatcher = Dispatcher::new(&state.registry, &state.connections);
                        dispatcher.handle_message(conn_id, value).await;
                        LoopControl::Continue
                    }
                    Ok(Some(Frame::Skip)) => LoopControl::Continue,
                    Ok(Some(Frame::HttpProbe)) => {
                        debug!(conn_id, "http-prefixed line; closing connection");
                        LoopControl::Disconnect
                    }
                    Ok(None) => LoopControl::Disconnect,
                    Err(err) => {
                        warn!(conn_id, error = %err, "read error; closing connection");
                        LoopControl::Disconnect
                    }
                }
            }

            outgoing = outbox_rx.recv() => {
                match outgoing {
                    Some(value) => {
                        match write_frame(&mut write_half, &value).await {
                            Ok(()) => LoopControl::Continue,
                            Err(err) => {
                                warn!(conn_id, error = %err, "write error; closing connection");
                                LoopControl::Disconnect
                            }
                        }
                    }
                    None => LoopControl::Continue,
                }
            }
        };

        if matches!(control, LoopControl::Disconnect) {
            break;
        }
    }

    state.connections.deregister(conn_id).await;
    let _ = write_half.shutdown().await;
    info!(conn_id, "connection closed");
}

async fn write_frame(
    write_half: &mut tokio::net::tcp::OwnedWriteHalf,
    value: &Value,
) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(value).expect("outbound frames always serialize");
    line.push(b'\n');
    write_half.write_all(&line).await
}

/// Runs the ended-game TTL sweep on a timer, as an optional supplement to
/// the per-LIST_GAMES sweep.
pub async fn run_ttl_sweeper(state: Arc<AppState>, interval: std::time::Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        state.registry.sweep_ended(Instant::now()).await;
    }
}

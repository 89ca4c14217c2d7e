use crate::interface_adapters::state::AppState;
use axum::extract::{Query, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub username: String,
}

type BoxedSseStream = Pin<Box<dyn Stream<Item = Result<SseEvent, Infallible>> + Send>>;

/// GET /api/events?username=… — every frame observed on that user's
/// BridgeSession is re-emitted as an SSE `data:` line.
pub async fn events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Sse<BoxedSseStream> {
    match state.session_pool.connect(&query.username).await {
        Ok(session) => {
            let rx = session.subscribe();
            let stream = BroadcastStream::new(rx).filter_map(|result| async move {
                result
                    .ok()
                    .map(|frame| Ok(SseEvent::default().data(frame.to_string())))
            });
            Sse::new(Box::pin(stream) as BoxedSseStream).keep_alive(KeepAlive::default())
        }
        Err(err) => {
            let message = err.to_string();
            let stream = stream::once(async move {
                Ok(SseEvent::default()
                    .event("error")
                    .data(serde_json::json!({"error": message}).to_string()))
            });
            Sse::new(Box::pin(stream) as BoxedSseStream).keep_alive(KeepAlive::default())
        }
    }
}

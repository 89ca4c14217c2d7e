use crate::interface_adapters::protocol::{
    ChatRequest, ConnectRequest, CreateGameRequest, GameIdRequest, JoinGameRequest,
    NotConnectedResponse, OkResponse, SendAnswerRequest, StartGameRequest, SubmitQuestionRequest,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::session_pool::BridgeSession;
use crate::use_cases::username::resolve_username;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const CORRELATION_TIMEOUT: Duration = Duration::from_secs(5);

async fn resolve_or_reject(
    state: &AppState,
    body_username: Option<&str>,
    headers: &HeaderMap,
) -> Result<String, (StatusCode, Json<Value>)> {
    resolve_username(body_username, headers, &*state.auth)
        .await
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                json_err("username could not be resolved"),
            )
        })
}

async fn existing_session(
    state: &AppState,
    username: &str,
) -> Result<Arc<BridgeSession>, (StatusCode, Json<Value>)> {
    state.session_pool.get(username).await.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::to_value(NotConnectedResponse::not_connected()).unwrap()),
        )
    })
}

async fn send(session: &BridgeSession, message: Value) -> Result<(), (StatusCode, Json<Value>)> {
    session.send(&message).await.map_err(|err| {
        tracing::warn!(error = %err, "failed to write to game server session");
        (StatusCode::INTERNAL_SERVER_ERROR, json_err(&err.to_string()))
    })
}

/// Waits on a receiver the caller must have created (via `session.subscribe()`)
/// *before* sending the request that is expected to trigger this reply — see
/// `BridgeSession::await_reply` for why subscribing after the send races the
/// game server's reply.
async fn await_reply(
    rx: broadcast::Receiver<Value>,
    msg_type: &'static str,
    predicate: impl Fn(&Value) -> bool + Send,
) -> Result<Value, (StatusCode, Json<Value>)> {
    BridgeSession::await_reply(rx, CORRELATION_TIMEOUT, move |frame| {
        frame.get("type").and_then(|t| t.as_str()) == Some(msg_type) && predicate(frame)
    })
    .await
    .map_err(|err| {
        tracing::warn!(error = %err, awaited = msg_type, "correlated bridge request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json_err(&format!("timed out waiting for {msg_type}")),
        )
    })
}

fn json_err(message: &str) -> Json<Value> {
    Json(json!({"ok": false, "error": message}))
}

pub async fn connect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ConnectRequest>,
) -> Result<Json<OkResponse>, (StatusCode, Json<Value>)> {
    let username = resolve_or_reject(&state, body.username.as_deref(), &headers).await?;
    state.session_pool.connect(&username).await.map_err(|err| {
        tracing::warn!(username = %username, error = %err, "connect failed");
        (StatusCode::INTERNAL_SERVER_ERROR, json_err(&err.to_string()))
    })?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn list_games(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ConnectRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let username = resolve_or_reject(&state, body.username.as_deref(), &headers).await?;
    let session = existing_session(&state, &username).await?;
    let rx = session.subscribe();
    send(&session, json!({"type": "LIST_GAMES", "username": username})).await?;
    let frame = await_reply(rx, "GAMES_LIST", |_| true).await?;
    Ok(Json(json!({"success": true, "games": frame["games"]})))
}

pub async fn create_game(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateGameRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let username = resolve_or_reject(&state, body.username.as_deref(), &headers).await?;
    let session = existing_session(&state, &username).await?;

    let mut message = body.rest;
    if !message.is_object() {
        message = json!({});
    }
    message["type"] = json!("CREATE_GAME");
    message["username"] = json!(username);

    let rx = session.subscribe();
    send(&session, message).await?;
    let frame = await_reply(rx, "GAME_CREATED", |_| true).await?;
    Ok(Json(json!({"success": true, "game": frame["game"]})))
}

pub async fn join_game(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<JoinGameRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let username = resolve_or_reject(&state, body.username.as_deref(), &headers).await?;
    let session = existing_session(&state, &username).await?;

    let pin = body.game_id;
    let rx = session.subscribe();
    send(
        &session,
        json!({"type": "JOIN_GAME", "pin": pin, "username": username}),
    )
    .await?;

    let expected_pin = pin.clone();
    let frame = await_reply(rx, "JOINED_GAME", move |frame| {
        frame
            .get("game")
            .and_then(|g| g.get("pin"))
            .and_then(|p| p.as_str())
            == Some(expected_pin.as_str())
    })
    .await?;
    Ok(Json(json!({"ok": true, "game": frame["game"]})))
}

pub async fn start_game(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<StartGameRequest>,
) -> Result<Json<OkResponse>, (StatusCode, Json<Value>)> {
    let username = resolve_or_reject(&state, body.username.as_deref(), &headers).await?;
    let session = existing_session(&state, &username).await?;
    send(
        &session,
        json!({"type": "START_GAME", "pin": body.pin, "username": username}),
    )
    .await?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn exit_game(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<GameIdRequest>,
) -> Result<Json<OkResponse>, (StatusCode, Json<Value>)> {
    let username = resolve_or_reject(&state, body.username.as_deref(), &headers).await?;
    let session = existing_session(&state, &username).await?;
    send(
        &session,
        json!({"type": "EXIT_GAME", "pin": body.game_id, "username": username}),
    )
    .await?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn send_answer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SendAnswerRequest>,
) -> Result<Json<OkResponse>, (StatusCode, Json<Value>)> {
    let username = resolve_or_reject(&state, body.username.as_deref(), &headers).await?;
    let session = existing_session(&state, &username).await?;
    send(
        &session,
        json!({
            "type": "ANSWER",
            "pin": body.game_id,
            "correct": body.answer,
            "username": username,
        }),
    )
    .await?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn next_question(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<GameIdRequest>,
) -> Result<Json<OkResponse>, (StatusCode, Json<Value>)> {
    let username = resolve_or_reject(&state, body.username.as_deref(), &headers).await?;
    let session = existing_session(&state, &username).await?;
    send(
        &session,
        json!({"type": "NEXT_QUESTION", "pin": body.game_id, "username": username}),
    )
    .await?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn end_game(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<GameIdRequest>,
) -> Result<Json<OkResponse>, (StatusCode, Json<Value>)> {
    let username = resolve_or_reject(&state, body.username.as_deref(), &headers).await?;
    let session = existing_session(&state, &username).await?;
    send(
        &session,
        json!({"type": "END_GAME", "pin": body.game_id, "username": username}),
    )
    .await?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn submit_question(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SubmitQuestionRequest>,
) -> Result<Json<OkResponse>, (StatusCode, Json<Value>)> {
    let username = resolve_or_reject(&state, body.username.as_deref(), &headers).await?;
    let session = existing_session(&state, &username).await?;
    send(
        &session,
        json!({
            "type": "SUBMIT_QUESTION",
            "pin": body.pin,
            "question": body.question,
            "answerTrue": body.answer_true,
            "username": username,
        }),
    )
    .await?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Result<Json<OkResponse>, (StatusCode, Json<Value>)> {
    let username = resolve_or_reject(&state, body.username.as_deref(), &headers).await?;
    let session = existing_session(&state, &username).await?;
    send(
        &session,
        json!({"type": "CHAT", "pin": body.pin, "message": body.message, "username": username}),
    )
    .await?;
    Ok(Json(OkResponse { ok: true }))
}

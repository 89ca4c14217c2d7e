// Wire protocol: inbound frames stay as loosely-typed `serde_json::Value`
// (the spec's coercion rules for `correct`/`answerTrue` don't fit a derived
// `Deserialize` cleanly), outbound frames are typed DTOs serialized with
// `#[serde(tag = "type")]` so the shape on the wire is a flat JSON object.

use crate::domain::{Game, GameState, Question};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

pub fn message_type(v: &Value) -> Option<&str> {
    v.get("type")?.as_str()
}

pub fn field_str<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key)?.as_str()
}

pub fn field_usize(v: &Value, key: &str) -> Option<usize> {
    v.get(key)?.as_u64().map(|n| n as usize)
}

/// Strict boolean coercion used for `correct`: accepts `true`, `"true"`,
/// `1`, `"1"`; everything else is `false`.
pub fn coerce_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true" || s == "1",
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

pub fn field_bool_coerced(v: &Value, key: &str) -> bool {
    v.get(key).map(coerce_bool).unwrap_or(false)
}

/// Plain JS-style truthiness, used for `answerTrue`.
pub fn coerce_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn field_truthy(v: &Value, key: &str) -> bool {
    v.get(key).map(coerce_truthy).unwrap_or(false)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GameStateDto {
    Lobby,
    InProgress,
    Ended,
}

impl From<GameState> for GameStateDto {
    fn from(s: GameState) -> Self {
        match s {
            GameState::Lobby => GameStateDto::Lobby,
            GameState::InProgress => GameStateDto::InProgress,
            GameState::Ended => GameStateDto::Ended,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub author: String,
    pub text: String,
    pub answer_true: bool,
}

impl From<&Question> for QuestionDto {
    fn from(q: &Question) -> Self {
        Self {
            author: q.author.clone(),
            text: q.text.clone(),
            answer_true: q.answer_true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDto {
    pub pin: String,
    pub host: String,
    pub state: GameStateDto,
    pub theme: String,
    pub is_public: bool,
    pub max_players: usize,
    pub players: Vec<String>,
    pub scores: HashMap<String, u32>,
    pub questions: Vec<QuestionDto>,
    pub current_question_index: usize,
}

impl From<&Game> for GameDto {
    fn from(g: &Game) -> Self {
        Self {
            pin: g.pin.clone(),
            host: g.host.clone(),
            state: g.state.into(),
            theme: g.theme.clone(),
            is_public: g.is_public,
            max_players: g.max_players,
            players: g.players.clone(),
            scores: g.scores.clone(),
            questions: g.questions.iter().map(QuestionDto::from).collect(),
            current_question_index: g.current_question_index,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "REGISTER_OK")]
    RegisterOk { username: String },
    #[serde(rename = "GAMES_LIST")]
    GamesList { games: Vec<GameDto> },
    #[serde(rename = "GAME_CREATED")]
    GameCreated { game: GameDto },
    #[serde(rename = "JOINED_GAME")]
    JoinedGame { game: GameDto },
    #[serde(rename = "PLAYER_JOINED")]
    PlayerJoined { pin: String, game: GameDto },
    #[serde(rename = "PLAYER_LEFT")]
    PlayerLeft { pin: String, game: GameDto },
    #[serde(rename = "QUESTION_SUBMITTED")]
    QuestionSubmitted {
        pin: String,
        username: String,
        question: String,
        #[serde(rename = "answerTrue")]
        answer_true: bool,
    },
    #[serde(rename = "GAME_STARTED")]
    GameStarted { pin: String, game: GameDto },
    #[serde(rename = "SCORE_UPDATE")]
    ScoreUpdate {
        pin: String,
        game: GameDto,
        #[serde(rename = "answeredBy")]
        answered_by: String,
        correct: bool,
        duplicate: bool,
    },
    #[serde(rename = "NEXT_QUESTION")]
    NextQuestion { pin: String, game: GameDto },
    #[serde(rename = "GAME_ENDED")]
    GameEnded { pin: String, game: GameDto },
    #[serde(rename = "CHAT")]
    Chat {
        pin: String,
        from: String,
        message: String,
    },
    #[serde(rename = "ERROR")]
    Error { message: String },
}

impl ServerMessage {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("ServerMessage always serializes")
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

// Auth-proxy endpoints (signup/login/me/scoreboard/awardWinner) reuse the
// domain DTOs directly since their HTTP shape matches the user-store
// contract exactly. This module holds the shapes specific to the bridge's
// own game-op surface.

#[derive(Debug, Deserialize)]
pub struct AwardWinnerRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct NotConnectedResponse {
    pub ok: bool,
    pub error: String,
}

impl NotConnectedResponse {
    pub fn not_connected() -> Self {
        Self {
            ok: false,
            error: "Not connected".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub username: Option<String>,
    #[serde(flatten)]
    pub rest: Value,
}

#[derive(Debug, Deserialize)]
pub struct JoinGameRequest {
    pub username: Option<String>,
    #[serde(rename = "gameId")]
    pub game_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StartGameRequest {
    pub username: Option<String>,
    pub pin: String,
}

#[derive(Debug, Deserialize)]
pub struct GameIdRequest {
    pub username: Option<String>,
    #[serde(rename = "gameId")]
    pub game_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SendAnswerRequest {
    pub username: Option<String>,
    #[serde(rename = "gameId")]
    pub game_id: String,
    pub answer: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubmitQuestionRequest {
    pub username: Option<String>,
    pub pin: String,
    pub question: String,
    #[serde(rename = "answerTrue")]
    pub answer_true: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub username: Option<String>,
    pub pin: String,
    pub message: String,
}

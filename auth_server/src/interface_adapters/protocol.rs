use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct ScoreboardResponse {
    pub leaders: Vec<ScoreboardEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreboardEntry {
    pub username: String,
    pub wins: i64,
}

#[derive(Debug, Deserialize)]
pub struct AwardWinnerRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct AwardWinnerResponse {
    pub ok: bool,
}

// Error envelope for JSON responses; keyed `error` to match the bridge's
// proxied error bodies.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// Payloads exchanged with the user store. The bridge never talks to the
// database directly — it proxies these over HTTP to `auth_server`.

#[derive(Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignupResponse {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
}

#[derive(Deserialize)]
pub struct MeResponse {
    pub user: UserDto,
}

#[derive(Deserialize)]
pub struct ScoreboardResponse {
    pub leaders: Vec<ScoreboardEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreboardEntry {
    pub username: String,
    pub wins: i64,
}

#[derive(Debug)]
pub enum AuthProviderError {
    Conflict,
    Unauthorized,
    NotFound,
    Upstream(String),
}

impl std::fmt::Display for AuthProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthProviderError::Conflict => write!(f, "username already taken"),
            AuthProviderError::Unauthorized => write!(f, "invalid credentials or token"),
            AuthProviderError::NotFound => write!(f, "user not found"),
            AuthProviderError::Upstream(msg) => write!(f, "auth service error: {msg}"),
        }
    }
}

impl std::error::Error for AuthProviderError {}

/// Dependency boundary the HTTP handlers depend on, not the concrete
/// `reqwest` client. Lets tests inject a fake implementation.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn signup(&self, req: SignupRequest) -> Result<SignupResponse, AuthProviderError>;
    async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AuthProviderError>;
    async fn me(&self, token: &str) -> Result<MeResponse, AuthProviderError>;
    async fn scoreboard(&self) -> Result<ScoreboardResponse, AuthProviderError>;
    async fn award_winner(&self, username: &str) -> Result<(), AuthProviderError>;
}

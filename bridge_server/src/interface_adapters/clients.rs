use crate::domain::{
    AuthProvider, AuthProviderError, LoginRequest, LoginResponse, MeResponse, ScoreboardResponse,
    SignupRequest, SignupResponse,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

// The clients defined here are for reqwest clients to communicate with external services.
// Thin wrapper around reqwest for auth service calls.
#[derive(Clone)]
pub struct AuthClient {
    http: Client,
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
struct AuthServerErrorBody {
    error: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn error_for_status(&self, status: StatusCode, body: reqwest::Response) -> AuthProviderError {
        let message = body
            .json::<AuthServerErrorBody>()
            .await
            .ok()
            .map(|payload| payload.error)
            .unwrap_or_else(|| status.to_string());

        match status {
            StatusCode::CONFLICT => AuthProviderError::Conflict,
            StatusCode::UNAUTHORIZED => AuthProviderError::Unauthorized,
            StatusCode::NOT_FOUND => AuthProviderError::NotFound,
            _ => AuthProviderError::Upstream(message),
        }
    }
}

#[async_trait]
impl AuthProvider for AuthClient {
    async fn signup(&self, req: SignupRequest) -> Result<SignupResponse, AuthProviderError> {
        let url = format!("{}/auth/signup", self.base_url);
        let res = self
            .http
            .post(url)
            .json(&req)
            .send()
            .await
            .map_err(|err| AuthProviderError::Upstream(err.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(self.error_for_status(status, res).await);
        }
        res.json::<SignupResponse>()
            .await
            .map_err(|err| AuthProviderError::Upstream(err.to_string()))
    }

    async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AuthProviderError> {
        let url = format!("{}/auth/login", self.base_url);
        let res = self
            .http
            .post(url)
            .json(&req)
            .send()
            .await
            .map_err(|err| AuthProviderError::Upstream(err.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(self.error_for_status(status, res).await);
        }
        res.json::<LoginResponse>()
            .await
            .map_err(|err| AuthProviderError::Upstream(err.to_string()))
    }

    async fn me(&self, token: &str) -> Result<MeResponse, AuthProviderError> {
        let url = format!("{}/auth/me", self.base_url);
        let res = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| AuthProviderError::Upstream(err.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(self.error_for_status(status, res).await);
        }
        res.json::<MeResponse>()
            .await
            .map_err(|err| AuthProviderError::Upstream(err.to_string()))
    }

    async fn scoreboard(&self) -> Result<ScoreboardResponse, AuthProviderError> {
        let url = format!("{}/auth/scoreboard", self.base_url);
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| AuthProviderError::Upstream(err.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(self.error_for_status(status, res).await);
        }
        res.json::<ScoreboardResponse>()
            .await
            .map_err(|err| AuthProviderError::Upstream(err.to_string()))
    }

    async fn award_winner(&self, username: &str) -> Result<(), AuthProviderError> {
        let url = format!("{}/auth/award-winner", self.base_url);
        let res = self
            .http
            .post(url)
            .json(&serde_json::json!({"username": username}))
            .send()
            .await
            .map_err(|err| AuthProviderError::Upstream(err.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(self.error_for_status(status, res).await);
        }
        Ok(())
    }
}

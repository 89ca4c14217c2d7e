use crate::domain::{
    AuthProviderError, LoginRequest, LoginResponse, MeResponse, ScoreboardResponse, SignupRequest,
    SignupResponse,
};
use crate::interface_adapters::protocol::{AwardWinnerRequest, ErrorBody, OkResponse};
use crate::interface_adapters::state::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use std::sync::Arc;

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), (StatusCode, Json<ErrorBody>)> {
    let res = state.auth.signup(body).await.map_err(map_auth_error)?;
    Ok((StatusCode::CREATED, Json(res)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorBody>)> {
    let res = state.auth.login(body).await.map_err(map_auth_error)?;
    Ok(Json(res))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, (StatusCode, Json<ErrorBody>)> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    error: "missing bearer token".to_string(),
                }),
            )
        })?;

    let res = state.auth.me(token).await.map_err(map_auth_error)?;
    Ok(Json(res))
}

pub async fn scoreboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ScoreboardResponse>, (StatusCode, Json<ErrorBody>)> {
    let res = state.auth.scoreboard().await.map_err(map_auth_error)?;
    Ok(Json(res))
}

pub async fn award_winner(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AwardWinnerRequest>,
) -> Result<Json<OkResponse>, (StatusCode, Json<ErrorBody>)> {
    state
        .auth
        .award_winner(&body.username)
        .await
        .map_err(map_auth_error)?;
    Ok(Json(OkResponse { ok: true }))
}

fn map_auth_error(err: AuthProviderError) -> (StatusCode, Json<ErrorBody>) {
    let status = match err {
        AuthProviderError::Conflict => StatusCode::CONFLICT,
        AuthProviderError::Unauthorized => StatusCode::UNAUTHORIZED,
        AuthProviderError::NotFound => StatusCode::NOT_FOUND,
        AuthProviderError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

use crate::domain::errors::AuthError;
use crate::interface_adapters::protocol::{
    AwardWinnerRequest, AwardWinnerResponse, ErrorResponse, LoginRequest, LoginResponse,
    MeResponse, ScoreboardEntry, ScoreboardResponse, SignupRequest, SignupResponse, UserDto,
};
use crate::interface_adapters::state::{AppState, PostgresUserRepository, SystemClock};
use crate::use_cases::award_winner::AwardWinnerUseCase;
use crate::use_cases::login::LoginUseCase;
use crate::use_cases::scoreboard::ScoreboardUseCase;
use crate::use_cases::signup::SignupUseCase;
use crate::use_cases::verify_token::VerifyTokenUseCase;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

fn user_dto(user: crate::domain::entities::User) -> UserDto {
    UserDto {
        id: user.id.to_string(),
        username: user.username,
    }
}

// Handler for creating a new account.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), (StatusCode, Json<ErrorResponse>)> {
    let use_case = SignupUseCase {
        repo: PostgresUserRepository {
            db: state.db.clone(),
        },
    };

    use_case
        .execute(payload.username, payload.password)
        .await
        .map_err(|err| map_auth_error(err, AuthErrorContext::Signup))?;

    Ok((StatusCode::CREATED, Json(SignupResponse { ok: true })))
}

// Handler for exchanging credentials for a signed session token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    let use_case = LoginUseCase {
        repo: PostgresUserRepository {
            db: state.db.clone(),
        },
        clock: SystemClock,
        jwt_secret: state.jwt_secret.clone(),
    };

    let result = use_case
        .execute(&payload.username, &payload.password)
        .await
        .map_err(|err| map_auth_error(err, AuthErrorContext::Login))?;

    Ok(Json(LoginResponse {
        token: result.token,
        user: user_dto(result.user),
    }))
}

// Handler for resolving the caller's profile from a bearer token.
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| map_auth_error(AuthError::InvalidToken, AuthErrorContext::Me))?;

    let use_case = VerifyTokenUseCase {
        repo: PostgresUserRepository {
            db: state.db.clone(),
        },
        jwt_secret: state.jwt_secret.clone(),
    };

    let user = use_case
        .execute(token)
        .await
        .map_err(|err| map_auth_error(err, AuthErrorContext::Me))?;

    Ok(Json(MeResponse {
        user: user_dto(user),
    }))
}

// Handler for the top-10 wins leaderboard.
pub async fn scoreboard(
    State(state): State<AppState>,
) -> Result<Json<ScoreboardResponse>, (StatusCode, Json<ErrorResponse>)> {
    let use_case = ScoreboardUseCase {
        repo: PostgresUserRepository {
            db: state.db.clone(),
        },
    };

    let leaders = use_case
        .execute()
        .await
        .map_err(|err| map_auth_error(err, AuthErrorContext::Scoreboard))?
        .into_iter()
        .map(|(username, wins)| ScoreboardEntry { username, wins })
        .collect();

    Ok(Json(ScoreboardResponse { leaders }))
}

// Handler for incrementing a user's win count.
pub async fn award_winner(
    State(state): State<AppState>,
    Json(payload): Json<AwardWinnerRequest>,
) -> Result<Json<AwardWinnerResponse>, (StatusCode, Json<ErrorResponse>)> {
    let use_case = AwardWinnerUseCase {
        repo: PostgresUserRepository {
            db: state.db.clone(),
        },
    };

    use_case
        .execute(&payload.username)
        .await
        .map_err(|err| map_auth_error(err, AuthErrorContext::AwardWinner))?;

    Ok(Json(AwardWinnerResponse { ok: true }))
}

// Helper to build a JSON error response.
fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

// Maps domain errors to HTTP responses by endpoint context.
enum AuthErrorContext {
    Signup,
    Login,
    Me,
    Scoreboard,
    AwardWinner,
}

fn map_auth_error(err: AuthError, context: AuthErrorContext) -> (StatusCode, Json<ErrorResponse>) {
    match context {
        AuthErrorContext::Signup => match err {
            AuthError::InvalidUsername => error_response(StatusCode::BAD_REQUEST, "invalid username"),
            AuthError::InvalidPassword => error_response(StatusCode::BAD_REQUEST, "invalid password"),
            AuthError::UsernameTaken => error_response(StatusCode::CONFLICT, "username already taken"),
            _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage error"),
        },
        AuthErrorContext::Login => match err {
            AuthError::InvalidCredentials => {
                error_response(StatusCode::UNAUTHORIZED, "invalid username or password")
            }
            _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage error"),
        },
        AuthErrorContext::Me => match err {
            AuthError::InvalidToken => error_response(StatusCode::UNAUTHORIZED, "invalid token"),
            AuthError::UserNotFound => error_response(StatusCode::NOT_FOUND, "user not found"),
            _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage error"),
        },
        AuthErrorContext::Scoreboard => error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage error"),
        AuthErrorContext::AwardWinner => match err {
            AuthError::UserNotFound => error_response(StatusCode::NOT_FOUND, "user not found"),
            _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage error"),
        },
    }
}

use crate::interface_adapters::handlers::{auth, events, game};
use crate::interface_adapters::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/signup", post(auth::signup))
        .route("/api/login", post(auth::login))
        .route("/api/me", get(auth::me))
        .route("/api/scoreboard", get(auth::scoreboard))
        .route("/api/awardWinner", post(auth::award_winner))
        .route("/api/connect", post(game::connect))
        .route("/api/listGames", post(game::list_games))
        .route("/api/createGame", post(game::create_game))
        .route("/api/joinGame", post(game::join_game))
        .route("/api/startGame", post(game::start_game))
        .route("/api/exitGame", post(game::exit_game))
        .route("/api/sendAnswer", post(game::send_answer))
        .route("/api/nextQuestion", post(game::next_question))
        .route("/api/endGame", post(game::end_game))
        .route("/api/submitQuestion", post(game::submit_question))
        .route("/api/chat", post(game::chat))
        .route("/api/events", get(events::events))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AuthProvider, AuthProviderError, LoginRequest, LoginResponse, MeResponse,
        ScoreboardResponse, SignupRequest, SignupResponse, UserDto,
    };
    use crate::use_cases::session_pool::BridgeSessionPool;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct StubAuth;

    #[async_trait]
    impl AuthProvider for StubAuth {
        async fn signup(&self, _req: SignupRequest) -> Result<SignupResponse, AuthProviderError> {
            Ok(SignupResponse { ok: true })
        }

        async fn login(&self, _req: LoginRequest) -> Result<LoginResponse, AuthProviderError> {
            Ok(LoginResponse {
                token: "token".to_string(),
                user: UserDto {
                    id: "u1".to_string(),
                    username: "alice".to_string(),
                },
            })
        }

        async fn me(&self, _token: &str) -> Result<MeResponse, AuthProviderError> {
            Ok(MeResponse {
                user: UserDto {
                    id: "u1".to_string(),
                    username: "alice".to_string(),
                },
            })
        }

        async fn scoreboard(&self) -> Result<ScoreboardResponse, AuthProviderError> {
            Ok(ScoreboardResponse { leaders: vec![] })
        }

        async fn award_winner(&self, _username: &str) -> Result<(), AuthProviderError> {
            Ok(())
        }
    }

    fn build_test_app() -> Router {
        let state = Arc::new(AppState {
            auth: Arc::new(StubAuth),
            session_pool: Arc::new(BridgeSessionPool::new("127.0.0.1:1".to_string())),
        });
        app(state)
    }

    #[tokio::test]
    async fn signup_proxies_to_auth_provider() {
        let app = build_test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/signup")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"username":"alice","password":"hunter2"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn game_op_without_session_returns_not_connected() {
        let app = build_test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/listGames")
                    .header("content-type", "application/json")
                    .header("X-Username", "alice")
                    .body(Body::from(r#"{}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unresolvable_username_is_rejected() {
        let app = build_test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/connect")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = build_test_app();
        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

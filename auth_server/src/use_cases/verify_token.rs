use crate::domain::entities::User;
use crate::domain::errors::AuthError;
use crate::domain::ports::UserRepository;
use crate::use_cases::jwt::verify_token as decode_token;

// Token verification use case with injected dependencies: decodes the
// bearer token and resolves the current user profile.
pub struct VerifyTokenUseCase<R> {
    pub repo: R,
    pub jwt_secret: String,
}

impl<R> VerifyTokenUseCase<R>
where
    R: UserRepository,
{
    pub async fn execute(&self, token: &str) -> Result<User, AuthError> {
        let user_id = decode_token(token, &self.jwt_secret).map_err(|_| AuthError::InvalidToken)?;

        self.repo
            .find_by_id(user_id)
            .await
            .map_err(|_| AuthError::StorageFailure)?
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::jwt::issue_token;
    use crate::use_cases::test_support::RecordingUserRepository;

    #[tokio::test]
    async fn verify_token_rejects_garbage_token() {
        let use_case = VerifyTokenUseCase {
            repo: RecordingUserRepository::new(),
            jwt_secret: "test-secret".to_string(),
        };
        let err = use_case.execute("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn verify_token_resolves_profile_for_valid_token() {
        let repo = RecordingUserRepository::new();
        let user = repo.insert_test_user("alice", "hash", 5);
        let token = issue_token(user.id, 1_000, "test-secret").expect("issue token");

        let use_case = VerifyTokenUseCase {
            repo,
            jwt_secret: "test-secret".to_string(),
        };
        let resolved = use_case.execute(&token).await.expect("token valid");
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.username, "alice");
    }
}

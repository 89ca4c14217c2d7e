use crate::domain::entities::User;
use crate::domain::errors::AuthError;
use crate::domain::ports::{Clock, UserRepository};
use crate::use_cases::jwt::issue_token;
use crate::use_cases::password::verify_password;

// Response returned by the login use case.
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// Login use case with injected dependencies.
pub struct LoginUseCase<R, C> {
    pub repo: R,
    pub clock: C,
    pub jwt_secret: String,
}

impl<R, C> LoginUseCase<R, C>
where
    R: UserRepository,
    C: Clock,
{
    pub async fn execute(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let user = self
            .repo
            .find_by_username(username)
            .await
            .map_err(|_| AuthError::StorageFailure)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(user.id, self.clock.now_epoch_seconds(), &self.jwt_secret)
            .map_err(|_| AuthError::StorageFailure)?;

        Ok(LoginResponse { token, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::password::hash_password;
    use crate::use_cases::test_support::{FixedClock, RecordingUserRepository};

    #[tokio::test]
    async fn login_rejects_unknown_username() {
        let use_case = LoginUseCase {
            repo: RecordingUserRepository::new(),
            clock: FixedClock(1_000),
            jwt_secret: "test-secret".to_string(),
        };
        let err = use_case.execute("ghost", "irrelevant").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let repo = RecordingUserRepository::new();
        let hash = hash_password("correct-horse").expect("hash");
        repo.insert_test_user("alice", &hash, 0);
        let use_case = LoginUseCase {
            repo,
            clock: FixedClock(1_000),
            jwt_secret: "test-secret".to_string(),
        };
        let err = use_case.execute("alice", "wrong-password").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_issues_token_on_success() {
        let repo = RecordingUserRepository::new();
        let hash = hash_password("correct-horse").expect("hash");
        let user = repo.insert_test_user("alice", &hash, 3);
        let use_case = LoginUseCase {
            repo,
            clock: FixedClock(1_000),
            jwt_secret: "test-secret".to_string(),
        };
        let response = use_case.execute("alice", "correct-horse").await.expect("login ok");
        assert_eq!(response.user.id, user.id);
        assert!(!response.token.is_empty());
    }
}

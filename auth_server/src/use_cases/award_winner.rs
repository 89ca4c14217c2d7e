use crate::domain::errors::AuthError;
use crate::domain::ports::UserRepository;

// Award-winner use case with injected dependencies: atomic `wins += 1`
// where `username` matches.
pub struct AwardWinnerUseCase<R> {
    pub repo: R,
}

impl<R> AwardWinnerUseCase<R>
where
    R: UserRepository,
{
    pub async fn execute(&self, username: &str) -> Result<(), AuthError> {
        let awarded = self
            .repo
            .award_winner(username)
            .await
            .map_err(|_| AuthError::StorageFailure)?;

        if awarded {
            Ok(())
        } else {
            Err(AuthError::UserNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::RecordingUserRepository;

    #[tokio::test]
    async fn award_winner_increments_matching_user() {
        let repo = RecordingUserRepository::new();
        repo.insert_test_user("alice", "hash", 2);
        let use_case = AwardWinnerUseCase { repo: repo.clone() };

        use_case.execute("alice").await.expect("award ok");
        let leaders = repo.top_scoreboard(10).await.expect("scoreboard ok");
        assert_eq!(leaders, vec![("alice".to_string(), 3)]);
    }

    #[tokio::test]
    async fn award_winner_errors_for_unknown_username() {
        let use_case = AwardWinnerUseCase {
            repo: RecordingUserRepository::new(),
        };
        let err = use_case.execute("ghost").await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }
}

use crate::domain::errors::AuthError;
use crate::domain::ports::UserRepository;

const SCOREBOARD_LIMIT: i64 = 10;

// Scoreboard use case with injected dependencies.
pub struct ScoreboardUseCase<R> {
    pub repo: R,
}

impl<R> ScoreboardUseCase<R>
where
    R: UserRepository,
{
    pub async fn execute(&self) -> Result<Vec<(String, i64)>, AuthError> {
        self.repo
            .top_scoreboard(SCOREBOARD_LIMIT)
            .await
            .map_err(|_| AuthError::StorageFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::RecordingUserRepository;

    #[tokio::test]
    async fn scoreboard_orders_by_wins_then_username() {
        let repo = RecordingUserRepository::new();
        repo.insert_test_user("zara", "hash", 5);
        repo.insert_test_user("alice", "hash", 5);
        repo.insert_test_user("bob", "hash", 9);
        let use_case = ScoreboardUseCase { repo };

        let leaders = use_case.execute().await.expect("scoreboard ok");
        assert_eq!(
            leaders,
            vec![
                ("bob".to_string(), 9),
                ("alice".to_string(), 5),
                ("zara".to_string(), 5),
            ]
        );
    }
}

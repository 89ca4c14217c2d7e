use crate::domain::errors::AuthError;
use crate::domain::ports::{UserRepository, UNIQUE_VIOLATION_MARKER};
use crate::use_cases::password::hash_password;

// Signup use case with injected dependencies.
pub struct SignupUseCase<R> {
    pub repo: R,
}

impl<R> SignupUseCase<R>
where
    R: UserRepository,
{
    pub async fn execute(&self, username: String, password: String) -> Result<(), AuthError> {
        let username = validate_username(&username)?;
        validate_password(&password)?;

        if self
            .repo
            .find_by_username(&username)
            .await
            .map_err(|_| AuthError::StorageFailure)?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(&password).map_err(|_| AuthError::StorageFailure)?;

        self.repo
            .create(&username, &password_hash)
            .await
            .map_err(|err| {
                if err == UNIQUE_VIOLATION_MARKER {
                    AuthError::UsernameTaken
                } else {
                    AuthError::StorageFailure
                }
            })?;

        Ok(())
    }
}

fn validate_username(value: &str) -> Result<String, AuthError> {
    const MIN_LEN: usize = 3;
    const MAX_LEN: usize = 32;

    let normalized = value.trim();
    let len = normalized.chars().count();
    if len < MIN_LEN || len > MAX_LEN {
        return Err(AuthError::InvalidUsername);
    }
    if !normalized
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        return Err(AuthError::InvalidUsername);
    }
    Ok(normalized.to_string())
}

fn validate_password(value: &str) -> Result<(), AuthError> {
    const MIN_LEN: usize = 8;
    if value.chars().count() < MIN_LEN {
        return Err(AuthError::InvalidPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{FailureFlags, RecordingUserRepository};

    #[tokio::test]
    async fn signup_rejects_short_password() {
        let use_case = SignupUseCase {
            repo: RecordingUserRepository::new(),
        };
        let err = use_case
            .execute("alice".to_string(), "short".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword));
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_username() {
        let repo = RecordingUserRepository::new();
        repo.insert_test_user("alice", "hash", 0);
        let use_case = SignupUseCase { repo };

        let err = use_case
            .execute("alice".to_string(), "longenoughpw".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
    }

    #[tokio::test]
    async fn signup_storage_failure_on_create_is_not_reported_as_username_taken() {
        let repo = RecordingUserRepository::new().with_failures(FailureFlags {
            create: true,
            ..Default::default()
        });
        let use_case = SignupUseCase { repo };

        let err = use_case
            .execute("alice".to_string(), "longenoughpw".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StorageFailure));
    }

    #[tokio::test]
    async fn signup_succeeds_with_valid_credentials() {
        let use_case = SignupUseCase {
            repo: RecordingUserRepository::new(),
        };
        use_case
            .execute("alice".to_string(), "longenoughpw".to_string())
            .await
            .expect("signup should succeed");
    }
}

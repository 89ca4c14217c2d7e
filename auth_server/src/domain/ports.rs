use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::User;

/// Sentinel error string `UserRepository::create` returns for a unique-
/// username constraint violation, distinguishing it from other storage
/// failures so use cases can map it to `AuthError::UsernameTaken` instead of
/// `AuthError::StorageFailure`.
pub const UNIQUE_VIOLATION_MARKER: &str = "unique_violation";

// Port for the user store used by auth use cases: unique-username insert,
// lookup, and an atomic `wins` increment.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, String>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, String>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, String>;
    /// Returns `true` if a matching user was incremented.
    async fn award_winner(&self, username: &str) -> Result<bool, String>;
    /// Up to `limit` users ordered by `wins` descending, then username ascending.
    async fn top_scoreboard(&self, limit: i64) -> Result<Vec<(String, i64)>, String>;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}

use uuid::Uuid;

// Persisted account record backing signup/login/me/scoreboard.
#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub wins: i64,
}

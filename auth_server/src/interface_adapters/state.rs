use async_trait::async_trait;
use sqlx::PgPool;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::domain::entities::User;
use crate::domain::ports::{Clock, UserRepository, UNIQUE_VIOLATION_MARKER};

// Application state: the shared database pool plus the JWT signing secret.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_secret: String,
}

// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pub db: PgPool,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, String> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, wins) VALUES ($1, $2, $3, 0)",
        )
        .bind(id)
        .bind(username)
        .bind(password_hash)
        .execute(&self.db)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                UNIQUE_VIOLATION_MARKER.to_string()
            } else {
                err.to_string()
            }
        })?;

        Ok(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            wins: 0,
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, String> {
        sqlx::query_as::<_, (Uuid, String, String, i64)>(
            "SELECT id, username, password_hash, wins FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .map_err(|err| err.to_string())
        .map(|row| row.map(map_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, String> {
        sqlx::query_as::<_, (Uuid, String, String, i64)>(
            "SELECT id, username, password_hash, wins FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|err| err.to_string())
        .map(|row| row.map(map_row))
    }

    async fn award_winner(&self, username: &str) -> Result<bool, String> {
        let result = sqlx::query("UPDATE users SET wins = wins + 1 WHERE username = $1")
            .bind(username)
            .execute(&self.db)
            .await
            .map_err(|err| err.to_string())?;
        Ok(result.rows_affected() > 0)
    }

    async fn top_scoreboard(&self, limit: i64) -> Result<Vec<(String, i64)>, String> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT username, wins FROM users ORDER BY wins DESC, username ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .map_err(|err| err.to_string())
    }
}

// Postgres reports a unique-constraint violation as SQLSTATE 23505.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == "23505")
}

fn map_row(row: (Uuid, String, String, i64)) -> User {
    User {
        id: row.0,
        username: row.1,
        password_hash: row.2,
        wins: row.3,
    }
}

// System clock adapter used by auth use cases.
#[derive(Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

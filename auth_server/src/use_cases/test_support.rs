use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::User;
use crate::domain::ports::{Clock, UserRepository};

pub(crate) type UserTable = Arc<Mutex<HashMap<String, User>>>;

// Shared fixed time source for deterministic use-case tests.
pub(crate) struct FixedClock(pub(crate) u64);

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub create: bool,
    pub find: bool,
    pub award: bool,
}

#[derive(Clone)]
pub(crate) struct RecordingUserRepository {
    users: UserTable,
    failures: FailureFlags,
}

impl RecordingUserRepository {
    pub(crate) fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            failures: FailureFlags::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn insert_test_user(&self, username: &str, password_hash: &str, wins: i64) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            wins,
        };
        let mut guard = self.users.lock().expect("users mutex poisoned");
        guard.insert(username.to_string(), user.clone());
        user
    }
}

#[async_trait]
impl UserRepository for RecordingUserRepository {
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, String> {
        if self.failures.create {
            return Err("create failed".to_string());
        }
        let mut guard = self.users.lock().expect("users mutex poisoned");
        if guard.contains_key(username) {
            return Err("username taken".to_string());
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            wins: 0,
        };
        guard.insert(username.to_string(), user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, String> {
        if self.failures.find {
            return Err("find failed".to_string());
        }
        let guard = self.users.lock().expect("users mutex poisoned");
        Ok(guard.get(username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, String> {
        if self.failures.find {
            return Err("find failed".to_string());
        }
        let guard = self.users.lock().expect("users mutex poisoned");
        Ok(guard.values().find(|u| u.id == id).cloned())
    }

    async fn award_winner(&self, username: &str) -> Result<bool, String> {
        if self.failures.award {
            return Err("award failed".to_string());
        }
        let mut guard = self.users.lock().expect("users mutex poisoned");
        match guard.get_mut(username) {
            Some(user) => {
                user.wins += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn top_scoreboard(&self, limit: i64) -> Result<Vec<(String, i64)>, String> {
        let guard = self.users.lock().expect("users mutex poisoned");
        let mut rows: Vec<(String, i64)> =
            guard.values().map(|u| (u.username.clone(), u.wins)).collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

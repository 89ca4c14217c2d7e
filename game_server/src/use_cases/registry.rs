// Game registry: the single shared owner of all live games.
//
// Every accessor takes the registry's mutex. We use a plain `Mutex` instead
// of a `RwLock` because almost every access here mutates state, so a
// read/write split would buy nothing.

use crate::domain::{Game, GameState, ENDED_TTL_SECONDS};
use crate::use_cases::connections::ConnectionTable;
use rand::Rng;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const PIN_DIGITS: u32 = 6;
const MAX_ALLOCATE_ATTEMPTS: u32 = 64;

#[derive(Debug)]
pub struct GameRegistry {
    games: Mutex<HashMap<String, Game>>,
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRegistry {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a 6-digit PIN not currently keyed in the registry.
    pub async fn allocate_pin(&self) -> String {
        let games = self.games.lock().await;
        for _ in 0..MAX_ALLOCATE_ATTEMPTS {
            let candidate = random_pin();
            if !games.contains_key(&candidate) {
                return candidate;
            }
        }
        // Practically unreachable given a 900,000-PIN space, but termination
        // still needs a fallback: fall through to a fresh random pin anyway.
        warn!("pin allocator exhausted retry budget; returning a possibly-colliding pin");
        random_pin()
    }

    pub async fn get(&self, pin: &str) -> Option<Game> {
        self.games.lock().await.get(pin).cloned()
    }

    pub async fn put(&self, game: Game) {
        self.games.lock().await.insert(game.pin.clone(), game);
    }

    pub async fn remove(&self, pin: &str) -> Option<Game> {
        self.games.lock().await.remove(pin)
    }

    /// Applies `f` to the game for `pin`, then — still holding the same
    /// lock — calls `broadcast` on `f`'s result and fans out the frame it
    /// returns (if any) to every connection on `pin`.
    ///
    /// The broadcast has to happen before the lock is released: two
    /// concurrent handlers touching the same pin both take this lock, so if
    /// handler A mutates and releases before broadcasting, handler B can
    /// mutate, broadcast, and have its frame reach connections before A's
    /// does — reordering broadcasts relative to the transitions that
    /// produced them. Keeping mutate-then-broadcast inside one critical
    /// section is what makes them linearize per spec's ordering guarantee.
    pub async fn with_game_mut_and_broadcast<T>(
        &self,
        pin: &str,
        connections: &ConnectionTable,
        f: impl FnOnce(&mut Game) -> T,
        broadcast: impl FnOnce(&T) -> Option<Value>,
    ) -> Option<T> {
        let mut games = self.games.lock().await;
        let game = games.get_mut(pin)?;
        let result = f(game);
        if let Some(msg) = broadcast(&result) {
            connections.broadcast_to_pin(pin, msg).await;
        }
        Some(result)
    }

    pub async fn list_public_lobbies(&self) -> Vec<Game> {
        self.games
            .lock()
            .await
            .values()
            .filter(|g| g.state == GameState::Lobby && g.is_public)
            .cloned()
            .collect()
    }

    /// Removes every game whose state is `Ended` and whose `ended_at` is
    /// older than the TTL. Runs at least once per LIST_GAMES.
    pub async fn sweep_ended(&self, now: Instant) {
        let mut games = self.games.lock().await;
        let before = games.len();
        games.retain(|_, g| {
            !(g.state == GameState::Ended
                && g.ended_at
                    .is_some_and(|ended| now.duration_since(ended).as_secs() >= ENDED_TTL_SECONDS))
        });
        let removed = before - games.len();
        if removed > 0 {
            debug!(removed, "swept ended games past ttl");
        }
    }
}

fn random_pin() -> String {
    let max = 10u32.pow(PIN_DIGITS);
    let value = rand::rng().random_range(0..max);
    format!("{value:0width$}", width = PIN_DIGITS as usize)
}

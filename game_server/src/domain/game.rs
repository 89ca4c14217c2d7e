// Core quiz-game entities and the invariants a `Game` must uphold.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Lobby,
    InProgress,
    Ended,
}

#[derive(Debug, Clone)]
pub struct Question {
    pub author: String,
    pub text: String,
    pub answer_true: bool,
}

/// Authoritative record for one live game, owned by the `GameRegistry`.
///
/// Invariants (enforced by the use-case layer, not by this struct alone):
/// - `host` is a member of `players` while `state != Ended`.
/// - `scores` has an entry for every username in `players`.
/// - `0 <= current_question_index <= questions.len()` while `state == InProgress`.
/// - every set in `answered_by_index` is a subset of `players`.
/// - `players.len() <= max_players`.
#[derive(Debug, Clone)]
pub struct Game {
    pub pin: String,
    pub host: String,
    pub state: GameState,
    pub theme: String,
    pub is_public: bool,
    pub max_players: usize,
    /// Insertion-ordered so host re-election can promote the earliest joiner.
    pub players: Vec<String>,
    pub scores: HashMap<String, u32>,
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub answered_by_index: HashMap<usize, HashSet<String>>,
    pub created_at: Instant,
    pub ended_at: Option<Instant>,
}

pub const DEFAULT_MAX_PLAYERS: usize = 20;
pub const SCORE_PER_CORRECT_ANSWER: u32 = 100;
pub const ENDED_TTL_SECONDS: u64 = 120;

impl Game {
    pub fn new(pin: String, host: String, theme: String, is_public: bool, max_players: usize) -> Self {
        let mut scores = HashMap::new();
        scores.insert(host.clone(), 0);
        Self {
            pin,
            host: host.clone(),
            state: GameState::Lobby,
            theme,
            is_public,
            max_players,
            players: vec![host],
            scores,
            questions: Vec::new(),
            current_question_index: 0,
            answered_by_index: HashMap::new(),
            created_at: Instant::now(),
            ended_at: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn add_player(&mut self, username: &str) {
        if !self.players.iter().any(|p| p == username) {
            self.players.push(username.to_string());
        }
        self.scores.entry(username.to_string()).or_insert(0);
    }

    /// Removes a player. A lobby-state exit also drops the score entry so
    /// it doesn't linger; an in-progress/ended exit keeps the score so
    /// end-screens still show the departed player.
    pub fn remove_player(&mut self, username: &str) {
        self.players.retain(|p| p != username);
        if self.state == GameState::Lobby {
            self.scores.remove(username);
        }
        for answered in self.answered_by_index.values_mut() {
            answered.remove(username);
        }
    }

    /// Promotes the earliest remaining joiner to host. No-op if empty.
    pub fn promote_next_host(&mut self) {
        if let Some(next) = self.players.first() {
            self.host = next.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

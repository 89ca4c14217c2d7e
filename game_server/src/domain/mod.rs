// Domain layer: the quiz-game entities and the rules they must satisfy.

pub mod game;

pub use game::{Game, GameState, Question, DEFAULT_MAX_PLAYERS, ENDED_TTL_SECONDS, SCORE_PER_CORRECT_ANSWER};

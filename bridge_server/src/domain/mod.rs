mod auth;
mod session;

// Re-export the domain boundary types and ports.
pub use auth::{
    AuthProvider, AuthProviderError, LoginRequest, LoginResponse, MeResponse, ScoreboardEntry,
    ScoreboardResponse, SignupRequest, SignupResponse, UserDto,
};
pub use session::SubscribeError;

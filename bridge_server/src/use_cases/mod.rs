pub mod session_pool;
pub mod username;

/// Failure modes for a one-shot correlated subscription against a
/// `BridgeSession`'s decoded-frame stream.
#[derive(Debug)]
pub enum SubscribeError {
    /// No matching frame arrived within the timeout window.
    Timeout,
    /// The session's fan-out channel closed (its reader task died).
    SessionClosed,
}

impl std::fmt::Display for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscribeError::Timeout => write!(f, "timed out waiting for game server reply"),
            SubscribeError::SessionClosed => write!(f, "game server session closed"),
        }
    }
}

impl std::error::Error for SubscribeError {}

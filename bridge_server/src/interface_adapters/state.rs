use crate::domain::AuthProvider;
use crate::use_cases::session_pool::BridgeSessionPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // We use Arc<dyn Trait> to hold any implementation (dependency injection).
    pub auth: Arc<dyn AuthProvider>,
    pub session_pool: Arc<BridgeSessionPool>,
}

use crate::use_cases::connections::ConnectionTable;
use crate::use_cases::registry::GameRegistry;

pub struct AppState {
    pub registry: GameRegistry,
    pub connections: ConnectionTable,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            registry: GameRegistry::new(),
            connections: ConnectionTable::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

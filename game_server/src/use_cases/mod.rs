pub mod connections;
pub mod dispatcher;
pub mod registry;

pub mod bootstrap;
pub mod drag_machine;
pub mod editing_session;
pub mod mutation_api;

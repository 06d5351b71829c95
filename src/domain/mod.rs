pub mod error;
pub mod models;
pub mod overlap;
pub mod presets;
pub mod schedule_store;
pub mod time_math;

pub mod activity_log;
pub mod background_save;
pub mod config;
pub mod error;
pub mod schedule_repository;
pub mod storage;

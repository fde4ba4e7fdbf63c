//! HeartMap Storage crate - SQLite persistence for health records.
//!
//! Provides a WAL-mode SQLite database with migrations, a write-side
//! repository used by ingestion, and a read-side query service used by
//! the HTTP API.

pub mod db;
pub mod migrations;
pub mod queries;
pub mod repository;

pub use db::Database;
pub use queries::{QueryService, StoreStats};
pub use repository::RecordRepository;

//! Durable task state.
//!
//! This crate provides:
//! - The `TaskStateStore` contract used by the processor
//! - A Postgres implementation on sqlx
//! - An in-memory implementation for tests and dry runs
//! - Database connection settings from the environment

pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use config::DatabaseConfig;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryTaskStateStore;
pub use postgres::PgTaskStateStore;
pub use store::TaskStateStore;

//! # TimeGuard Infra
//!
//! Infrastructure adapters for the TimeGuard engine.
//!
//! This crate contains:
//! - The SQLite-backed issue store implementing the core
//!   `IssueRepository` port
//! - Connection pool management
//!
//! All blocking database work is dispatched via `tokio::task::spawn_blocking`
//! so async callers never stall a runtime worker.

pub mod database;

pub use database::{DbManager, SqliteIssueRepository};

//! SQLite persistence for the issue store

pub mod issue_repository;
pub mod manager;

pub use issue_repository::SqliteIssueRepository;
pub use manager::DbManager;

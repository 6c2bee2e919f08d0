//! Error types used throughout the engine

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Main error type for TimeGuard
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TimeGuardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Repair failed: {0}")]
    Repair(#[from] RepairError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Typed failures of the repair engine.
///
/// All variants are recoverable: the entry collection is returned unchanged
/// and the originating issue stays pending. There is no fatal category.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details", rename_all = "snake_case")]
pub enum RepairError {
    /// Target entry is locked or approved and the caller has no override
    /// authority.
    #[error("entry {entry_id} is locked or approved")]
    LockedEntry { entry_id: Uuid },

    /// The action payload no longer matches the current entry state.
    #[error("action is stale: {reason}")]
    StaleAction { reason: String },

    /// The action references an entry that is not in the collection.
    #[error("entry {entry_id} not found in collection")]
    UnknownEntry { entry_id: Uuid },

    /// Applying the action would leave the collection in an invalid state,
    /// e.g. a split producing overlapping children.
    #[error("repair would violate an invariant: {0}")]
    InvariantViolation(String),
}

/// Result type alias for TimeGuard operations
pub type Result<T> = std::result::Result<T, TimeGuardError>;

//! Error types for the audit engine, the JSON boundary and the store.

use thiserror::Error;

/// Why a program's requirements blob could not be turned into a tree.
/// Never returned to callers of the engine: it selects the coarse
/// progress path instead.
#[derive(Error, Debug)]
pub enum RequirementsError {
    #[error("program has no requirements")]
    Empty,

    #[error("requirements JSON could not be parsed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized requirements layout: {0}")]
    UnknownLayout(String),
}

/// Caller misuse. Dirty catalog data never produces this.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Persistence adapter failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

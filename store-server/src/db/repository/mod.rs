//! Repository Module
//!
//! Module-level async functions over the SQLite pool, one module per table
//! group. Atomic check-and-act statements (guarded inserts, compare-and-claim
//! updates) live here so the critical sections of the pipeline are single SQL
//! statements.

pub mod delivery;
pub mod download;
pub mod ledger;
pub mod order;
pub mod product;
pub mod promo;
pub mod stock;
pub mod topup;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

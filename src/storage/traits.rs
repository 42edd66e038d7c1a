//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::entity::CandidateEntity;
use crate::state::RunStatsSnapshot;
use crate::storage::{CompanyRecord, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of an idempotent company insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written; carries its id
    Inserted(i64),
    /// A row with the same site already existed; carries its id when known
    AlreadyPresent(Option<i64>),
}

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawler.
pub trait Storage {
    // ===== Companies =====

    /// Inserts a company unless one with the same identity key exists
    ///
    /// The existence check and the insert run in one transaction. An
    /// existing row is never modified.
    ///
    /// # Arguments
    ///
    /// * `entity` - The deduplicated entity to store
    ///
    /// # Returns
    ///
    /// Whether the row was inserted or already present
    fn insert_company_if_absent(&mut self, entity: &CandidateEntity)
        -> StorageResult<InsertOutcome>;

    /// Gets a company by its identity key
    fn get_company_by_site(&self, company_site: &str) -> StorageResult<Option<CompanyRecord>>;

    /// Counts stored companies
    fn count_companies(&self) -> StorageResult<u64>;

    /// Lists companies, newest first
    fn list_companies(&self, limit: usize) -> StorageResult<Vec<CompanyRecord>>;

    // ===== Run Archive =====

    /// Archives the statistics of a finished run
    ///
    /// # Returns
    ///
    /// The ID of the archived run
    fn archive_run(
        &mut self,
        seed_url: &str,
        stats: &RunStatsSnapshot,
        entities_found: usize,
        status: RunStatus,
    ) -> StorageResult<i64>;

    /// Gets the most recently archived run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Gets an archived run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;
}

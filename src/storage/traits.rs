//! Storage traits and error types

use crate::crawler::JobPosting;
use crate::storage::{RunRecord, RunStatus, VisitRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage {
    // ===== Run management =====

    /// Creates a new crawl run; returns its ID
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Visits =====

    /// Records one executed page visit
    #[allow(clippy::too_many_arguments)]
    fn record_visit(
        &mut self,
        run_id: i64,
        source: &str,
        url: &str,
        depth: u32,
        page_type: Option<&str>,
        jobs_count: u32,
        error: Option<&str>,
    ) -> StorageResult<i64>;

    /// Lists visits for a run
    fn list_visits(&self, run_id: i64) -> StorageResult<Vec<VisitRecord>>;

    // ===== Postings =====

    /// Inserts a posting; returns false if its URL was already stored
    fn insert_posting(
        &mut self,
        run_id: i64,
        source: &str,
        posting: &JobPosting,
    ) -> StorageResult<bool>;

    /// Total stored postings
    fn posting_count(&self) -> StorageResult<i64>;

    /// Total recorded visits
    fn visit_count(&self) -> StorageResult<i64>;

    /// Posting counts grouped by source, descending
    fn postings_by_source(&self) -> StorageResult<Vec<(String, i64)>>;
}

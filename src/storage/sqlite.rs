//! SQLite implementation of the storage trait

use crate::crawler::JobPosting;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, VisitRecord};
use crate::JobtrailError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite-backed storage
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at the given path
    pub fn new(path: &Path) -> Result<Self, JobtrailError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Opens an in-memory database (used by tests)
    pub fn in_memory() -> Result<Self, JobtrailError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![
                Utc::now().to_rfc3339(),
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    let status: String = row.get(4)?;
                    Ok(RunRecord {
                        id: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        config_hash: row.get(3)?,
                        status: RunStatus::from_db_string(&status)
                            .unwrap_or(RunStatus::Failed),
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![
                RunStatus::Completed.to_db_string(),
                Utc::now().to_rfc3339(),
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn record_visit(
        &mut self,
        run_id: i64,
        source: &str,
        url: &str,
        depth: u32,
        page_type: Option<&str>,
        jobs_count: u32,
        error: Option<&str>,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO visits (run_id, source, url, depth, page_type, jobs_count, error, visited_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                source,
                url,
                depth,
                page_type,
                jobs_count,
                error,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_visits(&self, run_id: i64) -> StorageResult<Vec<VisitRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, source, url, depth, page_type, jobs_count, error, visited_at
             FROM visits WHERE run_id = ?1 ORDER BY id",
        )?;

        let visits = stmt
            .query_map([run_id], |row| {
                Ok(VisitRecord {
                    id: row.get(0)?,
                    run_id: row.get(1)?,
                    source: row.get(2)?,
                    url: row.get(3)?,
                    depth: row.get(4)?,
                    page_type: row.get(5)?,
                    jobs_count: row.get(6)?,
                    error: row.get(7)?,
                    visited_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(visits)
    }

    fn insert_posting(
        &mut self,
        run_id: i64,
        source: &str,
        posting: &JobPosting,
    ) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO postings (run_id, source, title, url, location, discovered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                source,
                posting.title,
                posting.url,
                posting.location,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(inserted > 0)
    }

    fn posting_count(&self) -> StorageResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM postings", [], |row| row.get(0))?;
        Ok(count)
    }

    fn visit_count(&self) -> StorageResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM visits", [], |row| row.get(0))?;
        Ok(count)
    }

    fn postings_by_source(&self) -> StorageResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT source, COUNT(*) as n FROM postings GROUP BY source ORDER BY n DESC",
        )?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(title: &str, url: &str) -> JobPosting {
        JobPosting {
            title: title.to_string(),
            url: url.to_string(),
            location: None,
        }
    }

    #[test]
    fn test_create_and_complete_run() {
        let mut storage = SqliteStorage::in_memory().unwrap();

        let run_id = storage.create_run("abc123").unwrap();
        let latest = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(latest.id, run_id);
        assert_eq!(latest.status, RunStatus::Running);
        assert!(latest.finished_at.is_none());

        storage.complete_run(run_id).unwrap();
        let latest = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(latest.status, RunStatus::Completed);
        assert!(latest.finished_at.is_some());
    }

    #[test]
    fn test_no_runs_yet() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(storage.get_latest_run().unwrap().is_none());
    }

    #[test]
    fn test_update_missing_run_fails() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        assert!(matches!(
            storage.update_run_status(42, RunStatus::Failed),
            Err(StorageError::RunNotFound(42))
        ));
    }

    #[test]
    fn test_record_and_list_visits() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let run_id = storage.create_run("abc").unwrap();

        storage
            .record_visit(run_id, "acme", "https://acme.com/jobs", 0, Some("listing"), 12, None)
            .unwrap();
        storage
            .record_visit(
                run_id,
                "acme",
                "https://acme.com/old",
                1,
                Some("error"),
                0,
                Some("HTTP 404"),
            )
            .unwrap();

        let visits = storage.list_visits(run_id).unwrap();
        assert_eq!(visits.len(), 2);
        assert_eq!(visits[0].page_type.as_deref(), Some("listing"));
        assert_eq!(visits[0].jobs_count, 12);
        assert_eq!(visits[1].error.as_deref(), Some("HTTP 404"));
        assert_eq!(storage.visit_count().unwrap(), 2);
    }

    #[test]
    fn test_posting_dedup_by_url() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let run_id = storage.create_run("abc").unwrap();

        assert!(storage
            .insert_posting(run_id, "acme", &posting("Engineer", "https://acme.com/jobs/1"))
            .unwrap());
        assert!(!storage
            .insert_posting(run_id, "acme", &posting("Engineer", "https://acme.com/jobs/1"))
            .unwrap());

        assert_eq!(storage.posting_count().unwrap(), 1);
    }

    #[test]
    fn test_postings_by_source() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let run_id = storage.create_run("abc").unwrap();

        for i in 0..3 {
            storage
                .insert_posting(
                    run_id,
                    "acme",
                    &posting("Role", &format!("https://acme.com/jobs/{}", i)),
                )
                .unwrap();
        }
        storage
            .insert_posting(run_id, "globex", &posting("Role", "https://globex.com/jobs/1"))
            .unwrap();

        let by_source = storage.postings_by_source().unwrap();
        assert_eq!(by_source[0], ("acme".to_string(), 3));
        assert_eq!(by_source[1], ("globex".to_string(), 1));
    }

    #[test]
    fn test_file_backed_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobtrail.db");

        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            let run_id = storage.create_run("abc").unwrap();
            storage
                .insert_posting(run_id, "acme", &posting("Engineer", "https://acme.com/jobs/1"))
                .unwrap();
        }

        // Reopen and verify persistence
        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.posting_count().unwrap(), 1);
    }
}

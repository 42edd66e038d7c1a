//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::entity::CandidateEntity;
use crate::state::RunStatsSnapshot;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{InsertOutcome, Storage, StorageError, StorageResult};
use crate::storage::{CompanyRecord, RunRecord, RunStatus};
use crate::ScoutError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Columns read into a `CompanyRecord`, in order
const COMPANY_COLUMNS: &str = "id, company_name, company_site, inquiry_url, email, phone, address, source_url, created_at";

/// Columns read into a `RunRecord`, in order
const RUN_COLUMNS: &str = "id, started_at, finished_at, duration_seconds, total_requests, pages_fetched, entities_found, seed_url, status";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ScoutError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScoutError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Several runs may share the database file
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, ScoutError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn requests_by_host(&self, run_id: i64) -> StorageResult<BTreeMap<String, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT host, request_count FROM run_host_requests WHERE run_id = ?1 ORDER BY host",
        )?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut by_host = BTreeMap::new();
        for row in rows {
            let (host, count) = row?;
            by_host.insert(host, count);
        }
        Ok(by_host)
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            duration_seconds: row.get(3)?,
            total_requests: row.get::<_, i64>(4)? as u64,
            pages_fetched: row.get::<_, i64>(5)? as u64,
            entities_found: row.get::<_, i64>(6)? as u64,
            seed_url: row.get(7)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(8)?)
                .unwrap_or(RunStatus::Completed),
            requests_by_host: BTreeMap::new(),
        })
    }
}

fn company_from_row(row: &Row<'_>) -> rusqlite::Result<CompanyRecord> {
    Ok(CompanyRecord {
        id: row.get(0)?,
        company_name: row.get(1)?,
        company_site: row.get(2)?,
        inquiry_url: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        address: row.get(6)?,
        source_url: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Companies =====

    fn insert_company_if_absent(
        &mut self,
        entity: &CandidateEntity,
    ) -> StorageResult<InsertOutcome> {
        let site = entity.identity_key();

        // IMMEDIATE takes the write lock up front so two runs cannot both
        // pass the existence check for the same site
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM companies WHERE company_site = ?1",
                params![site],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            tx.commit()?;
            return Ok(InsertOutcome::AlreadyPresent(Some(id)));
        }

        let now = Utc::now().to_rfc3339();
        let inserted = tx.execute(
            "INSERT INTO companies
             (company_name, company_site, inquiry_url, email, phone, address, source_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(company_site) DO NOTHING",
            params![
                entity.name,
                site,
                entity.contact_url,
                entity.email,
                entity.phone,
                entity.address,
                entity.source_url,
                now
            ],
        )?;

        let outcome = if inserted == 0 {
            InsertOutcome::AlreadyPresent(None)
        } else {
            InsertOutcome::Inserted(tx.last_insert_rowid())
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn get_company_by_site(&self, company_site: &str) -> StorageResult<Option<CompanyRecord>> {
        let company = self
            .conn
            .query_row(
                &format!("SELECT {} FROM companies WHERE company_site = ?1", COMPANY_COLUMNS),
                params![company_site],
                company_from_row,
            )
            .optional()?;

        Ok(company)
    }

    fn count_companies(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn list_companies(&self, limit: usize) -> StorageResult<Vec<CompanyRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM companies ORDER BY id DESC LIMIT ?1",
            COMPANY_COLUMNS
        ))?;

        let companies = stmt
            .query_map(params![limit as i64], company_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(companies)
    }

    // ===== Run Archive =====

    fn archive_run(
        &mut self,
        seed_url: &str,
        stats: &RunStatsSnapshot,
        entities_found: usize,
        status: RunStatus,
    ) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO runs
             (started_at, finished_at, duration_seconds, total_requests, pages_fetched,
              entities_found, seed_url, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                stats.started_at.to_rfc3339(),
                stats.finished_at.map(|t| t.to_rfc3339()),
                stats.duration_seconds,
                stats.total_requests as i64,
                stats.pages_fetched as i64,
                entities_found as i64,
                seed_url,
                status.to_db_string()
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO run_host_requests (run_id, host, request_count) VALUES (?1, ?2, ?3)",
            )?;
            for (host, count) in &stats.requests_by_host {
                stmt.execute(params![run_id, host, *count as i64])?;
            }
        }

        tx.commit()?;
        Ok(run_id)
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                Self::run_from_row,
            )
            .optional()?;

        match run {
            Some(mut run) => {
                run.requests_by_host = self.requests_by_host(run.id)?;
                Ok(Some(run))
            }
            None => Ok(None),
        }
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                Self::run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))?;

        run.requests_by_host = self.requests_by_host(run_id)?;
        Ok(run)
    }
}

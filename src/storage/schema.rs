//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Company-Scout database.
//! The `companies` table is shared with the external dashboard and its column
//! names are fixed.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Deduplicated companies; company_site holds the identity key
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_name TEXT,
    company_site TEXT NOT NULL UNIQUE,
    inquiry_url TEXT,
    email TEXT,
    phone TEXT,
    address TEXT,
    source_url TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Archived crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    duration_seconds REAL NOT NULL,
    total_requests INTEGER NOT NULL,
    pages_fetched INTEGER NOT NULL,
    entities_found INTEGER NOT NULL,
    seed_url TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Per-host request counts of an archived run
CREATE TABLE IF NOT EXISTS run_host_requests (
    run_id INTEGER NOT NULL REFERENCES runs(id),
    host TEXT NOT NULL,
    request_count INTEGER NOT NULL,
    PRIMARY KEY (run_id, host)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

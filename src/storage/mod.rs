//! Storage module for persisting crawl results
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Idempotent company inserts keyed by canonical site
//! - Archiving run statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{InsertOutcome, Storage, StorageError, StorageResult};

use std::collections::BTreeMap;

/// A stored company row
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRecord {
    pub id: i64,
    pub company_name: Option<String>,
    /// Identity key: normalized homepage, else normalized source URL
    pub company_site: String,
    pub inquiry_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub source_url: String,
    pub created_at: String,
}

/// An archived crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: f64,
    pub total_requests: u64,
    pub pages_fetched: u64,
    pub entities_found: u64,
    pub seed_url: String,
    pub status: RunStatus,
    pub requests_by_host: BTreeMap<String, u64>,
}

/// How a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Frontier exhausted, limit or page budget reached
    Completed,
    /// Stopped by the caller's cancellation token
    Cancelled,
    /// Stopped by the run timeout
    TimedOut,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "timed_out" => Some(Self::TimedOut),
            _ => None,
        }
    }
}

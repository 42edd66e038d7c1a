//! Output module for exporting and persisting crawl results
//!
//! This module handles:
//! - The CSV export of deduplicated companies
//! - Transactional persistence into the `companies` table
//! - Run summaries and statistics

pub mod csv_export;
pub mod persist;
pub mod stats;
mod traits;

pub use csv_export::{export_csv, write_csv, CSV_HEADER};
pub use persist::{persist_entities, PersistOutcome, PersistReport};
pub use stats::{
    load_statistics, print_run_summary, print_statistics, write_stats_file, StoredStatistics,
};
pub use traits::{OutputError, OutputResult};

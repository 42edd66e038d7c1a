//! Run summaries and stored statistics
//!
//! This module provides:
//! - The console summary printed after a crawl
//! - The plain-text `last_run_stats.txt` file
//! - Statistics about the stored companies for `--stats`

use crate::crawler::CrawlReport;
use crate::output::persist::summarize;
use crate::output::traits::OutputResult;
use crate::state::RunStatsSnapshot;
use crate::storage::{CompanyRecord, RunRecord, Storage};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the statistics file written next to the export
pub const STATS_FILE_NAME: &str = "last_run_stats.txt";

/// Statistics read back from the database
#[derive(Debug, Clone)]
pub struct StoredStatistics {
    pub company_count: u64,
    pub latest_run: Option<RunRecord>,
    pub recent_companies: Vec<CompanyRecord>,
}

/// Renders the statistics file body
///
/// `total=`, `duration_seconds=`, then one `host=count` line per host.
pub fn render_stats(stats: &RunStatsSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!("total={}\n", stats.total_requests));
    out.push_str(&format!("duration_seconds={:.2}\n", stats.duration_seconds));
    for (host, count) in &stats.requests_by_host {
        out.push_str(&format!("{}={}\n", host, count));
    }
    out
}

/// Writes `last_run_stats.txt` into `dir`
pub fn write_stats_file(dir: &Path, stats: &RunStatsSnapshot) -> OutputResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(STATS_FILE_NAME);
    fs::write(&path, render_stats(stats))?;
    Ok(path)
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `recent` - How many of the newest companies to include
pub fn load_statistics(storage: &dyn Storage, recent: usize) -> OutputResult<StoredStatistics> {
    Ok(StoredStatistics {
        company_count: storage.count_companies()?,
        latest_run: storage.get_latest_run()?,
        recent_companies: storage.list_companies(recent)?,
    })
}

/// Prints stored statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoredStatistics) {
    println!("=== Company-Scout Statistics ===\n");
    println!("Stored companies: {}", stats.company_count);
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest run (#{}):", run.id);
            println!("  Seed: {}", run.seed_url);
            println!("  Started: {}", run.started_at);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Duration: {:.2}s", run.duration_seconds);
            println!("  Requests: {}", run.total_requests);
            println!("  Pages fetched: {}", run.pages_fetched);
            println!("  Companies found: {}", run.entities_found);
            for (host, count) in &run.requests_by_host {
                println!("    {}: {}", host, count);
            }
        }
        None => println!("No runs archived yet."),
    }
    println!();

    if !stats.recent_companies.is_empty() {
        println!("Recent companies:");
        for company in &stats.recent_companies {
            println!(
                "  - {} ({})",
                company.company_name.as_deref().unwrap_or("<unnamed>"),
                company.company_site
            );
        }
    }
}

/// Prints the summary of a finished crawl
pub fn print_run_summary(report: &CrawlReport) {
    let stats = &report.stats;
    let (inserted, present, failed) = summarize(&report.persisted);

    println!("===== Crawl Summary =====");
    println!("Status: {}", report.status.to_db_string());
    println!("Total requests: {}", stats.total_requests);
    println!("Pages fetched: {}", stats.pages_fetched);
    println!("Duration (sec): {:.2}", stats.duration_seconds);
    println!("Requests by host:");
    for (host, count) in &stats.requests_by_host {
        println!("  {}: {}", host, count);
    }
    println!();

    println!("Pages by state:");
    for (state, count) in &report.page_states {
        println!("  {}: {}", state, count);
    }
    println!();

    println!("Companies: {}", report.entities.len());
    println!(
        "  stored: {} new, {} already present, {} failed",
        inserted, present, failed
    );
    match (&report.export_path, &report.export_error) {
        (Some(path), _) => println!("Export: {}", path.display()),
        (None, Some(error)) => println!("Export: failed ({})", error),
        (None, None) => println!("Export: none"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RunStats;

    fn snapshot() -> RunStatsSnapshot {
        let stats = RunStats::new();
        stats.reset();
        stats.record_request("example.com");
        stats.record_request("b.example");
        stats.record_request("example.com");
        stats.finish();
        stats.snapshot()
    }

    #[test]
    fn test_render_stats() {
        let rendered = render_stats(&snapshot());
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines[0], "total=3");
        assert!(lines[1].starts_with("duration_seconds="));
        assert_eq!(&lines[2..], &["b.example=1", "example.com=2"]);
    }

    #[test]
    fn test_write_stats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stats_file(dir.path(), &snapshot()).unwrap();

        assert_eq!(path.file_name().unwrap(), STATS_FILE_NAME);
        assert!(fs::read_to_string(path).unwrap().starts_with("total=3\n"));
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Request counters for one crawl run
///
/// Shared by reference between the coordinator and the fetcher. Increments
/// go through atomics and a mutex-guarded per-host map so they are never
/// lost, even if several fetches are in flight.
#[derive(Debug, Default)]
pub struct RunStats {
    total_requests: AtomicU64,
    pages_fetched: AtomicU64,
    by_host: Mutex<HashMap<String, u64>>,
    window: Mutex<RunWindow>,
}

#[derive(Debug, Default, Clone, Copy)]
struct RunWindow {
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all counters and stamps the run start
    pub fn reset(&self) {
        self.total_requests.store(0, Ordering::SeqCst);
        self.pages_fetched.store(0, Ordering::SeqCst);
        self.lock_hosts().clear();

        let mut window = self.lock_window();
        window.started_at = Some(Utc::now());
        window.finished_at = None;
    }

    /// Counts one outbound request to `host`
    pub fn record_request(&self, host: &str) {
        self.total_requests.fetch_add(1, Ordering::SeqCst);
        *self.lock_hosts().entry(host.to_string()).or_insert(0) += 1;
    }

    /// Counts one fetch attempt against the page budget
    pub fn record_page_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::SeqCst);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::SeqCst)
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched.load(Ordering::SeqCst)
    }

    /// Stamps the run end
    pub fn finish(&self) {
        self.lock_window().finished_at = Some(Utc::now());
    }

    /// Copies the current counters
    ///
    /// An unfinished run reports its duration up to now.
    pub fn snapshot(&self) -> RunStatsSnapshot {
        let window = *self.lock_window();
        let requests_by_host = self
            .lock_hosts()
            .iter()
            .map(|(host, count)| (host.clone(), *count))
            .collect();

        let started_at = window.started_at.unwrap_or_else(Utc::now);
        let finished_at = window.finished_at.unwrap_or_else(Utc::now);
        let duration_seconds =
            ((finished_at - started_at).num_milliseconds().max(0) as f64) / 1000.0;

        RunStatsSnapshot {
            total_requests: self.total_requests(),
            pages_fetched: self.pages_fetched(),
            requests_by_host,
            started_at,
            finished_at: window.finished_at,
            duration_seconds,
        }
    }

    fn lock_hosts(&self) -> std::sync::MutexGuard<'_, HashMap<String, u64>> {
        // A poisoned map still holds valid counts
        self.by_host.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_window(&self) -> std::sync::MutexGuard<'_, RunWindow> {
        self.window.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Frozen run statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatsSnapshot {
    pub total_requests: u64,
    pub pages_fetched: u64,
    /// Sorted by host for stable output
    pub requests_by_host: BTreeMap<String, u64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
}

impl RunStatsSnapshot {
    /// Header pairs a web layer attaches to the crawl response
    ///
    /// # Returns
    ///
    /// `X-Request-Count`, `X-Requests-By-Domain` (a JSON object) and
    /// `X-Crawl-Duration-Seconds`, in that order.
    pub fn response_metadata(&self) -> Vec<(&'static str, String)> {
        let by_host = serde_json::to_string(&self.requests_by_host)
            .unwrap_or_else(|_| "{}".to_string());

        vec![
            ("X-Request-Count", self.total_requests.to_string()),
            ("X-Requests-By-Domain", by_host),
            (
                "X-Crawl-Duration-Seconds",
                format!("{:.2}", self.duration_seconds),
            ),
        ]
    }
}

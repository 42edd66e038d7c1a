//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties together:
//! - Request validation and run setup
//! - The breadth-first frontier
//! - Robots.txt checks and request pacing
//! - Fetching, extraction and deduplication
//! - The CSV export, the statistics file and database persistence

use crate::config::{default_keywords, Config};
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchResult};
use crate::crawler::parser::analyze_page;
use crate::crawler::politeness::PolitenessGate;
use crate::crawler::scheduler::{Admission, CrawlTarget, Frontier};
use crate::entity::{CandidateEntity, DedupOutcome, Deduplicator};
use crate::extract::Extractor;
use crate::output::{export_csv, persist_entities, write_stats_file, PersistReport};
use crate::state::{RunStats, RunStatsSnapshot, TargetState};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::url::CrawlScope;
use crate::{Result, ScoutError};
use chrono::Local;
use reqwest::Client;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Parameters of a single crawl invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Absolute http(s) URL the crawl starts from
    pub seed_url: String,
    /// Host suffix defining the crawl scope; the seed host when absent
    pub allowed_domain: Option<String>,
    /// Maximum number of deduplicated companies to collect
    pub limit: usize,
    /// Maximum number of page fetches
    pub max_pages: usize,
    /// Relevance keywords; the built-in list when empty
    pub keywords: Vec<String>,
}

impl CrawlRequest {
    /// Builds a request from the `[target]` and `[crawler]` config sections
    ///
    /// Returns `None` when the config has no `[target]` section.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.target.as_ref().map(|target| Self {
            seed_url: target.seed_url.clone(),
            allowed_domain: target.allowed_domain.clone(),
            limit: config.crawler.limit,
            max_pages: config.crawler.max_pages,
            keywords: target.keywords.clone(),
        })
    }

    /// Checks the invocation contract and returns the parsed seed
    ///
    /// Nothing here touches the network.
    pub fn validate(&self) -> Result<Url> {
        let seed = self.seed_url.trim();
        if seed.is_empty() {
            return Err(invalid("seed_url cannot be empty"));
        }

        let url = Url::parse(seed)
            .map_err(|e| invalid(format!("seed_url '{}' is not a valid URL: {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(invalid(format!(
                "seed_url '{}' must use http or https",
                seed
            )));
        }

        if url.host_str().is_none() {
            return Err(invalid(format!("seed_url '{}' has no host", seed)));
        }

        if self.limit == 0 {
            return Err(invalid("limit must be >= 1"));
        }

        if self.max_pages == 0 {
            return Err(invalid("max_pages must be >= 1"));
        }

        Ok(url)
    }

    /// Keywords with blanks removed, falling back to the built-in list
    pub fn effective_keywords(&self) -> Vec<String> {
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        if keywords.is_empty() {
            default_keywords()
        } else {
            keywords
        }
    }
}

fn invalid(message: impl Into<String>) -> ScoutError {
    ScoutError::InvalidRequest(message.into())
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct CrawlReport {
    /// Absolute path of the CSV export, `None` if writing it failed
    pub export_path: Option<PathBuf>,
    /// Why the CSV export could not be written
    pub export_error: Option<String>,
    pub stats: RunStatsSnapshot,
    /// Deduplicated entities in discovery order
    pub entities: Vec<CandidateEntity>,
    /// One persistence outcome per entity
    pub persisted: Vec<PersistReport>,
    /// Number of URLs per target state
    pub page_states: BTreeMap<TargetState, usize>,
    pub status: RunStatus,
}

/// Why the crawl loop stopped
enum LoopExit {
    Finished,
    Cancelled,
    TimedOut,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    request: CrawlRequest,
    seed: Url,
    storage: SqliteStorage,
    client: Client,
    gate: PolitenessGate,
    frontier: Frontier,
    extractor: Extractor,
    dedup: Deduplicator,
    stats: RunStats,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Validates the request, opens the database and creates the export
    /// directory before any network activity, so invalid invocations and
    /// unusable output locations fail fast.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `request` - The crawl invocation
    /// * `cancel` - Token stopping the run at its next suspension point
    pub fn new(config: Config, request: CrawlRequest, cancel: CancellationToken) -> Result<Self> {
        let seed = request.validate()?;

        if config.crawler.max_delay_ms < config.crawler.min_delay_ms {
            return Err(invalid(format!(
                "delay range {}..{}ms is inverted",
                config.crawler.min_delay_ms, config.crawler.max_delay_ms
            )));
        }

        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        fs::create_dir_all(&config.output.export_dir)?;
        let client = build_http_client(&config.crawler, &config.user_agent)?;

        let gate = PolitenessGate::new(
            client.clone(),
            config.user_agent.crawler_name.clone(),
            &config.crawler,
        );

        let scope = CrawlScope::new(&seed, request.allowed_domain.as_deref());
        let capacity = request
            .max_pages
            .saturating_mul(config.crawler.frontier_multiplier);
        let frontier = Frontier::new(scope, capacity);

        let extractor = Extractor::new(&config.extraction, &request.effective_keywords());
        let dedup = Deduplicator::new(config.extraction.merge_fields);

        Ok(Self {
            config,
            request,
            seed,
            storage,
            client,
            gate,
            frontier,
            extractor,
            dedup,
            stats: RunStats::new(),
            cancel,
        })
    }

    /// Runs the crawl loop, then exports and persists the results
    ///
    /// Cancellation and the run timeout end the loop early; whatever was
    /// collected until then is still exported and persisted.
    pub async fn run(mut self) -> Result<CrawlReport> {
        self.stats.reset();
        info!(
            "Starting crawl of {} (limit {}, max {} pages)",
            self.seed, self.request.limit, self.request.max_pages
        );

        match self.frontier.seed(self.seed.clone()) {
            Admission::Queued => {}
            admission => warn!("Seed {} not crawlable: {:?}", self.seed, admission),
        }

        let exit = self.crawl_loop().await;
        self.stats.finish();

        let status = match exit {
            LoopExit::Finished => RunStatus::Completed,
            LoopExit::Cancelled => {
                info!("Crawl cancelled, keeping results collected so far");
                RunStatus::Cancelled
            }
            LoopExit::TimedOut => {
                info!("Run timeout reached, keeping results collected so far");
                RunStatus::TimedOut
            }
        };

        self.finish(status)
    }

    async fn crawl_loop(&mut self) -> LoopExit {
        let cancel = self.cancel.clone();
        let deadline = self
            .config
            .crawler
            .run_timeout_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        let timeout = sleep_until_deadline(deadline);
        tokio::pin!(timeout);

        let started = Instant::now();
        let mut processed = 0usize;

        loop {
            if cancel.is_cancelled() {
                return LoopExit::Cancelled;
            }

            if self.dedup.len() >= self.request.limit {
                info!("Result limit of {} reached", self.request.limit);
                return LoopExit::Finished;
            }

            if self.stats.pages_fetched() >= self.request.max_pages as u64 {
                info!("Page budget of {} reached", self.request.max_pages);
                return LoopExit::Finished;
            }

            let Some(target) = self.frontier.pop() else {
                info!("Frontier is empty, crawl complete");
                return LoopExit::Finished;
            };

            let state = tokio::select! {
                _ = cancel.cancelled() => return LoopExit::Cancelled,
                _ = &mut timeout => return LoopExit::TimedOut,
                state = self.process_target(&target) => state,
            };

            let Some(state) = state else {
                return LoopExit::Cancelled;
            };

            debug!("{} -> {}", target.url, state);
            self.frontier.mark(&target.url, state);

            processed += 1;
            if processed % 10 == 0 {
                let elapsed = started.elapsed().as_secs_f64().max(f64::EPSILON);
                info!(
                    "Progress: {} URLs processed, {} pages fetched, {} companies, {} in frontier, {:.2} pages/sec",
                    processed,
                    self.stats.pages_fetched(),
                    self.dedup.len(),
                    self.frontier.pending(),
                    self.stats.pages_fetched() as f64 / elapsed
                );
            }
        }
    }

    /// Processes a single target
    ///
    /// Returns the target's terminal state, or `None` if the run was
    /// cancelled while waiting for its turn.
    async fn process_target(&mut self, target: &CrawlTarget) -> Option<TargetState> {
        if !self.gate.authorize(&target.url).await {
            info!("URL {} disallowed by robots.txt", target.url);
            return Some(TargetState::PolicyBlocked);
        }

        if !self.gate.wait_turn(&target.url, &self.cancel).await {
            return None;
        }

        self.stats.record_page_fetched();

        let state = match fetch_page(&self.client, &target.url, &self.stats).await {
            FetchResult::Html {
                final_url, body, ..
            } => self.handle_html(target, &final_url, &body),

            FetchResult::NotHtml {
                final_url,
                content_type,
                ..
            } => {
                debug!("Skipping {} ({})", final_url, content_type);
                self.frontier.claim_final_url(&final_url, TargetState::NotHtml);
                TargetState::NotHtml
            }

            FetchResult::Unreachable { reason, .. } => {
                debug!("Unreachable {}: {}", target.url, reason);
                TargetState::Unreachable
            }
        };

        Some(state)
    }

    fn handle_html(&mut self, target: &CrawlTarget, final_url: &Url, body: &str) -> TargetState {
        let redirected = final_url.as_str() != target.url.as_str();
        if redirected
            && self
                .frontier
                .state_of(final_url)
                .is_some_and(|state| state.is_visited())
        {
            debug!("{} redirected to visited {}", target.url, final_url);
            return TargetState::AlreadyVisited;
        }

        let analysis = analyze_page(body, final_url, &self.extractor);
        let queued = self.frontier.harvest(analysis.links, target.depth);
        debug!(
            "{}: {} keyword hits, {} new links",
            final_url, analysis.keyword_hits, queued
        );

        let state = match analysis.candidate {
            Some(candidate) => {
                match self.dedup.offer(candidate) {
                    DedupOutcome::Added => info!("Found company on {}", final_url),
                    outcome => debug!("Candidate from {}: {:?}", final_url, outcome),
                }
                TargetState::Extracted
            }
            None => TargetState::NoSignal,
        };

        if redirected {
            self.frontier.claim_final_url(final_url, state);
        }
        state
    }

    /// Writes the export and the stats file, then persists and archives
    ///
    /// A failed export is recorded in the report; persistence still runs.
    fn finish(mut self, status: RunStatus) -> Result<CrawlReport> {
        let stats = self.stats.snapshot();
        let page_states = self.frontier.tally();
        let entities = self.dedup.into_entities();

        let export_dir = Path::new(&self.config.output.export_dir);
        let (export_path, export_error) = match export_csv(&entities, export_dir, Local::now()) {
            Ok(path) => (Some(path), None),
            Err(e) => {
                warn!("Failed to write CSV export: {}", e);
                (None, Some(e.to_string()))
            }
        };

        if let Err(e) = write_stats_file(export_dir, &stats) {
            warn!("Failed to write run statistics file: {}", e);
        }

        let persisted = persist_entities(&mut self.storage, &entities);

        if let Err(e) =
            self.storage
                .archive_run(self.seed.as_str(), &stats, entities.len(), status)
        {
            warn!("Failed to archive run statistics: {}", e);
        }

        info!(
            "Crawl finished: {} companies, {} requests, {} pages in {:.2}s",
            entities.len(),
            stats.total_requests,
            stats.pages_fetched,
            stats.duration_seconds
        );

        Ok(CrawlReport {
            export_path,
            export_error,
            stats,
            entities,
            persisted,
            page_states,
            status,
        })
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Runs one complete crawl
///
/// This function orchestrates the whole process:
///
/// 1. Validate the request and open the database
/// 2. Seed the frontier
/// 3. Crawl loop:
///    a. Pop the next URL
///    b. Check robots.txt
///    c. Wait for the politeness delay
///    d. Fetch the page
///    e. Extract a candidate and deduplicate it
///    f. Queue in-scope links
/// 4. Export CSV and the statistics file
/// 5. Persist entities and archive the run
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `request` - Seed, scope, limits and keywords
/// * `cancel` - Cancels the run; partial results are still persisted
///
/// # Example
///
/// ```no_run
/// use company_scout::config::load_config;
/// use company_scout::crawler::{run_crawl, CrawlRequest};
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("scout.toml"))?;
/// let request = CrawlRequest {
///     seed_url: "https://example.com/".to_string(),
///     allowed_domain: None,
///     limit: 10,
///     max_pages: 50,
///     keywords: vec![],
/// };
/// let report = run_crawl(config, request, CancellationToken::new()).await?;
/// if let Some(path) = &report.export_path {
///     println!("{}", path.display());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    request: CrawlRequest,
    cancel: CancellationToken,
) -> Result<CrawlReport> {
    Coordinator::new(config, request, cancel)?.run().await
}

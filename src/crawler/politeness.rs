//! Robots.txt authorization and request pacing
//!
//! The crawler runs a single outbound stream, so pacing is global: every
//! fetch after the first waits a random delay drawn from the configured
//! range, or the host's robots.txt `Crawl-delay` if that is longer.

use crate::config::CrawlerConfig;
use crate::robots::{fetch_robots, RobotsCache};
use crate::url::host_key;
use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Upper bound on a robots.txt `Crawl-delay`
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(120);

pub struct PolitenessGate {
    client: Client,
    /// Product token matched against robots.txt user-agent lines
    agent: String,
    robots: RobotsCache,
    min_delay: Duration,
    max_delay: Duration,
    last_fetch: Option<Instant>,
}

impl PolitenessGate {
    pub fn new(client: Client, agent: impl Into<String>, config: &CrawlerConfig) -> Self {
        Self {
            client,
            agent: agent.into(),
            robots: RobotsCache::new(),
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.min_delay_ms)),
            last_fetch: None,
        }
    }

    /// Checks robots.txt for `url`
    ///
    /// The host's robots.txt is fetched on first use and cached for the
    /// rest of the run. Any failure to obtain it allows the URL.
    pub async fn authorize(&mut self, url: &Url) -> bool {
        let key = host_key(url);

        if self.robots.get(&key).is_none() {
            let robots = fetch_robots(&self.client, url).await;
            debug!(
                host = %key,
                allow_all = robots.is_allow_all(),
                "Cached robots.txt"
            );
            self.robots.insert(key.clone(), robots);
        }

        self.robots
            .get(&key)
            .map_or(true, |cached| cached.robots.is_allowed(url, &self.agent))
    }

    /// Waits until the next fetch to `url` may be sent
    ///
    /// Returns `false` if `cancel` fired while waiting. The first fetch of a
    /// run never waits.
    pub async fn wait_turn(&mut self, url: &Url, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        if let Some(last) = self.last_fetch {
            let delay = self.next_delay(url);
            let ready_at = last
                .checked_add(delay)
                .unwrap_or_else(|| Instant::now() + MAX_CRAWL_DELAY);

            if ready_at > Instant::now() {
                tokio::select! {
                    _ = cancel.cancelled() => return false,
                    _ = tokio::time::sleep_until(ready_at) => {}
                }
            }
        }

        self.last_fetch = Some(Instant::now());
        true
    }

    /// Delay before the next fetch to `url`
    pub fn next_delay(&self, url: &Url) -> Duration {
        let jitter = if self.max_delay > self.min_delay {
            rand::thread_rng().gen_range(self.min_delay..=self.max_delay)
        } else {
            self.min_delay
        };

        let crawl_delay = self
            .robots
            .get(&host_key(url))
            .and_then(|cached| cached.robots.crawl_delay(&self.agent))
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .map_or(Duration::ZERO, |delay| delay.min(MAX_CRAWL_DELAY));

        jitter.max(crawl_delay)
    }

    /// Number of hosts whose robots.txt has been consulted
    pub fn hosts_seen(&self) -> usize {
        self.robots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots::ParsedRobots;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(min: u64, max: u64) -> CrawlerConfig {
        CrawlerConfig {
            limit: 10,
            max_pages: 10,
            min_delay_ms: min,
            max_delay_ms: max,
            request_timeout_secs: 2,
            frontier_multiplier: 5,
            run_timeout_secs: None,
        }
    }

    fn gate(min: u64, max: u64) -> PolitenessGate {
        PolitenessGate::new(Client::new(), "TestScout", &config(min, max))
    }

    #[test]
    fn test_delay_within_range() {
        let gate = gate(100, 150);
        let url = Url::parse("https://example.com/").unwrap();

        for _ in 0..50 {
            let delay = gate.next_delay(&url);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[tokio::test]
    async fn test_robots_disallow_and_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("User-agent: TestScout\nDisallow: /private\nCrawl-delay: 2"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut gate = gate(100, 100);
        let public = Url::parse(&format!("{}/list", server.uri())).unwrap();
        let private = Url::parse(&format!("{}/private/1", server.uri())).unwrap();

        assert!(gate.authorize(&public).await);
        assert!(!gate.authorize(&private).await);
        assert_eq!(gate.hosts_seen(), 1);

        // Crawl-delay outranks the configured range
        assert_eq!(gate.next_delay(&public), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_huge_crawl_delay_is_capped() {
        for value in ["1e300", "1e15"] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/robots.txt"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(format!("User-agent: *\nCrawl-delay: {}", value)),
                )
                .mount(&server)
                .await;

            let mut gate = gate(100, 100);
            let url = Url::parse(&format!("{}/", server.uri())).unwrap();
            assert!(gate.authorize(&url).await);
            assert_eq!(gate.next_delay(&url), MAX_CRAWL_DELAY);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_turn_survives_huge_crawl_delay() {
        let mut gate = gate(100, 100);
        let url = Url::parse("https://example.com/").unwrap();
        let cancel = CancellationToken::new();
        gate.robots.insert(
            host_key(&url),
            ParsedRobots::from_content("User-agent: *\nCrawl-delay: 1e300"),
        );

        let start = Instant::now();
        assert!(gate.wait_turn(&url, &cancel).await);
        assert!(gate.wait_turn(&url, &cancel).await);
        assert!(start.elapsed() >= MAX_CRAWL_DELAY);
    }

    #[tokio::test]
    async fn test_missing_robots_allows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut gate = gate(100, 100);
        let url = Url::parse(&format!("{}/anything", server.uri())).unwrap();
        assert!(gate.authorize(&url).await);
    }

    #[tokio::test]
    async fn test_server_error_robots_allows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut gate = gate(100, 100);
        let url = Url::parse(&format!("{}/", server.uri())).unwrap();
        assert!(gate.authorize(&url).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_turn_spaces_fetches() {
        let mut gate = gate(1000, 1000);
        let url = Url::parse("https://example.com/").unwrap();
        let cancel = CancellationToken::new();

        let start = Instant::now();
        assert!(gate.wait_turn(&url, &cancel).await);
        assert_eq!(start.elapsed(), Duration::ZERO);

        assert!(gate.wait_turn(&url, &cancel).await);
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_turn_honours_cancellation() {
        let mut gate = gate(60_000, 60_000);
        let url = Url::parse("https://example.com/").unwrap();
        let cancel = CancellationToken::new();

        assert!(gate.wait_turn(&url, &cancel).await);

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        assert!(!gate.wait_turn(&url, &cancel).await);
        assert!(start.elapsed() < Duration::from_secs(60));
    }
}

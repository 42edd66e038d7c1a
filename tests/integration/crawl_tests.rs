//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl, export and persistence cycle end-to-end.

use company_scout::config::{
    Config, CrawlerConfig, ExtractionConfig, OutputConfig, UserAgentConfig,
};
use company_scout::crawler::{run_crawl, CrawlReport, CrawlRequest};
use company_scout::output::{PersistOutcome, CSV_HEADER};
use company_scout::storage::{RunStatus, SqliteStorage, Storage};
use company_scout::{ScoutError, TargetState};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir`
fn create_test_config(dir: &Path, min_delay_ms: u64) -> Config {
    Config {
        crawler: CrawlerConfig {
            limit: 10,
            max_pages: 10,
            min_delay_ms,
            max_delay_ms: min_delay_ms + 20,
            request_timeout_secs: 5,
            frontier_multiplier: 5,
            run_timeout_secs: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestScout".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "bot@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: dir.join("scout.db").to_string_lossy().into_owned(),
            export_dir: dir.join("exports").to_string_lossy().into_owned(),
        },
        extraction: ExtractionConfig::default(),
        target: None,
    }
}

fn request(seed_url: String, limit: usize) -> CrawlRequest {
    CrawlRequest {
        seed_url,
        allowed_domain: None,
        limit,
        max_pages: 10,
        keywords: vec![],
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Reads a run's export, checking the BOM and the header row
fn read_export(report: &CrawlReport) -> Vec<String> {
    let path = report.export_path.as_ref().expect("Run wrote no export");
    let content = std::fs::read_to_string(path).expect("Failed to read export");
    let content = content
        .strip_prefix('\u{feff}')
        .expect("Export must start with a BOM");

    let mut lines = content.lines().map(str::to_string);
    assert_eq!(lines.next().as_deref(), Some(CSV_HEADER.join(",").as_str()));
    lines.collect()
}

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[tokio::test]
async fn test_signal_less_seed_exports_header_only() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<p>Welcome to our directory.</p>").await;

    let dir = temp_dir();
    let config = create_test_config(dir.path(), 100);

    let report = run_crawl(config, request(format!("{}/", server.uri()), 5), CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stats.total_requests, 1);
    assert_eq!(report.stats.pages_fetched, 1);
    assert!(report.entities.is_empty());
    assert!(report.persisted.is_empty());
    assert_eq!(report.page_states.get(&TargetState::NoSignal), Some(&1));
    assert!(read_export(&report).is_empty());

    // Statistics file lands next to the export
    let stats_file = dir.path().join("exports").join("last_run_stats.txt");
    let stats = std::fs::read_to_string(stats_file).expect("Missing stats file");
    assert!(stats.starts_with("total=1\n"));
}

#[tokio::test]
async fn test_limit_one_stays_in_scope() {
    let server = MockServer::start().await;
    let outside = MockServer::start().await;

    // The second server is reached through "localhost", a different host
    let outside_port = url::Url::parse(&outside.uri()).unwrap().port().unwrap();
    Mock::given(any())
        .respond_with(html("<h1>株式会社アウトサイド</h1>"))
        .expect(0)
        .mount(&outside)
        .await;

    mount_page(
        &server,
        "/",
        &format!(
            r#"<p>Listing</p>
            <a href="http://localhost:{}/b">B</a>
            <a href="/a">A</a>"#,
            outside_port
        ),
    )
    .await;
    mount_page(
        &server,
        "/a",
        "<h1>株式会社テスト建設</h1><p>info@test-kensetsu.example.jp</p><a href=\"/c\">more</a>",
    )
    .await;
    mount_page(&server, "/c", "<h1>有限会社ほかの工務店</h1>").await;

    let dir = temp_dir();
    let config = create_test_config(dir.path(), 100);
    let seed = format!("{}/", server.uri());

    let mut limit_one = request(seed, 1);
    limit_one.max_pages = 5;

    let report = run_crawl(config, limit_one, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.entities.len(), 1);
    let entity = &report.entities[0];
    assert_eq!(entity.source_url, format!("{}/a", server.uri()));
    assert_eq!(entity.name.as_deref(), Some("株式会社テスト建設"));
    assert_eq!(entity.email.as_deref(), Some("info@test-kensetsu.example.jp"));

    // Seed and A only; the limit stopped the run before /c
    assert_eq!(report.stats.total_requests, 2);
    assert_eq!(report.page_states.get(&TargetState::OutOfScope), Some(&1));

    let rows = read_export(&report);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].contains("株式会社テスト建設"));
}

#[tokio::test]
async fn test_page_budget_stops_crawl() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<p>Index</p>
        <a href="/p1">1</a><a href="/p2">2</a><a href="/p3">3</a><a href="/p4">4</a>"#,
    )
    .await;
    mount_page(&server, "/p1", "<h1>株式会社ワン建設</h1>").await;
    for page in ["/p2", "/p3", "/p4"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html("<h1>株式会社予算外</h1>"))
            .expect(0)
            .mount(&server)
            .await;
    }

    let dir = temp_dir();
    let config = create_test_config(dir.path(), 100);
    let mut budget_two = request(format!("{}/", server.uri()), 10);
    budget_two.max_pages = 2;

    let report = run_crawl(config, budget_two, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stats.pages_fetched, 2);
    assert_eq!(report.stats.total_requests, 2);
    assert_eq!(report.entities.len(), 1);
    assert_eq!(report.page_states.get(&TargetState::Discovered), Some(&3));
    assert_eq!(read_export(&report).len(), 1);
}

#[tokio::test]
async fn test_shared_homepage_keeps_first_entity() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<p>Members</p><a href="/one">One</a><a href="/two">Two</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/one",
        r#"<h1>株式会社エーシー建設</h1>
        <a href="https://acme.example.jp/">公式サイト</a>
        <p>info@acme.example.jp</p>"#,
    )
    .await;
    mount_page(
        &server,
        "/two",
        r#"<h1>株式会社エーシー建設 本店</h1>
        <a href="https://acme.example.jp">公式サイト</a>
        <p>TEL 06-9876-5432</p>"#,
    )
    .await;

    let dir = temp_dir();
    let config = create_test_config(dir.path(), 100);
    let seed = format!("{}/", server.uri());

    let report = run_crawl(config, request(seed, 10), CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.stats.pages_fetched, 3);
    assert_eq!(report.entities.len(), 1);

    let entity = &report.entities[0];
    assert_eq!(entity.source_url, format!("{}/one", server.uri()));
    assert_eq!(entity.name.as_deref(), Some("株式会社エーシー建設"));
    assert_eq!(entity.email.as_deref(), Some("info@acme.example.jp"));
    assert_eq!(entity.phone, None);
    assert_eq!(report.page_states.get(&TargetState::Extracted), Some(&2));

    let storage = SqliteStorage::new(Path::new(&dir.path().join("scout.db"))).unwrap();
    assert_eq!(storage.count_companies().unwrap(), 1);
    let stored = storage
        .get_company_by_site("https://acme.example.jp/")
        .unwrap()
        .expect("Company not stored");
    assert_eq!(stored.company_name.as_deref(), Some("株式会社エーシー建設"));
}

#[tokio::test]
async fn test_robots_disallowed_seed_is_never_fetched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<h1>株式会社ひみつ</h1>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = temp_dir();
    let config = create_test_config(dir.path(), 100);

    let report = run_crawl(config, request(format!("{}/", server.uri()), 5), CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.stats.total_requests, 0);
    assert_eq!(report.stats.pages_fetched, 0);
    assert!(report.entities.is_empty());
    assert_eq!(report.page_states.get(&TargetState::PolicyBlocked), Some(&1));
    assert!(read_export(&report).is_empty());
}

#[tokio::test]
async fn test_second_run_reports_already_present() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "<h1>株式会社リピート工務店</h1><p>〒100-0001 東京都千代田区千代田1-1</p>",
    )
    .await;

    let dir = temp_dir();
    let seed = format!("{}/", server.uri());

    let first = run_crawl(
        create_test_config(dir.path(), 100),
        request(seed.clone(), 5),
        CancellationToken::new(),
    )
    .await
    .expect("First crawl failed");
    assert_eq!(first.persisted.len(), 1);
    assert_eq!(first.persisted[0].outcome, PersistOutcome::Inserted);

    let second = run_crawl(
        create_test_config(dir.path(), 100),
        request(seed, 5),
        CancellationToken::new(),
    )
    .await
    .expect("Second crawl failed");
    assert_eq!(second.persisted.len(), 1);
    assert_eq!(second.persisted[0].outcome, PersistOutcome::AlreadyPresent);
    assert_ne!(first.export_path, second.export_path);

    let storage = SqliteStorage::new(Path::new(&dir.path().join("scout.db"))).unwrap();
    assert_eq!(storage.count_companies().unwrap(), 1);

    let latest = storage.get_latest_run().unwrap().expect("Run not archived");
    assert_eq!(latest.total_requests, 1);
    assert_eq!(latest.entities_found, 1);
    assert_eq!(latest.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_invalid_request_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = temp_dir();

    let empty_seed = run_crawl(
        create_test_config(dir.path(), 100),
        request(String::new(), 5),
        CancellationToken::new(),
    )
    .await;
    assert!(matches!(empty_seed, Err(ScoutError::InvalidRequest(_))));

    let zero_limit = run_crawl(
        create_test_config(dir.path(), 100),
        request(format!("{}/", server.uri()), 0),
        CancellationToken::new(),
    )
    .await;
    assert!(matches!(zero_limit, Err(ScoutError::InvalidRequest(_))));

    assert!(!dir.path().join("exports").exists());
}

#[tokio::test]
async fn test_cancellation_keeps_collected_entities() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<h1>株式会社キャンセル建設</h1>
        <a href="/next">next</a><a href="/other">other</a>"#,
    )
    .await;
    mount_page(&server, "/next", "<h1>株式会社ネクスト</h1>").await;
    mount_page(&server, "/other", "<h1>株式会社アザー</h1>").await;

    let dir = temp_dir();
    // Long enough that the second fetch is still waiting when cancelled
    let config = create_test_config(dir.path(), 5_000);
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        canceller.cancel();
    });

    let report = run_crawl(config, request(format!("{}/", server.uri()), 10), cancel)
        .await
        .expect("Crawl failed");

    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(report.stats.total_requests, 1);
    assert_eq!(report.entities.len(), 1);
    assert_eq!(read_export(&report).len(), 1);
}

#[tokio::test]
async fn test_run_timeout_stops_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<h1>株式会社タイムアウト</h1><a href="/later">later</a>"#,
    )
    .await;
    mount_page(&server, "/later", "<h1>株式会社レイター</h1>").await;

    let dir = temp_dir();
    let mut config = create_test_config(dir.path(), 5_000);
    config.crawler.run_timeout_secs = Some(1);

    let report = run_crawl(config, request(format!("{}/", server.uri()), 10), CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.status, RunStatus::TimedOut);
    assert_eq!(report.stats.total_requests, 1);
    assert_eq!(report.entities.len(), 1);
}

//! Company-Scout main entry point
//!
//! This is the command-line interface for the Company-Scout crawler.

use anyhow::{bail, Context};
use clap::Parser;
use company_scout::config::{default_keywords, load_config_with_hash, Config};
use company_scout::crawler::{run_crawl, CrawlRequest};
use company_scout::output::{load_statistics, print_run_summary, print_statistics};
use company_scout::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Company-Scout: a polite business-directory crawler
///
/// Company-Scout crawls a seed website breadth-first while respecting
/// robots.txt and request delays, extracts company contact details and
/// stores them as a CSV export and in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "company-scout")]
#[command(version = "1.0.0")]
#[command(about = "A polite business-directory crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL (overrides [target] seed-url)
    #[arg(long)]
    seed_url: Option<String>,

    /// Restrict the crawl to hosts ending with this domain
    #[arg(long)]
    allowed_domain: Option<String>,

    /// Maximum number of companies to collect
    #[arg(long)]
    limit: Option<usize>,

    /// Maximum number of pages to fetch
    #[arg(long)]
    max_pages: Option<usize>,

    /// Relevance keyword; repeat for several (replaces the configured list)
    #[arg(long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective request without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.stats {
        return handle_stats(&config);
    }

    let request = build_request(&cli, &config)?;

    if cli.dry_run {
        return handle_dry_run(&config, &request);
    }

    handle_crawl(config, request).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("company_scout=info,warn"),
            1 => EnvFilter::new("company_scout=debug,info"),
            2 => EnvFilter::new("company_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Merges command-line flags over the `[target]` and `[crawler]` sections
fn build_request(cli: &Cli, config: &Config) -> anyhow::Result<CrawlRequest> {
    let mut request = CrawlRequest::from_config(config).unwrap_or_else(|| CrawlRequest {
        seed_url: String::new(),
        allowed_domain: None,
        limit: config.crawler.limit,
        max_pages: config.crawler.max_pages,
        keywords: default_keywords(),
    });

    if let Some(seed) = &cli.seed_url {
        request.seed_url = seed.clone();
    }
    if let Some(domain) = &cli.allowed_domain {
        request.allowed_domain = Some(domain.clone());
    }
    if let Some(limit) = cli.limit {
        request.limit = limit;
    }
    if let Some(max_pages) = cli.max_pages {
        request.max_pages = max_pages;
    }
    if !cli.keywords.is_empty() {
        request.keywords = cli.keywords.clone();
    }

    if request.seed_url.trim().is_empty() {
        bail!("No seed URL: pass --seed-url or add a [target] section to the config");
    }

    request.validate()?;
    Ok(request)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, request: &CrawlRequest) -> anyhow::Result<()> {
    println!("=== Company-Scout Dry Run ===\n");

    println!("Request:");
    println!("  Seed URL: {}", request.seed_url);
    println!(
        "  Allowed domain: {}",
        request.allowed_domain.as_deref().unwrap_or("(seed host only)")
    );
    println!("  Limit: {}", request.limit);
    println!("  Max pages: {}", request.max_pages);
    println!("  Keywords: {}", request.effective_keywords().join(", "));

    println!("\nCrawler Configuration:");
    println!(
        "  Delay: {}-{}ms",
        config.crawler.min_delay_ms, config.crawler.max_delay_ms
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Frontier capacity: {}",
        request
            .max_pages
            .saturating_mul(config.crawler.frontier_multiplier)
    );
    match config.crawler.run_timeout_secs {
        Some(secs) => println!("  Run timeout: {}s", secs),
        None => println!("  Run timeout: none"),
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Export directory: {}", config.output.export_dir);

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, 10)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, request: CrawlRequest) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            on_interrupt.cancel();
        }
    });

    let report = run_crawl(config, request, cancel)
        .await
        .context("Crawl failed")?;

    print_run_summary(&report);
    println!();
    for (header, value) in report.stats.response_metadata() {
        println!("{}: {}", header, value);
    }

    Ok(())
}

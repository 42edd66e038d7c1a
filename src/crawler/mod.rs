//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a bounded redirect chain
//! - HTML analysis and link extraction
//! - Robots.txt checks and request pacing
//! - The breadth-first frontier
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod politeness;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlReport, CrawlRequest};
pub use fetcher::{build_http_client, fetch_page, FetchResult, MAX_REDIRECTS};
pub use parser::{analyze_page, harvest_links, PageAnalysis};
pub use politeness::{PolitenessGate, MAX_CRAWL_DELAY};
pub use scheduler::{Admission, CrawlTarget, Frontier};

//! Robots.txt handling module
//!
//! This module provides fetching, evaluation and per-run caching of
//! robots.txt files. Every failure to obtain a robots.txt fails open.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

/// Location of the robots.txt governing `url`
///
/// Returns `None` for URLs without a host.
pub fn robots_url(url: &Url) -> Option<Url> {
    url.host_str()?;
    url.join("/robots.txt").ok()
}

/// Fetches and parses robots.txt for the host of `url`
///
/// Network errors, non-2xx statuses and unreadable bodies all yield
/// [`ParsedRobots::allow_all`]. The request is not counted in run stats.
///
/// # Arguments
///
/// * `client` - HTTP client carrying the crawler's user agent
/// * `url` - Any URL on the host
pub async fn fetch_robots(client: &Client, url: &Url) -> ParsedRobots {
    let Some(robots_url) = robots_url(url) else {
        return ParsedRobots::allow_all();
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Failed to fetch {}: {}; allowing all", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        debug!(
            "No robots.txt at {} (HTTP {}); allowing all",
            robots_url,
            response.status()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            warn!("Failed to read {}: {}; allowing all", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}

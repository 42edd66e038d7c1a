//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building the HTTP client with the crawler's user agent string
//! - Counting every request attempt in the run statistics
//! - Classifying responses into HTML, non-HTML and unreachable

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::state::RunStats;
use crate::url::host_key;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Redirect hops followed before a fetch is abandoned
pub const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Html {
        /// Final URL after redirects
        final_url: Url,
        /// `host[:port]` of the final URL
        host: String,
        body: String,
    },

    /// Response was not HTML (Content-Type mismatch)
    NotHtml {
        final_url: Url,
        host: String,
        /// The actual Content-Type received (empty if absent)
        content_type: String,
    },

    /// Network error, timeout, redirect overflow or non-2xx status
    Unreachable {
        /// `host[:port]` of the requested URL
        host: String,
        reason: String,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Crawler settings (request timeout)
/// * `user_agent` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use company_scout::config::load_config;
/// use company_scout::crawler::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("scout.toml")).unwrap();
/// let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.request_timeout_secs.min(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page once
///
/// The request is counted against the host in `stats` before it is sent,
/// so failed attempts show up in the totals too. Nothing is retried.
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with `text/html` or `application/xhtml+xml` | `Html` |
/// | 2xx with any other or no Content-Type | `NotHtml` |
/// | Non-2xx status | `Unreachable` |
/// | Timeout, connection error, > 10 redirects | `Unreachable` |
pub async fn fetch_page(client: &Client, url: &Url, stats: &RunStats) -> FetchResult {
    let requested_host = host_key(url);
    stats.record_request(&requested_host);

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            return FetchResult::Unreachable {
                host: requested_host,
                reason: classify_error(&e),
            }
        }
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::Unreachable {
            host: requested_host,
            reason: format!("HTTP {}", status.as_u16()),
        };
    }

    let final_url = response.url().clone();
    let host = host_key(&final_url);
    if final_url != *url {
        debug!("{} redirected to {}", url, final_url);
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html(&content_type) {
        return FetchResult::NotHtml {
            final_url,
            host,
            content_type,
        };
    }

    match response.text().await {
        Ok(body) => FetchResult::Html {
            final_url,
            host,
            body,
        },
        Err(e) => FetchResult::Unreachable {
            host,
            reason: classify_error(&e),
        },
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

fn classify_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_redirect() {
        format!("Redirect chain exceeded {} hops", MAX_REDIRECTS)
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    }
}

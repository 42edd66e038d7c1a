//! Page analysis for the crawl loop
//!
//! This module turns a fetched HTML body into:
//! - A candidate entity (via the extractor)
//! - Links to follow (from `<a href>` tags)
//!
//! Parsing is synchronous and owns the parsed tree for its whole lifetime,
//! so no HTML tree is ever held across an await point.

use crate::entity::CandidateEntity;
use crate::extract::{Anchor, Extractor, PageDocument};
use url::Url;

/// Everything the coordinator needs from one HTML page
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub candidate: Option<CandidateEntity>,
    /// Distinct signal terms found in the page text
    pub keyword_hits: usize,
    /// Absolute http(s) URLs to offer to the frontier
    pub links: Vec<Url>,
}

/// Parses a page and runs extraction and link harvesting on it
///
/// # Arguments
///
/// * `html` - The HTML body
/// * `final_url` - Post-redirect URL, used to resolve relative links
/// * `extractor` - The run's extractor
pub fn analyze_page(html: &str, final_url: &Url, extractor: &Extractor) -> PageAnalysis {
    let document = PageDocument::parse(html, final_url);

    PageAnalysis {
        candidate: extractor.extract(&document),
        keyword_hits: extractor.keyword_hits(&document),
        links: harvest_links(&document),
    }
}

/// Extracts followable links from a parsed page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that does not resolve to an http(s) URL
///
/// **Note:** `rel="nofollow"` links are followed
pub fn harvest_links(document: &PageDocument) -> Vec<Url> {
    document.anchors.iter().filter_map(followable).collect()
}

fn followable(anchor: &Anchor) -> Option<Url> {
    if anchor.download {
        return None;
    }

    let href = anchor.href.to_ascii_lowercase();
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
        || href.starts_with('#')
    {
        return None;
    }

    anchor
        .url
        .as_ref()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
        .cloned()
}

//! URL handling module for Company-Scout
//!
//! This module provides URL normalization, host extraction and the domain
//! scope filter applied to every discovered link.

mod domain;
mod normalize;
mod scope;

// Re-export main functions
pub use domain::{extract_domain, host_key};
pub use normalize::{canonicalize, normalize_url};
pub use scope::CrawlScope;

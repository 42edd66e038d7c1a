//! Company entities and their deduplication
//!
//! A `CandidateEntity` is what the extractor pulls out of a single page.
//! The `Deduplicator` folds candidates from many pages into one record per
//! canonical site.

mod dedup;

pub use dedup::{DedupOutcome, Deduplicator};

use crate::url::normalize_url;
use serde::Serialize;

/// Contact facts extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CandidateEntity {
    pub name: Option<String>,
    pub homepage_url: Option<String>,
    pub contact_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Page the facts were read from
    pub source_url: String,
}

impl CandidateEntity {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Self::default()
        }
    }

    /// True when none of the optional fields carries a value
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|field| field.is_none())
    }

    /// Canonical identity: normalized homepage, else normalized source URL
    ///
    /// # Examples
    ///
    /// ```
    /// use company_scout::CandidateEntity;
    ///
    /// let mut entity = CandidateEntity::new("https://dir.example/c/1#top");
    /// assert_eq!(entity.identity_key(), "https://dir.example/c/1");
    ///
    /// entity.homepage_url = Some("https://Acme.example/".to_string());
    /// assert_eq!(entity.identity_key(), "https://acme.example/");
    /// ```
    pub fn identity_key(&self) -> String {
        match self.homepage_url.as_deref() {
            Some(homepage) => normalize_url(homepage),
            None => normalize_url(&self.source_url),
        }
    }

    /// Fills absent fields from `other`, never overwriting present ones
    pub fn fill_missing_from(&mut self, other: &CandidateEntity) {
        fill(&mut self.name, &other.name);
        fill(&mut self.homepage_url, &other.homepage_url);
        fill(&mut self.contact_url, &other.contact_url);
        fill(&mut self.email, &other.email);
        fill(&mut self.phone, &other.phone);
        fill(&mut self.address, &other.address);
    }

    fn fields(&self) -> [&Option<String>; 6] {
        [
            &self.name,
            &self.homepage_url,
            &self.contact_url,
            &self.email,
            &self.phone,
            &self.address,
        ]
    }
}

fn fill(slot: &mut Option<String>, value: &Option<String>) {
    if slot.is_none() {
        slot.clone_from(value);
    }
}

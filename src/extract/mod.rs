//! Heuristic extraction of company facts from HTML pages
//!
//! The `Extractor` first applies a relevance gate (enough distinct keyword
//! hits in the page text) and then runs the ordered rules in
//! [`rules::RULES`] to fill a `CandidateEntity`.

pub mod document;
pub mod rules;

pub use document::{Anchor, LabelPair, PageDocument};

use crate::config::ExtractionConfig;
use crate::entity::CandidateEntity;
use rules::{contains_token, Field, RULES};
use tracing::trace;

/// Token lists the rules match against
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub company_words: Vec<String>,
    pub contact_words: Vec<String>,
    pub site_words: Vec<String>,
    pub address_words: Vec<String>,
}

impl Vocabulary {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            company_words: config.company_words.clone(),
            contact_words: config.contact_words.clone(),
            site_words: config.site_words.clone(),
            address_words: config.address_words.clone(),
        }
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

/// Turns page documents into candidate entities
#[derive(Debug, Clone)]
pub struct Extractor {
    vocabulary: Vocabulary,
    /// Union of the run keywords and the company words, deduplicated
    signal_terms: Vec<String>,
    min_keyword_hits: usize,
}

impl Extractor {
    /// Creates an extractor for one run
    ///
    /// # Arguments
    ///
    /// * `config` - Vocabulary and relevance threshold
    /// * `keywords` - Run-specific keywords counted by the relevance gate
    pub fn new(config: &ExtractionConfig, keywords: &[String]) -> Self {
        let mut signal_terms: Vec<String> = Vec::new();
        for term in keywords.iter().chain(&config.company_words) {
            let term = term.trim();
            if !term.is_empty() && !signal_terms.iter().any(|t| t == term) {
                signal_terms.push(term.to_string());
            }
        }

        Self {
            vocabulary: Vocabulary::from_config(config),
            signal_terms,
            min_keyword_hits: config.min_keyword_hits,
        }
    }

    /// Number of distinct signal terms present in the page text
    pub fn keyword_hits(&self, doc: &PageDocument) -> usize {
        self.signal_terms
            .iter()
            .filter(|term| contains_token(&doc.text, term))
            .count()
    }

    pub fn is_relevant(&self, doc: &PageDocument) -> bool {
        self.keyword_hits(doc) >= self.min_keyword_hits
    }

    /// Extracts a candidate from the page
    ///
    /// Returns `None` when the page fails the relevance gate or no rule
    /// produced any field.
    pub fn extract(&self, doc: &PageDocument) -> Option<CandidateEntity> {
        if !self.is_relevant(doc) {
            trace!(url = %doc.url, "Page below keyword threshold");
            return None;
        }

        let mut entity = CandidateEntity::new(doc.url.as_str());
        for rule in RULES {
            let slot = match rule.field {
                Field::Name => &mut entity.name,
                Field::Contact => &mut entity.contact_url,
                Field::Homepage => &mut entity.homepage_url,
                Field::Email => &mut entity.email,
                Field::Phone => &mut entity.phone,
                Field::Address => &mut entity.address,
            };
            if slot.is_some() {
                continue;
            }
            if let Some(value) = (rule.apply)(doc, &self.vocabulary) {
                trace!(rule = rule.name, value = %value, "Rule matched");
                *slot = Some(value);
            }
        }

        (!entity.is_empty()).then_some(entity)
    }
}

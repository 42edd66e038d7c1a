use crate::entity::CandidateEntity;
use std::collections::HashMap;
use tracing::debug;

/// Result of offering a candidate to the deduplicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// First candidate seen for its identity key
    Added,
    /// Key already present; the candidate was dropped
    Duplicate,
    /// Key already present; empty fields of the kept entity were filled
    Merged,
    /// Candidate carried no fields and was discarded
    Empty,
}

/// Insertion-ordered set of entities keyed by identity
#[derive(Debug, Default)]
pub struct Deduplicator {
    entities: Vec<CandidateEntity>,
    index: HashMap<String, usize>,
    merge_fields: bool,
}

impl Deduplicator {
    /// Creates an empty deduplicator
    ///
    /// With `merge_fields` set, later duplicates fill the kept entity's
    /// absent fields instead of being dropped outright.
    pub fn new(merge_fields: bool) -> Self {
        Self {
            merge_fields,
            ..Self::default()
        }
    }

    pub fn offer(&mut self, candidate: CandidateEntity) -> DedupOutcome {
        if candidate.is_empty() {
            return DedupOutcome::Empty;
        }

        let key = candidate.identity_key();
        match self.index.get(&key) {
            Some(&position) => {
                debug!(key = %key, source = %candidate.source_url, "Duplicate entity");
                if !self.merge_fields {
                    return DedupOutcome::Duplicate;
                }
                self.entities[position].fill_missing_from(&candidate);
                DedupOutcome::Merged
            }
            None => {
                self.index.insert(key, self.entities.len());
                self.entities.push(candidate);
                DedupOutcome::Added
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[CandidateEntity] {
        &self.entities
    }

    pub fn into_entities(self) -> Vec<CandidateEntity> {
        self.entities
    }
}

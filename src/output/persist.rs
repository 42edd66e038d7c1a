//! Transactional persistence of deduplicated companies
//!
//! Each entity is written in its own transaction. A failure on one entity
//! is recorded in its report and never stops the batch.

use crate::entity::CandidateEntity;
use crate::storage::{InsertOutcome, Storage};
use std::fmt;
use tracing::{debug, warn};

/// What happened to one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Inserted,
    /// A company with the same site was stored earlier; nothing was changed
    AlreadyPresent,
    /// The transaction was rolled back
    Failed(String),
}

impl fmt::Display for PersistOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted => write!(f, "inserted"),
            Self::AlreadyPresent => write!(f, "already_present"),
            Self::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReport {
    /// `company_site` key of the entity
    pub company_site: String,
    pub outcome: PersistOutcome,
}

/// Persists every entity, one transaction each
///
/// # Arguments
///
/// * `storage` - The storage backend
/// * `entities` - Deduplicated entities, in export order
///
/// # Returns
///
/// One report per entity, in input order
pub fn persist_entities(
    storage: &mut dyn Storage,
    entities: &[CandidateEntity],
) -> Vec<PersistReport> {
    entities
        .iter()
        .filter(|entity| !entity.is_empty())
        .map(|entity| {
            let company_site = entity.identity_key();
            let outcome = match storage.insert_company_if_absent(entity) {
                Ok(InsertOutcome::Inserted(id)) => {
                    debug!("Stored company {} as #{}", company_site, id);
                    PersistOutcome::Inserted
                }
                Ok(InsertOutcome::AlreadyPresent(_)) => {
                    debug!("Company {} already stored", company_site);
                    PersistOutcome::AlreadyPresent
                }
                Err(e) => {
                    warn!("Failed to store company {}: {}", company_site, e);
                    PersistOutcome::Failed(e.to_string())
                }
            };

            PersistReport {
                company_site,
                outcome,
            }
        })
        .collect()
}

/// Counts reports by outcome: (inserted, already present, failed)
pub fn summarize(reports: &[PersistReport]) -> (usize, usize, usize) {
    reports
        .iter()
        .fold((0, 0, 0), |(ins, dup, fail), r| match r.outcome {
            PersistOutcome::Inserted => (ins + 1, dup, fail),
            PersistOutcome::AlreadyPresent => (ins, dup + 1, fail),
            PersistOutcome::Failed(_) => (ins, dup, fail + 1),
        })
}

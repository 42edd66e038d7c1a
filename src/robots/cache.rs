//! Per-run robots.txt cache
//!
//! Each host's robots.txt is fetched at most once per run.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Robots.txt rules together with the time they were retrieved
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub robots: ParsedRobots,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(robots: ParsedRobots) -> Self {
        Self {
            robots,
            fetched_at: Utc::now(),
        }
    }
}

/// Robots.txt rules keyed by `host[:port]`
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: HashMap<String, CachedRobots>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, host_key: &str) -> Option<&CachedRobots> {
        self.entries.get(host_key)
    }

    pub fn insert(&mut self, host_key: impl Into<String>, robots: ParsedRobots) -> &CachedRobots {
        let host_key = host_key.into();
        self.entries.insert(host_key.clone(), CachedRobots::new(robots));
        &self.entries[&host_key]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

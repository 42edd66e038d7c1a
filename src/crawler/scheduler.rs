//! Breadth-first crawl frontier
//!
//! This module handles:
//! - FIFO ordering of URLs to crawl
//! - Deduplication of targets by normalized URL
//! - The domain scope filter and the frontier capacity cap
//! - Per-target state bookkeeping for the run report

use crate::state::TargetState;
use crate::url::{canonicalize, host_key, CrawlScope};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::trace;
use url::Url;

/// A URL waiting in (or popped from) the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Normalized absolute URL
    pub url: Url,
    /// `host[:port]` of the URL
    pub host: String,
    /// Link distance from the seed
    pub depth: u32,
}

/// Outcome of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Queued,
    /// Already queued or visited in this run
    AlreadyKnown,
    OutOfScope,
    /// Capacity reached; the URL was dropped without being recorded
    FrontierFull,
}

/// FIFO frontier with a state entry for every URL it has seen
pub struct Frontier {
    queue: VecDeque<CrawlTarget>,
    states: HashMap<String, TargetState>,
    scope: CrawlScope,
    /// Maximum number of in-scope targets ever admitted
    capacity: usize,
    admitted: usize,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `scope` - Hosts that may be crawled
    /// * `capacity` - Cap on admitted targets (`max_pages * frontier_multiplier`)
    pub fn new(scope: CrawlScope, capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            states: HashMap::new(),
            scope,
            capacity: capacity.max(1),
            admitted: 0,
        }
    }

    /// Admits the seed URL at depth 0
    pub fn seed(&mut self, url: Url) -> Admission {
        self.offer(url, 0)
    }

    /// Pops the oldest queued target
    pub fn pop(&mut self) -> Option<CrawlTarget> {
        self.queue.pop_front()
    }

    /// Offers links found on a page at `depth`
    ///
    /// Returns the number of links that were queued.
    pub fn harvest<I>(&mut self, links: I, depth: u32) -> usize
    where
        I: IntoIterator<Item = Url>,
    {
        links
            .into_iter()
            .filter(|link| self.offer(link.clone(), depth + 1) == Admission::Queued)
            .count()
    }

    fn offer(&mut self, url: Url, depth: u32) -> Admission {
        let url = canonicalize(url);
        let key = url.to_string();

        if self.states.contains_key(&key) {
            return Admission::AlreadyKnown;
        }

        if !self.scope.contains(&url) {
            trace!("Out of scope: {}", key);
            self.states.insert(key, TargetState::OutOfScope);
            return Admission::OutOfScope;
        }

        if self.admitted >= self.capacity {
            return Admission::FrontierFull;
        }

        self.admitted += 1;
        self.states.insert(key, TargetState::Discovered);
        self.queue.push_back(CrawlTarget {
            host: host_key(&url),
            url,
            depth,
        });
        Admission::Queued
    }

    /// Records the terminal state of a URL
    ///
    /// Terminal states are final; a second call for the same URL is ignored.
    pub fn mark(&mut self, url: &Url, state: TargetState) {
        let key = canonicalize(url.clone()).to_string();
        match self.states.get(&key) {
            Some(existing) if existing.is_terminal() => {}
            _ => {
                self.states.insert(key, state);
            }
        }
    }

    /// Marks the post-redirect URL of a fetch as visited
    ///
    /// Returns `false` if that URL had already been visited earlier in the run.
    pub fn claim_final_url(&mut self, final_url: &Url, state: TargetState) -> bool {
        let key = canonicalize(final_url.clone()).to_string();
        if self.states.get(&key).is_some_and(TargetState::is_visited) {
            return false;
        }

        // A queued copy of the final URL must not be fetched a second time
        self.queue.retain(|target| target.url.as_str() != key);
        self.states.insert(key, state);
        true
    }

    pub fn state_of(&self, url: &Url) -> Option<TargetState> {
        self.states
            .get(canonicalize(url.clone()).as_str())
            .copied()
    }

    /// Number of queued targets not yet popped
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Count of URLs per state
    pub fn tally(&self) -> BTreeMap<TargetState, usize> {
        let mut tally = BTreeMap::new();
        for state in self.states.values() {
            *tally.entry(*state).or_insert(0) += 1;
        }
        tally
    }
}

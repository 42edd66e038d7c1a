/// Target state definitions for tracking crawl progress
///
/// A target starts out `Discovered` and moves to exactly one terminal state.
use std::fmt;

/// Represents the current state of a target in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetState {
    // ===== Active States =====
    /// Target is known to the frontier but has not been fetched yet
    Discovered,

    // ===== Terminal Visited States =====
    /// Page was fetched and yielded a candidate entity
    Extracted,

    /// Page was fetched but carried no company signal
    NoSignal,

    /// Response Content-Type is not HTML
    NotHtml,

    /// Page could not be fetched (network error, timeout, non-2xx status)
    Unreachable,

    // ===== Terminal Skip States =====
    /// Host is outside the crawl scope
    OutOfScope,

    /// Disallowed by robots.txt for our agent
    PolicyBlocked,

    /// A redirect landed on a page that was already visited
    AlreadyVisited,
}

impl TargetState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Discovered)
    }

    /// Returns true if the target consumed a fetch
    pub fn is_visited(&self) -> bool {
        matches!(
            self,
            Self::Extracted | Self::NoSignal | Self::NotHtml | Self::Unreachable
        )
    }

    /// Returns true if this represents a skip state
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            Self::OutOfScope | Self::PolicyBlocked | Self::AlreadyVisited
        )
    }

    /// Returns true if the fetch itself failed
    pub fn is_error(&self) -> bool {
        matches!(self, Self::NotHtml | Self::Unreachable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Extracted => "extracted",
            Self::NoSignal => "no_signal",
            Self::NotHtml => "not_html",
            Self::Unreachable => "unreachable",
            Self::OutOfScope => "out_of_scope",
            Self::PolicyBlocked => "policy_blocked",
            Self::AlreadyVisited => "already_visited",
        }
    }

    /// Returns all possible target states
    pub fn all_states() -> [Self; 8] {
        [
            Self::Discovered,
            Self::Extracted,
            Self::NoSignal,
            Self::NotHtml,
            Self::Unreachable,
            Self::OutOfScope,
            Self::PolicyBlocked,
            Self::AlreadyVisited,
        ]
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

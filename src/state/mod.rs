//! State module for tracking crawl progress
//!
//! This module provides state management for crawl targets and the
//! run-scoped request counters.
//!
//! # Components
//!
//! - `TargetState`: Tracks the state of individual targets (discovered, extracted, skipped, etc.)
//! - `RunStats`: Counts requests per run and per host, shared by reference with the fetcher
//! - `RunStatsSnapshot`: Frozen copy of the counters returned to the caller

mod run_stats;
mod target_state;

// Re-export main types
pub use run_stats::{RunStats, RunStatsSnapshot};
pub use target_state::TargetState;

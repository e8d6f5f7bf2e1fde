//! Frecency-ranked picker for Makefile targets and package.json scripts.
//!
//! Candidates are discovered in the working directory, scored from their
//! usage history, then either narrowed by a query in batch or chosen from an
//! interactive, incrementally filtered list.

pub mod candidate;
pub mod cli;
pub mod completion;
pub mod config;
pub mod discovery;
pub mod error;
pub mod exec;
pub mod frecency;
pub mod history;
pub mod search;
pub mod selector;

use chrono::{DateTime, Utc};

pub use candidate::{Candidate, RankedCandidate, ScoredCandidate, Source, UsageRecord};
pub use config::Config;
pub use error::{Result, RunnerError};
pub use search::SearchEngine;

/// Score `candidates` from `records` and rank them against `query`.
///
/// An empty query yields every candidate in base order with rank 0.
pub fn rank_for_search(
    config: &Config,
    candidates: Vec<Candidate>,
    records: &[UsageRecord],
    query: &str,
    now: DateTime<Utc>,
) -> Result<Vec<RankedCandidate>> {
    let scored = config.frecency.score_candidates(candidates, records, now);
    let engine = SearchEngine::new(config.search.clone(), &scored)?;
    Ok(engine.rank(&scored, query))
}

/// The head of the base order, if anything has been used before.
pub fn most_frecent_candidate(
    config: &Config,
    candidates: Vec<Candidate>,
    records: &[UsageRecord],
    now: DateTime<Utc>,
) -> Option<ScoredCandidate> {
    let scored = config.frecency.score_candidates(candidates, records, now);
    frecency::most_frecent(&scored).cloned()
}

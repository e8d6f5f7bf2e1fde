//! Query → ranked subset of scored candidates.
//!
//! One word goes through substring/prefix/fuzzy checks on name then command.
//! Several words go through n-gram similarity against name, command and
//! both combined, since the words may appear in any order and either field.

mod ngram;

use std::collections::{HashMap, HashSet};
use std::fmt;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::candidate::{RankedCandidate, ScoredCandidate};
use crate::error::Result;

pub use ngram::{MatchField, NgramIndex};

/// Ranks for the single-word path, checked top to bottom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleWordRanks {
    pub exact_name: u32,
    pub name_prefix: u32,
    pub name_contains: u32,
    pub name_fuzzy: u32,
    pub command_contains: u32,
    pub command_fuzzy: u32,
}

impl Default for SingleWordRanks {
    fn default() -> Self {
        Self {
            exact_name: 1000,
            name_prefix: 500,
            name_contains: 300,
            name_fuzzy: 200,
            command_contains: 100,
            command_fuzzy: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub single_word: SingleWordRanks,
    /// Base rank for a hit in the combined name+command matcher.
    pub combined_rank: u32,
    pub name_rank: u32,
    pub command_rank: u32,
    /// Subtracted per position down a matcher's hit list.
    pub position_step: u32,
    /// How many hits each matcher contributes.
    pub closest_limit: usize,
    /// Multi-word results below this rank are dropped.
    pub multi_word_min_rank: u32,
    /// Distinct query words a multi-word result must contain.
    pub min_word_matches: usize,
    pub min_gram: usize,
    pub max_gram: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            single_word: SingleWordRanks::default(),
            combined_rank: 1000,
            name_rank: 800,
            command_rank: 600,
            position_step: 10,
            closest_limit: 3,
            multi_word_min_rank: 980,
            min_word_matches: 2,
            min_gram: 2,
            max_gram: 4,
        }
    }
}

/// Search over one session's candidate set.
///
/// The n-gram index is built once from the names and commands handed to
/// [`SearchEngine::new`] and then queried on every call; ranking itself keeps
/// no state between calls.
pub struct SearchEngine {
    config: SearchConfig,
    matcher: SkimMatcherV2,
    index: Option<NgramIndex>,
    names: Vec<String>,
    commands: Vec<String>,
}

impl fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchEngine")
            .field("config", &self.config)
            .field("entries", &self.names.len())
            .finish_non_exhaustive()
    }
}

impl SearchEngine {
    pub fn new(config: SearchConfig, candidates: &[ScoredCandidate]) -> Result<Self> {
        let names: Vec<String> = candidates.iter().map(|c| c.name().to_lowercase()).collect();
        let commands: Vec<String> = candidates
            .iter()
            .map(|c| c.command().to_lowercase())
            .collect();

        let index = if candidates.is_empty() {
            None
        } else {
            Some(NgramIndex::build(
                names.iter().map(String::as_str).zip(commands.iter().map(String::as_str)),
                config.min_gram,
                config.max_gram,
            )?)
        };

        Ok(Self {
            config,
            matcher: SkimMatcherV2::default(),
            index,
            names,
            commands,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Rank `candidates` against `query`.
    ///
    /// An empty query returns every candidate unranked, in input order. A
    /// query matching nothing returns an empty list.
    pub fn rank(&self, candidates: &[ScoredCandidate], query: &str) -> Vec<RankedCandidate> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return candidates.iter().cloned().map(RankedCandidate::unranked).collect();
        }

        let words: Vec<&str> = query.split_whitespace().collect();
        let mut results = if words.len() > 1 {
            self.rank_multi_word(candidates, &query, &words)
        } else {
            self.rank_single_word(candidates, &query)
        };

        results.sort_by(|a, b| {
            b.match_rank
                .cmp(&a.match_rank)
                .then_with(|| b.scored.frecency_score.total_cmp(&a.scored.frecency_score))
        });
        trace!(query = %query, results = results.len(), "ranked candidates");
        results
    }

    fn rank_single_word(&self, candidates: &[ScoredCandidate], query: &str) -> Vec<RankedCandidate> {
        candidates
            .iter()
            .filter_map(|scored| {
                let rank = self.single_word_rank(scored, query);
                (rank > 0).then(|| RankedCandidate {
                    scored: scored.clone(),
                    match_rank: rank,
                })
            })
            .collect()
    }

    fn single_word_rank(&self, scored: &ScoredCandidate, query: &str) -> u32 {
        let ranks = &self.config.single_word;
        let name = scored.name().to_lowercase();
        let command = scored.command().to_lowercase();

        if name == query {
            ranks.exact_name
        } else if name.starts_with(query) {
            ranks.name_prefix
        } else if name.contains(query) {
            ranks.name_contains
        } else if self.is_subsequence(&name, query) {
            ranks.name_fuzzy
        } else if command.contains(query) {
            ranks.command_contains
        } else if self.is_subsequence(&command, query) {
            ranks.command_fuzzy
        } else {
            0
        }
    }

    fn is_subsequence(&self, text: &str, query: &str) -> bool {
        self.matcher.fuzzy_match(text, query).is_some()
    }

    fn rank_multi_word(
        &self,
        candidates: &[ScoredCandidate],
        query: &str,
        words: &[&str],
    ) -> Vec<RankedCandidate> {
        let Some(index) = &self.index else {
            return Vec::new();
        };
        let ranks = self.multi_word_ranks(index, query);

        let distinct: HashSet<&str> = words.iter().copied().collect();
        let required = self.config.min_word_matches.min(distinct.len());

        candidates
            .iter()
            .filter_map(|scored| {
                let name = scored.name().to_lowercase();
                let rank = *ranks.get(&name)?;
                if rank < self.config.multi_word_min_rank {
                    return None;
                }
                let combined = format!("{} {}", name, scored.command().to_lowercase());
                let matched = distinct.iter().filter(|word| combined.contains(**word)).count();
                (matched >= required).then(|| RankedCandidate {
                    scored: scored.clone(),
                    match_rank: rank,
                })
            })
            .collect()
    }

    /// Lower-cased name → rank, from the three matchers' top hits.
    fn multi_word_ranks(&self, index: &NgramIndex, query: &str) -> HashMap<String, u32> {
        let limit = self.config.closest_limit.min(self.names.len());
        let step = self.config.position_step;
        let positional = |base: u32, position: usize| {
            base.saturating_sub(step.saturating_mul(position as u32))
        };

        let mut ranks: HashMap<String, u32> = HashMap::new();

        for (position, ordinal) in index
            .closest(MatchField::Combined, query, limit)
            .into_iter()
            .enumerate()
        {
            ranks
                .entry(self.names[ordinal].clone())
                .or_insert_with(|| positional(self.config.combined_rank, position));
        }

        for (position, ordinal) in index.closest(MatchField::Name, query, limit).into_iter().enumerate() {
            ranks
                .entry(self.names[ordinal].clone())
                .or_insert_with(|| positional(self.config.name_rank, position));
        }

        for (position, ordinal) in index
            .closest(MatchField::Command, query, limit)
            .into_iter()
            .enumerate()
        {
            let command = &self.commands[ordinal];
            let Some(owner) = self.commands.iter().position(|c| c == command) else {
                continue;
            };
            ranks
                .entry(self.names[owner].clone())
                .or_insert_with(|| positional(self.config.command_rank, position));
        }

        ranks
    }
}

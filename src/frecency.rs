//! Frecency: one comparable number from use count and last use.
//!
//! Frequency dominates for heavily used units, recency for lightly used ones.
//! A unit used once, long ago, still outranks one that was never used.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, ScoredCandidate, Source, UsageRecord};

/// One step of the recency function: used less than `max_age_hours` ago
/// scores `score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecencyBucket {
    pub max_age_hours: i64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrecencyConfig {
    pub frequency_weight: f64,
    pub recency_weight: f64,
    /// Checked in order; the first bucket the age falls under wins.
    pub recency_buckets: Vec<RecencyBucket>,
    /// Score for anything older than every bucket. Must stay above zero.
    pub stale_score: f64,
    /// Minimum scores for 2, 3, 4 and 5 stars. Any positive score earns one.
    pub star_thresholds: [f64; 4],
}

impl Default for FrecencyConfig {
    fn default() -> Self {
        Self {
            frequency_weight: 0.4,
            recency_weight: 0.6,
            recency_buckets: vec![
                RecencyBucket {
                    max_age_hours: 24,
                    score: 1.0,
                },
                RecencyBucket {
                    max_age_hours: 7 * 24,
                    score: 0.5,
                },
                RecencyBucket {
                    max_age_hours: 30 * 24,
                    score: 0.2,
                },
            ],
            stale_score: 0.1,
            star_thresholds: [1.0, 3.0, 6.0, 10.0],
        }
    }
}

pub const MAX_STARS: usize = 5;

impl FrecencyConfig {
    pub fn time_score(&self, last_used: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age = now.signed_duration_since(last_used);
        self.recency_buckets
            .iter()
            .find(|bucket| age < Duration::hours(bucket.max_age_hours))
            .map(|bucket| bucket.score)
            .unwrap_or(self.stale_score)
    }

    pub fn frecency(&self, use_count: u32, last_used: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        f64::from(use_count) * self.frequency_weight
            + self.time_score(last_used, now) * self.recency_weight
    }

    /// Number of filled stars (0..=5) for a score. Display only.
    pub fn star_rating(&self, score: f64) -> usize {
        if score <= 0.0 {
            return 0;
        }
        1 + self
            .star_thresholds
            .iter()
            .filter(|threshold| score >= **threshold)
            .count()
    }

    /// Join discovered candidates with their usage records and return them
    /// in base order.
    pub fn score_candidates(
        &self,
        candidates: Vec<Candidate>,
        records: &[UsageRecord],
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate> {
        let by_key: HashMap<(&str, Source), &UsageRecord> = records
            .iter()
            .map(|record| ((record.name.as_str(), record.source), record))
            .collect();

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                match by_key.get(&(candidate.name.as_str(), candidate.source)) {
                    Some(record) => ScoredCandidate {
                        frecency_score: record
                            .last_used
                            .map(|last_used| self.frecency(record.use_count, last_used, now))
                            .unwrap_or(0.0),
                        last_used: record.last_used,
                        use_count: record.use_count,
                        pinned: record.pinned,
                        candidate,
                    },
                    None => ScoredCandidate::unused(candidate),
                }
            })
            .collect();

        sort_base_order(&mut scored);
        scored
    }
}

/// Pinned first, then frecency descending. Stable, so ties keep discovery order.
pub fn sort_base_order(scored: &mut [ScoredCandidate]) {
    scored.sort_by(compare_base_order);
}

fn compare_base_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| b.frecency_score.total_cmp(&a.frecency_score))
}

/// First entry of a base-ordered list with a positive score. Pinned scripts
/// that were never run are skipped.
pub fn most_frecent(scored: &[ScoredCandidate]) -> Option<&ScoredCandidate> {
    scored.iter().find(|scored| scored.frecency_score > 0.0)
}

pub fn render_stars(filled: usize) -> String {
    let filled = filled.min(MAX_STARS);
    let mut stars = "★".repeat(filled);
    stars.push_str(&"☆".repeat(MAX_STARS - filled));
    stars
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn record(name: &str, count: u32, hours_ago: i64, pinned: bool) -> UsageRecord {
        UsageRecord {
            directory: "/proj".into(),
            name: name.into(),
            source: Source::Npm,
            use_count: count,
            last_used: Some(now() - Duration::hours(hours_ago)),
            pinned,
        }
    }

    fn names(scored: &[ScoredCandidate]) -> Vec<&str> {
        scored.iter().map(|s| s.name()).collect()
    }

    #[test]
    fn time_score_steps() {
        let cfg = FrecencyConfig::default();
        assert_eq!(cfg.time_score(now() - Duration::hours(1), now()), 1.0);
        assert_eq!(cfg.time_score(now() - Duration::hours(23), now()), 1.0);
        assert_eq!(cfg.time_score(now() - Duration::hours(24), now()), 0.5);
        assert_eq!(cfg.time_score(now() - Duration::days(6), now()), 0.5);
        assert_eq!(cfg.time_score(now() - Duration::days(7), now()), 0.2);
        assert_eq!(cfg.time_score(now() - Duration::days(29), now()), 0.2);
        assert_eq!(cfg.time_score(now() - Duration::days(400), now()), 0.1);
    }

    #[test]
    fn frecency_blends_count_and_recency() {
        let cfg = FrecencyConfig::default();
        let score = cfg.frecency(10, now() - Duration::minutes(5), now());
        assert!((score - 4.6).abs() < 1e-9);
        let old = cfg.frecency(1, now() - Duration::days(90), now());
        assert!((old - 0.46).abs() < 1e-9);
    }

    #[test]
    fn star_levels() {
        let cfg = FrecencyConfig::default();
        assert_eq!(cfg.star_rating(0.0), 0);
        assert_eq!(cfg.star_rating(0.5), 1);
        assert_eq!(cfg.star_rating(1.0), 2);
        assert_eq!(cfg.star_rating(3.0), 3);
        assert_eq!(cfg.star_rating(6.5), 4);
        assert_eq!(cfg.star_rating(10.0), 5);
        assert_eq!(cfg.star_rating(250.0), 5);
        assert_eq!(render_stars(2), "★★☆☆☆");
    }

    #[test]
    fn unused_candidates_score_zero_and_sort_last() {
        let cfg = FrecencyConfig::default();
        let candidates = vec![
            Candidate::new("lint", "eslint .", Source::Npm),
            Candidate::new("dev", "vite", Source::Npm),
        ];
        let scored = cfg.score_candidates(candidates, &[record("dev", 1, 2000, false)], now());
        assert_eq!(names(&scored), ["dev", "lint"]);
        assert_eq!(scored[1].frecency_score, 0.0);
        assert_eq!(scored[1].use_count, 0);
        assert!(scored[1].last_used.is_none());
    }

    #[test]
    fn pinned_beats_any_score() {
        let cfg = FrecencyConfig::default();
        let candidates = vec![
            Candidate::new("busy", "a", Source::Npm),
            Candidate::new("pinned", "b", Source::Npm),
        ];
        let mut pinned = record("pinned", 0, 0, true);
        pinned.last_used = None;
        let scored = cfg.score_candidates(candidates, &[record("busy", 250, 1, false), pinned], now());
        assert_eq!(names(&scored), ["pinned", "busy"]);
        assert_eq!(scored[0].frecency_score, 0.0);
        assert!(scored[1].frecency_score > 100.0);
    }

    #[test]
    fn records_match_on_name_and_source() {
        let cfg = FrecencyConfig::default();
        let candidates = vec![
            Candidate::new("build", "go build", Source::Make),
            Candidate::new("build", "tsc", Source::Npm),
        ];
        let scored = cfg.score_candidates(candidates, &[record("build", 4, 1, false)], now());
        assert_eq!(scored[0].source(), Source::Npm);
        assert_eq!(scored[1].source(), Source::Make);
        assert_eq!(scored[1].frecency_score, 0.0);
    }

    #[test]
    fn ties_keep_discovery_order() {
        let cfg = FrecencyConfig::default();
        let candidates: Vec<_> = ["c", "a", "b"]
            .iter()
            .map(|n| Candidate::new(*n, "x", Source::Make))
            .collect();
        let scored = cfg.score_candidates(candidates, &[], now());
        assert_eq!(names(&scored), ["c", "a", "b"]);
    }

    #[test]
    fn most_frecent_needs_history() {
        let cfg = FrecencyConfig::default();
        let candidates = vec![Candidate::new("dev", "vite", Source::Npm)];
        let scored = cfg.score_candidates(candidates.clone(), &[], now());
        assert!(most_frecent(&scored).is_none());
        assert!(most_frecent(&[]).is_none());

        let scored = cfg.score_candidates(candidates, &[record("dev", 2, 3, false)], now());
        assert_eq!(most_frecent(&scored).map(|s| s.name()), Some("dev"));
    }

    #[test]
    fn most_frecent_skips_unused_pin() {
        let cfg = FrecencyConfig::default();
        let candidates = vec![
            Candidate::new("lint", "eslint .", Source::Npm),
            Candidate::new("dev", "vite", Source::Npm),
        ];
        let mut pinned = record("lint", 0, 0, true);
        pinned.last_used = None;
        let scored = cfg.score_candidates(candidates, &[pinned, record("dev", 50, 0, false)], now());
        assert_eq!(names(&scored), ["lint", "dev"]);
        assert_eq!(most_frecent(&scored).map(|s| s.name()), Some("dev"));
    }

    proptest! {
        #[test]
        fn frecency_is_non_negative_and_monotone(count in 0u32..10_000, hours in 0i64..100_000) {
            let cfg = FrecencyConfig::default();
            let last_used = now() - Duration::hours(hours);
            let score = cfg.frecency(count, last_used, now());
            prop_assert!(score >= 0.0);
            prop_assert!(cfg.frecency(count + 1, last_used, now()) >= score);
        }
    }
}

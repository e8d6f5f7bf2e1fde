//! Runnable units and the usage facts attached to them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RunnerError;

/// Where a runnable unit was discovered, which also decides how it is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Make,
    Npm,
    Pnpm,
    Yarn,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Make, Source::Npm, Source::Pnpm, Source::Yarn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Make => "make",
            Source::Npm => "npm",
            Source::Pnpm => "pnpm",
            Source::Yarn => "yarn",
        }
    }

    /// Package managers run scripts through a `run` subcommand; make does not.
    pub fn is_package_manager(&self) -> bool {
        !matches!(self, Source::Make)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = RunnerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "make" => Ok(Source::Make),
            "npm" => Ok(Source::Npm),
            "pnpm" => Ok(Source::Pnpm),
            "yarn" => Ok(Source::Yarn),
            _ => Err(RunnerError::UnknownSource(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub command: String,
    pub source: Source,
}

impl Candidate {
    pub fn new(name: impl Into<String>, command: impl Into<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            source,
        }
    }

    pub fn same_unit(&self, name: &str, source: Source) -> bool {
        self.name == name && self.source == source
    }
}

/// Historical usage of one unit in one directory, as kept by the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub directory: String,
    pub name: String,
    pub source: Source,
    pub use_count: u32,
    /// `None` for units that were pinned but never run.
    pub last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub frecency_score: f64,
    pub last_used: Option<DateTime<Utc>>,
    pub use_count: u32,
    pub pinned: bool,
}

impl ScoredCandidate {
    /// A candidate with no usage history at all.
    pub fn unused(candidate: Candidate) -> Self {
        Self {
            candidate,
            frecency_score: 0.0,
            last_used: None,
            use_count: 0,
            pinned: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.candidate.name
    }

    pub fn command(&self) -> &str {
        &self.candidate.command
    }

    pub fn source(&self) -> Source {
        self.candidate.source
    }
}

/// A scored candidate that survived one search pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub scored: ScoredCandidate,
    /// Relevance to the query; 0 only when no query was applied.
    pub match_rank: u32,
}

impl RankedCandidate {
    pub fn unranked(scored: ScoredCandidate) -> Self {
        Self {
            scored,
            match_rank: 0,
        }
    }

    pub fn name(&self) -> &str {
        self.scored.name()
    }
}

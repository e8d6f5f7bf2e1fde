use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the library half of the crate.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("no scripts available to choose from")]
    NoCandidates,

    #[error("terminal I/O failed: {0}")]
    Terminal(#[source] io::Error),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no scripts found in {}", path.display())]
    NoScripts { path: PathBuf },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("unknown script source '{0}'")]
    UnknownSource(String),

    #[error("search index: {0}")]
    Index(#[from] tantivy::TantivyError),
}

pub type Result<T, E = RunnerError> = std::result::Result<T, E>;

//! User configuration, read from an optional TOML file.
//!
//! Every key has a default, so an absent file and an empty file behave the
//! same. Example:
//!
//! ```toml
//! history_file = "/tmp/frun-history.json"
//!
//! [frecency]
//! frequency_weight = 0.5
//!
//! [search]
//! multi_word_min_rank = 990
//!
//! [selector]
//! min_viewport_height = 8
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RunnerError};
use crate::frecency::FrecencyConfig;
use crate::search::SearchConfig;
use crate::selector::SelectorConfig;

pub const APP_NAME: &str = "frecent-run";
const CONFIG_FILE: &str = "config.toml";
const HISTORY_FILE: &str = "history.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub frecency: FrecencyConfig,
    pub search: SearchConfig,
    pub selector: SelectorConfig,
    /// Overrides the history location under the config directory.
    pub history_file: Option<PathBuf>,
}

impl Config {
    /// Load from `path` if given (it must exist), else from the default
    /// location if a file is there, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match default_config_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        match fs::read_to_string(&path) {
            Ok(contents) => {
                debug!(path = %path.display(), "loading config");
                Self::from_toml(&contents, &path)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound && !required => Ok(Self::default()),
            Err(source) => Err(RunnerError::Read { path, source }),
        }
    }

    pub fn from_toml(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|source| RunnerError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| config_dir().map(|dir| dir.join(HISTORY_FILE)))
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = Config::from_toml("", Path::new("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = Config::from_toml(
            "[search]\nmulti_word_min_rank = 990\n\n[selector]\nmin_viewport_height = 8\n",
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(config.search.multi_word_min_rank, 990);
        assert_eq!(config.search.closest_limit, 3);
        assert_eq!(config.selector.min_viewport_height, 8);
        assert_eq!(config.frecency, FrecencyConfig::default());
    }

    #[test]
    fn bad_toml_names_the_file() {
        let err = Config::from_toml("[search\n", Path::new("/etc/frun.toml")).unwrap_err();
        assert!(err.to_string().contains("/etc/frun.toml"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(RunnerError::Read { .. })
        ));
    }

    #[test]
    fn history_file_override() {
        let config = Config {
            history_file: Some(PathBuf::from("/tmp/h.json")),
            ..Config::default()
        };
        assert_eq!(config.history_path(), Some(PathBuf::from("/tmp/h.json")));
    }
}

//! Usage history, keyed by directory.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::candidate::{Source, UsageRecord};
use crate::error::{Result, RunnerError};

/// Persistent usage facts. The selector never talks to the store directly:
/// records are read once before a session and writes happen after it.
pub trait HistoryStore {
    /// Every record for `directory`, most recently used first.
    fn usage(&self, directory: &str) -> Result<Vec<UsageRecord>>;

    /// Bump the use count and set last use to `now`.
    fn record_usage(&mut self, directory: &str, name: &str, source: Source, now: DateTime<Utc>)
        -> Result<()>;

    fn set_pinned(&mut self, directory: &str, name: &str, source: Source, pinned: bool) -> Result<()>;

    /// Records for `name` in `directory` across all sources.
    fn find_by_name(&self, directory: &str, name: &str) -> Result<Vec<UsageRecord>> {
        Ok(self
            .usage(directory)?
            .into_iter()
            .filter(|record| record.name == name)
            .collect())
    }

    fn reset_directory(&mut self, directory: &str) -> Result<()>;

    fn reset_all(&mut self) -> Result<()>;

    fn cached_package_manager(&self, directory: &str) -> Result<Option<Source>>;

    fn cache_package_manager(&mut self, directory: &str, source: Source, now: DateTime<Utc>) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedPackageManager {
    source: Source,
    detected_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    usage: Vec<UsageRecord>,
    #[serde(default)]
    package_managers: BTreeMap<String, CachedPackageManager>,
}

/// History kept in one JSON file, rewritten on every change.
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    data: HistoryFile,
}

impl JsonHistoryStore {
    /// Open the store at `path`; a missing file is an empty history.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => HistoryFile::default(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| RunnerError::Json {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => HistoryFile::default(),
            Err(source) => return Err(RunnerError::Read { path, source }),
        };
        debug!(path = %path.display(), records = data.usage.len(), "opened history");
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record_mut(&mut self, directory: &str, name: &str, source: Source) -> &mut UsageRecord {
        let position = self
            .data
            .usage
            .iter()
            .position(|r| r.directory == directory && r.name == name && r.source == source);
        let index = match position {
            Some(index) => index,
            None => {
                self.data.usage.push(UsageRecord {
                    directory: directory.to_string(),
                    name: name.to_string(),
                    source,
                    use_count: 0,
                    last_used: None,
                    pinned: false,
                });
                self.data.usage.len() - 1
            }
        };
        &mut self.data.usage[index]
    }

    /// Write to a sibling temp file, then rename over the real one.
    fn save(&self) -> Result<()> {
        let write_err = |source| RunnerError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_vec_pretty(&self.data).map_err(|source| RunnerError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(&json).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn usage(&self, directory: &str) -> Result<Vec<UsageRecord>> {
        let mut records: Vec<UsageRecord> = self
            .data
            .usage
            .iter()
            .filter(|r| r.directory == directory)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.last_used
                .cmp(&a.last_used)
                .then_with(|| b.use_count.cmp(&a.use_count))
        });
        Ok(records)
    }

    fn record_usage(
        &mut self,
        directory: &str,
        name: &str,
        source: Source,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let record = self.record_mut(directory, name, source);
        record.use_count = record.use_count.saturating_add(1);
        record.last_used = Some(now);
        self.save()
    }

    fn set_pinned(&mut self, directory: &str, name: &str, source: Source, pinned: bool) -> Result<()> {
        self.record_mut(directory, name, source).pinned = pinned;
        // A record that only ever existed to hold a pin goes away with it.
        self.data
            .usage
            .retain(|r| r.pinned || r.use_count > 0 || r.last_used.is_some());
        self.save()
    }

    fn reset_directory(&mut self, directory: &str) -> Result<()> {
        self.data.usage.retain(|r| r.directory != directory);
        info!(directory, "cleared usage history");
        self.save()
    }

    fn reset_all(&mut self) -> Result<()> {
        self.data.usage.clear();
        info!("cleared all usage history");
        self.save()
    }

    fn cached_package_manager(&self, directory: &str) -> Result<Option<Source>> {
        Ok(self.data.package_managers.get(directory).map(|c| c.source))
    }

    fn cache_package_manager(&mut self, directory: &str, source: Source, now: DateTime<Utc>) -> Result<()> {
        self.data.package_managers.insert(
            directory.to_string(),
            CachedPackageManager {
                source,
                detected_at: now,
            },
        );
        self.save()
    }
}

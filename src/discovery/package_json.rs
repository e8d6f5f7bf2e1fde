use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::candidate::{Candidate, Source};
use crate::error::{Result, RunnerError};

pub const PACKAGE_JSON: &str = "package.json";

/// Lock files checked in order; the first one present decides.
const LOCK_FILES: [(&str, Source); 3] = [
    ("yarn.lock", Source::Yarn),
    ("pnpm-lock.yaml", Source::Pnpm),
    ("package-lock.json", Source::Npm),
];

#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    scripts: Map<String, Value>,
}

/// Scripts from `dir/package.json` in file order, tagged with `package_manager`.
pub fn read_package_json(dir: &Path, package_manager: Source) -> Result<Vec<Candidate>> {
    let path = dir.join(PACKAGE_JSON);
    let contents = fs::read_to_string(&path).map_err(|source| RunnerError::Read {
        path: path.clone(),
        source,
    })?;
    let package: PackageJson = serde_json::from_str(&contents).map_err(|source| RunnerError::Json {
        path: path.clone(),
        source,
    })?;

    let scripts: Vec<Candidate> = package
        .scripts
        .into_iter()
        .filter_map(|(name, command)| match command {
            Value::String(command) => Some(Candidate::new(name, command, package_manager)),
            _ => None,
        })
        .collect();
    if scripts.is_empty() {
        return Err(RunnerError::NoScripts { path });
    }
    debug!(scripts = scripts.len(), %package_manager, "parsed package.json");
    Ok(scripts)
}

/// Pick the package manager for `dir` from lock files, looking at the git
/// root first so workspace packages follow the repository's choice.
pub fn detect_package_manager(dir: &Path) -> Source {
    let root = git_root(dir).unwrap_or_else(|| dir.to_path_buf());
    for base in [root.as_path(), dir] {
        for (lock_file, source) in LOCK_FILES {
            if base.join(lock_file).is_file() {
                debug!(lock_file, base = %base.display(), "detected package manager");
                return source;
            }
        }
    }

    if dir.join(PACKAGE_JSON).is_file() || root.join(PACKAGE_JSON).is_file() {
        Source::Pnpm
    } else {
        Source::Npm
    }
}

fn git_root(dir: &Path) -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(dir)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        trace!(dir = %dir.display(), "not inside a git repository");
        return None;
    }
    let root = String::from_utf8(output.stdout).ok()?;
    let root = root.trim();
    (!root.is_empty()).then(|| PathBuf::from(root))
}

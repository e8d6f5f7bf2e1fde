//! Finding runnable units in a project directory.

mod makefile;
mod package_json;

use std::path::Path;

use tracing::info;

use crate::candidate::{Candidate, Source};
use crate::error::Result;

pub use makefile::{parse_makefile, read_makefile, MAKEFILE};
pub use package_json::{detect_package_manager, read_package_json, PACKAGE_JSON};

/// Which kinds of project files to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFilter {
    #[default]
    All,
    MakefileOnly,
    PackageJsonOnly,
}

impl SourceFilter {
    fn wants_makefile(self) -> bool {
        self != SourceFilter::PackageJsonOnly
    }

    fn wants_package_json(self) -> bool {
        self != SourceFilter::MakefileOnly
    }
}

pub fn has_makefile(dir: &Path) -> bool {
    dir.join(MAKEFILE).is_file()
}

pub fn has_package_json(dir: &Path) -> bool {
    dir.join(PACKAGE_JSON).is_file()
}

/// Makefile targets first, then package.json scripts run through
/// `package_manager`. Missing files contribute nothing; unreadable ones fail.
pub fn discover(dir: &Path, filter: SourceFilter, package_manager: Source) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    if filter.wants_makefile() && has_makefile(dir) {
        candidates.extend(read_makefile(dir)?);
    }
    if filter.wants_package_json() && has_package_json(dir) {
        candidates.extend(read_package_json(dir, package_manager)?);
    }
    info!(dir = %dir.display(), candidates = candidates.len(), ?filter, "discovered scripts");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MAKEFILE), "build:\n\tgo build\n").unwrap();
        fs::write(
            dir.path().join(PACKAGE_JSON),
            r#"{"scripts":{"build":"tsc","dev":"vite"}}"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn both_sources_by_default() {
        let dir = project();
        let found = discover(dir.path(), SourceFilter::All, Source::Pnpm).unwrap();
        let keys: Vec<(&str, Source)> = found.iter().map(|c| (c.name.as_str(), c.source)).collect();
        assert_eq!(
            keys,
            [("build", Source::Make), ("build", Source::Pnpm), ("dev", Source::Pnpm)]
        );
    }

    #[test]
    fn filters_limit_sources() {
        let dir = project();
        let make = discover(dir.path(), SourceFilter::MakefileOnly, Source::Npm).unwrap();
        assert!(make.iter().all(|c| c.source == Source::Make));
        let npm = discover(dir.path(), SourceFilter::PackageJsonOnly, Source::Npm).unwrap();
        assert_eq!(npm.len(), 2);
        assert!(npm.iter().all(|c| c.source == Source::Npm));
    }

    #[test]
    fn empty_directory_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path(), SourceFilter::All, Source::Npm).unwrap().is_empty());
    }
}

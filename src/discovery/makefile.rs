use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::candidate::{Candidate, Source};
use crate::error::{Result, RunnerError};

pub const MAKEFILE: &str = "Makefile";

fn target_regex() -> &'static Regex {
    static TARGET: OnceLock<Regex> = OnceLock::new();
    TARGET.get_or_init(|| {
        Regex::new(r"^([a-zA-Z0-9_-]+):\s*(.*)$").unwrap_or_else(|err| unreachable!("target regex: {err}"))
    })
}

pub fn read_makefile(dir: &Path) -> Result<Vec<Candidate>> {
    let path = dir.join(MAKEFILE);
    let contents = fs::read_to_string(&path).map_err(|source| RunnerError::Read { path, source })?;
    let targets = parse_makefile(&contents);
    debug!(targets = targets.len(), "parsed Makefile");
    Ok(targets)
}

/// Targets with at least one recipe line, in file order. Recipe lines are
/// joined with ` && ` and lose their leading `@`.
pub fn parse_makefile(contents: &str) -> Vec<Candidate> {
    let mut targets = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    let mut finish = |current: Option<(String, Vec<String>)>| {
        if let Some((name, recipe)) = current {
            if !recipe.is_empty() {
                targets.push(Candidate::new(name, recipe.join(" && "), Source::Make));
            }
        }
    };

    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(caps) = target_regex().captures(line) {
            // `NAME:=value` is an assignment, not a rule.
            if caps[2].starts_with('=') {
                continue;
            }
            finish(current.take());
            current = Some((caps[1].to_string(), Vec::new()));
        } else if let Some(recipe_line) = line.strip_prefix('\t') {
            if let Some((_, recipe)) = current.as_mut() {
                let command = recipe_line.strip_prefix('@').unwrap_or(recipe_line);
                recipe.push(command.to_string());
            }
        }
    }
    finish(current);

    targets
}

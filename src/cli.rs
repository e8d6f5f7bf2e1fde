//! Command line surface and the top-level flow behind it.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::{debug, warn};

use crate::candidate::{Candidate, ScoredCandidate, Source};
use crate::completion::{self, Shell};
use crate::config::Config;
use crate::discovery::{self, SourceFilter};
use crate::exec;
use crate::frecency::{most_frecent, render_stars};
use crate::history::{HistoryStore, JsonHistoryStore};
use crate::search::SearchEngine;
use crate::selector::{format_metadata, run_selector, PinChange};

#[derive(Debug, Parser)]
#[command(
    name = "frun",
    version,
    about = "Pick and run Makefile targets and package.json scripts, most used first",
    after_help = "Arguments after `--` are passed to the script:\n  \
                  frun test -- --watch      runs e.g. `npm run test -- --watch`\n\n\
                  In the picker: type to filter, ↑/↓ to move, enter to run, esc to clear, \
                  alt+p to pin, ctrl+c to quit."
)]
pub struct Cli {
    /// Words to filter scripts by
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,

    /// Filter scripts by QUERY (same as the positional words)
    #[arg(short = 's', long = "search", value_name = "QUERY")]
    pub search: Option<String>,

    /// Run the most frecent script, or the best match for QUERY, without asking
    #[arg(short = 'l', long)]
    pub last: bool,

    /// List scripts with their frecency
    #[arg(long)]
    pub list: bool,

    /// List script names only, one per line
    #[arg(long)]
    pub list_names: bool,

    /// Pin a script so it always sorts first
    #[arg(long, value_name = "SCRIPT", conflicts_with = "unpin")]
    pub pin: Option<String>,

    /// Unpin a script
    #[arg(long, value_name = "SCRIPT")]
    pub unpin: Option<String>,

    /// Which source --pin/--unpin mean when a name exists in several
    #[arg(long, value_name = "SOURCE", value_parser = parse_source)]
    pub source: Option<Source>,

    /// Only Makefile targets
    #[arg(long, conflicts_with = "use_package_json")]
    pub use_makefile: bool,

    /// Only package.json scripts
    #[arg(long)]
    pub use_package_json: bool,

    /// Detect the package manager again instead of using the cached answer
    #[arg(long)]
    pub no_cache: bool,

    /// Clear usage history for this directory
    #[arg(long)]
    pub reset: bool,

    /// Clear all usage history
    #[arg(long)]
    pub global_reset: bool,

    /// Print a shell completion script
    #[arg(long, value_enum, value_name = "SHELL")]
    pub generate_completion: Option<Shell>,

    /// Config file (default: <config dir>/frecent-run/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Arguments passed through to the script
    #[arg(last = true, value_name = "ARGS")]
    pub script_args: Vec<String>,
}

fn parse_source(value: &str) -> Result<Source, String> {
    value.parse().map_err(|err: crate::RunnerError| err.to_string())
}

impl Cli {
    /// The search query, from `--search` or the positional words.
    pub fn query(&self) -> String {
        match &self.search {
            Some(search) => search.clone(),
            None => self.query.join(" "),
        }
    }

    pub fn source_filter(&self) -> SourceFilter {
        if self.use_makefile {
            SourceFilter::MakefileOnly
        } else if self.use_package_json {
            SourceFilter::PackageJsonOnly
        } else {
            SourceFilter::All
        }
    }
}

/// Run the command line; the returned code is the process exit code.
pub fn run(cli: Cli) -> Result<i32> {
    if let Some(shell) = cli.generate_completion {
        print!("{}", completion::script(shell));
        eprintln!("\n{}", completion::install_hint(shell));
        return Ok(0);
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    let dir = std::env::current_dir().context("Failed to get current directory")?;
    let app = App {
        key: directory_key(&dir),
        dir,
        config,
        now: Utc::now(),
    };

    if cli.global_reset {
        app.open_store()?.reset_all()?;
        println!("✓ All usage history cleared");
        return Ok(0);
    }
    if cli.reset {
        app.open_store()?.reset_directory(&app.key)?;
        println!("✓ Usage history cleared for {}", app.dir.display());
        return Ok(0);
    }
    if let Some(name) = &cli.pin {
        return app.pin(name, cli.source, cli.source_filter(), cli.no_cache);
    }
    if let Some(name) = &cli.unpin {
        return app.unpin(name, cli.source);
    }

    app.pick_and_run(&cli)
}

struct App {
    config: Config,
    dir: PathBuf,
    /// History key for `dir`.
    key: String,
    now: DateTime<Utc>,
}

impl App {
    fn open_store(&self) -> Result<JsonHistoryStore> {
        let path = self
            .config
            .history_path()
            .context("Could not determine the config directory")?;
        JsonHistoryStore::open(&path).context("Failed to open usage history")
    }

    /// The cached package manager for this directory, detecting and caching
    /// it when there is none or `no_cache` is set.
    fn package_manager(&self, store: Option<&mut JsonHistoryStore>, no_cache: bool) -> Source {
        let Some(store) = store else {
            return discovery::detect_package_manager(&self.dir);
        };
        if !no_cache {
            match store.cached_package_manager(&self.key) {
                Ok(Some(cached)) => return cached,
                Ok(None) => {}
                Err(err) => warn!(error = %err, "failed to read cached package manager"),
            }
        }
        let detected = discovery::detect_package_manager(&self.dir);
        if let Err(err) = store.cache_package_manager(&self.key, detected, self.now) {
            warn!(error = %err, "failed to cache package manager");
        }
        detected
    }

    fn discover(
        &self,
        store: Option<&mut JsonHistoryStore>,
        filter: SourceFilter,
        no_cache: bool,
    ) -> Result<Vec<Candidate>> {
        let wants_package_json = filter != SourceFilter::MakefileOnly && discovery::has_package_json(&self.dir);
        let package_manager = if wants_package_json {
            self.package_manager(store, no_cache)
        } else {
            Source::Npm
        };
        let candidates = discovery::discover(&self.dir, filter, package_manager)?;
        if candidates.is_empty() {
            bail!("No Makefile or package.json found in {}", self.dir.display());
        }
        Ok(candidates)
    }

    fn pin(&self, name: &str, source: Option<Source>, filter: SourceFilter, no_cache: bool) -> Result<i32> {
        let mut store = self.open_store()?;
        let candidates = self.discover(Some(&mut store), filter, no_cache)?;
        let mut sources: Vec<Source> = candidates
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.source)
            .collect();
        sources.sort();
        sources.dedup();

        let source = choose_source(name, &sources, source, "not found")?;
        store.set_pinned(&self.key, name, source, true)?;
        println!("📌 Pinned '{name}' ({source})");
        Ok(0)
    }

    fn unpin(&self, name: &str, source: Option<Source>) -> Result<i32> {
        let mut store = self.open_store()?;
        let sources: Vec<Source> = store
            .find_by_name(&self.key, name)?
            .into_iter()
            .filter(|record| record.pinned)
            .map(|record| record.source)
            .collect();

        let source = choose_source(name, &sources, source, "is not pinned")?;
        store.set_pinned(&self.key, name, source, false)?;
        println!("✓ Unpinned '{name}' ({source})");
        Ok(0)
    }

    fn pick_and_run(&self, cli: &Cli) -> Result<i32> {
        // A broken history file must not stop scripts from running; without a
        // store nothing gets recorded.
        let mut store = match self.open_store() {
            Ok(store) => Some(store),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "usage history unavailable, continuing without it");
                None
            }
        };

        let candidates = self.discover(store.as_mut(), cli.source_filter(), cli.no_cache)?;
        let records = match store.as_ref().map(|s| s.usage(&self.key)) {
            Some(Ok(records)) => records,
            Some(Err(err)) => {
                warn!(error = %err, "failed to read usage history");
                Vec::new()
            }
            None => Vec::new(),
        };
        let scored = self.config.frecency.score_candidates(candidates, &records, self.now);
        let query = cli.query();
        debug!(candidates = scored.len(), query = %query, "scored candidates");

        if cli.list || cli.list_names {
            let shown = self.filter(&scored, &query)?;
            let mut out = io::stdout().lock();
            if cli.list_names {
                print_names(&mut out, &shown)?;
            } else {
                self.print_list(&mut out, &shown)?;
            }
            return Ok(0);
        }

        let selected = if cli.last && !query.trim().is_empty() {
            let Some(best) = self.filter(&scored, &query)?.into_iter().next() else {
                eprintln!("No scripts matching '{query}' found");
                return Ok(1);
            };
            eprintln!("Selected: {} → {}", best.name(), best.command());
            Some(best)
        } else if cli.last {
            match most_frecent(&scored) {
                Some(best) => Some(best.clone()),
                None => {
                    eprintln!("No script usage history found. Please select a script:");
                    self.select(store.as_mut(), scored, "")?
                }
            }
        } else {
            self.select(store.as_mut(), scored, &query)?
        };

        let Some(selected) = selected else {
            return Ok(0);
        };

        if let Some(store) = store.as_mut() {
            if let Err(err) = store.record_usage(&self.key, selected.name(), selected.source(), self.now) {
                warn!(error = %err, "failed to record usage");
            }
        }

        eprintln!("\n🚀 Running: {}\n", exec::display_command(&selected.candidate, &cli.script_args));
        let status = exec::run(&selected.candidate, &cli.script_args)?;
        Ok(exec::exit_code(status))
    }

    /// Run the picker, then persist any pin changes made in it.
    fn select(
        &self,
        store: Option<&mut JsonHistoryStore>,
        scored: Vec<ScoredCandidate>,
        query: &str,
    ) -> Result<Option<ScoredCandidate>> {
        let outcome = run_selector(scored, query, &self.config)?;
        if let Some(store) = store {
            flush_pins(store, &self.key, &outcome.pin_changes);
        }
        Ok(outcome.selected)
    }

    fn filter(&self, scored: &[ScoredCandidate], query: &str) -> Result<Vec<ScoredCandidate>> {
        if query.trim().is_empty() {
            return Ok(scored.to_vec());
        }
        let engine = SearchEngine::new(self.config.search.clone(), scored)?;
        Ok(engine
            .rank(scored, query)
            .into_iter()
            .map(|ranked| ranked.scored)
            .collect())
    }

    fn print_list(&self, out: &mut impl Write, shown: &[ScoredCandidate]) -> io::Result<()> {
        writeln!(out, "\nScripts in {} (most frecent first):\n", self.dir.display())?;
        for scored in shown {
            let stars = render_stars(self.config.frecency.star_rating(scored.frecency_score));
            let metadata = format_metadata(&stars, scored.source(), scored.use_count, scored.last_used, self.now);
            let pin = if scored.pinned { " (pinned)" } else { "" };
            writeln!(out, "{}{pin}", scored.name())?;
            writeln!(out, "   {} {metadata}", scored.command())?;
            writeln!(out, "   Run with: {}\n", exec::display_command(&scored.candidate, &[]))?;
        }
        Ok(())
    }
}

/// Names once each, in the order given.
fn print_names(out: &mut impl Write, shown: &[ScoredCandidate]) -> io::Result<()> {
    let mut seen = std::collections::HashSet::new();
    for scored in shown {
        if seen.insert(scored.name()) {
            writeln!(out, "{}", scored.name())?;
        }
    }
    Ok(())
}

fn flush_pins(store: &mut impl HistoryStore, key: &str, changes: &[PinChange]) {
    for change in changes {
        if let Err(err) = store.set_pinned(key, &change.name, change.source, change.pinned) {
            warn!(error = %err, name = %change.name, "failed to save pin");
        }
    }
}

/// Resolve which of `sources` a `--pin`/`--unpin` means.
fn choose_source(name: &str, sources: &[Source], wanted: Option<Source>, missing: &str) -> Result<Source> {
    match (sources, wanted) {
        ([], _) => bail!("Script '{name}' {missing}"),
        (_, Some(wanted)) if sources.contains(&wanted) => Ok(wanted),
        (_, Some(wanted)) => bail!("Script '{name}' ({wanted}) {missing}"),
        ([only], None) => Ok(*only),
        (many, None) => {
            let list: Vec<&str> = many.iter().map(Source::as_str).collect();
            bail!(
                "Script '{name}' exists in several sources ({}); choose one with --source",
                list.join(", ")
            )
        }
    }
}

/// History key for a directory.
pub fn directory_key(dir: &Path) -> String {
    dir.to_string_lossy().into_owned()
}

//! Interactive picker: a query line over a scrolling list of candidates.
//!
//! The state machine lives in [`state`] and never touches the terminal, so
//! it can be driven by tests. This module owns the terminal session.

mod input;
mod render;
mod state;

use std::io::{self, stdout, Stdout};

use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::candidate::ScoredCandidate;
use crate::config::Config;
use crate::error::{Result, RunnerError};

pub use input::map_key;
pub use render::{format_metadata, format_time_ago, render, Theme};
pub use state::{Outcome, PinChange, SelectorEvent, SelectorState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Display lines per candidate: name, then command and metadata.
    pub lines_per_candidate: usize,
    /// Lines taken by title, query, help and spacing.
    pub chrome_lines: usize,
    pub min_viewport_height: usize,
    /// Size assumed until the terminal reports its own.
    pub initial_width: u16,
    pub initial_height: u16,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            lines_per_candidate: 2,
            chrome_lines: 6,
            min_viewport_height: 5,
            initial_width: 80,
            initial_height: 24,
        }
    }
}

/// What a finished session hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOutcome {
    /// `None` when the user cancelled.
    pub selected: Option<ScoredCandidate>,
    /// Pin flips to persist, in the order they were made.
    pub pin_changes: Vec<PinChange>,
}

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Run the picker until the user confirms or cancels.
///
/// Fails with [`RunnerError::NoCandidates`] before touching the terminal when
/// there is nothing to pick from. The terminal is restored before any error
/// is returned.
pub fn run_selector(
    candidates: Vec<ScoredCandidate>,
    initial_query: &str,
    config: &Config,
) -> Result<SelectionOutcome> {
    let mut state = SelectorState::new(candidates, initial_query, config)?;

    let mut terminal = setup_terminal().map_err(RunnerError::Terminal)?;
    let result = event_loop(&mut terminal, &mut state);
    let restored = restore_terminal(&mut terminal);

    result.map_err(RunnerError::Terminal)?;
    restored.map_err(RunnerError::Terminal)?;

    let (outcome, pin_changes) = state.into_parts();
    let selected = match outcome {
        Some(Outcome::Selected(candidate)) => Some(candidate),
        _ => None,
    };
    debug!(
        selected = selected.as_ref().map(|c| c.name()),
        pins = pin_changes.len(),
        "selector finished"
    );
    Ok(SelectionOutcome {
        selected,
        pin_changes,
    })
}

fn setup_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err);
    }
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Tui) -> io::Result<()> {
    let raw = disable_raw_mode();
    let screen = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let cursor = terminal.show_cursor();
    if let Err(err) = &raw {
        warn!(error = %err, "failed to leave raw mode");
    }
    raw.and(screen).and(cursor)
}

fn event_loop(terminal: &mut Tui, state: &mut SelectorState) -> io::Result<()> {
    let (width, height) = terminal::size()?;
    state.update(SelectorEvent::Resize { width, height });

    while !state.is_finished() {
        terminal.draw(|frame| render(frame, state, Utc::now()))?;

        let selector_event = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key),
            Event::Resize(width, height) => Some(SelectorEvent::Resize { width, height }),
            _ => None,
        };
        if let Some(selector_event) = selector_event {
            state.update(selector_event);
        }
    }
    Ok(())
}

use crate::candidate::{RankedCandidate, ScoredCandidate, Source};
use crate::config::Config;
use crate::error::{Result, RunnerError};
use crate::frecency::{sort_base_order, FrecencyConfig};
use crate::search::SearchEngine;

use super::SelectorConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEvent {
    Insert(char),
    Backspace,
    /// Empty the query and show everything again. Never ends the session.
    ClearFilter,
    Up,
    Down,
    PageUp,
    PageDown,
    Confirm,
    Cancel,
    Resize { width: u16, height: u16 },
    TogglePin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Selected(ScoredCandidate),
    Cancelled,
}

/// A pin flip made during the session, written to the store afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinChange {
    pub name: String,
    pub source: Source,
    pub pinned: bool,
}

/// Everything the selector knows. Events go through [`SelectorState::update`];
/// rendering only reads.
#[derive(Debug)]
pub struct SelectorState {
    config: SelectorConfig,
    frecency: FrecencyConfig,
    engine: SearchEngine,
    query: String,
    candidates: Vec<ScoredCandidate>,
    filtered: Vec<RankedCandidate>,
    selected: usize,
    /// First visible display line of the candidate list.
    offset: usize,
    viewport_height: usize,
    width: u16,
    height: u16,
    outcome: Option<Outcome>,
    pin_changes: Vec<PinChange>,
}

impl SelectorState {
    /// `candidates` must already be in base order.
    pub fn new(candidates: Vec<ScoredCandidate>, initial_query: &str, config: &Config) -> Result<Self> {
        if candidates.is_empty() {
            return Err(RunnerError::NoCandidates);
        }
        let engine = SearchEngine::new(config.search.clone(), &candidates)?;
        let selector = config.selector.clone();
        let mut state = Self {
            viewport_height: selector.min_viewport_height,
            width: selector.initial_width,
            height: selector.initial_height,
            config: selector,
            frecency: config.frecency.clone(),
            engine,
            query: initial_query.to_string(),
            candidates,
            filtered: Vec::new(),
            selected: 0,
            offset: 0,
            outcome: None,
            pin_changes: Vec::new(),
        };
        state.resize(state.width, state.height);
        state.refilter();
        Ok(state)
    }

    pub fn update(&mut self, event: SelectorEvent) {
        if self.outcome.is_some() {
            return;
        }
        match event {
            SelectorEvent::Insert(c) => {
                self.query.push(c);
                self.refilter();
            }
            SelectorEvent::Backspace => {
                self.query.pop();
                self.refilter();
            }
            SelectorEvent::ClearFilter => self.clear_filter(),
            SelectorEvent::Up => {
                if !self.filtered.is_empty() {
                    self.selected = match self.selected {
                        0 => self.filtered.len() - 1,
                        n => n - 1,
                    };
                    self.scroll_to_selection();
                }
            }
            SelectorEvent::Down => {
                if !self.filtered.is_empty() {
                    self.selected = (self.selected + 1) % self.filtered.len();
                    self.scroll_to_selection();
                }
            }
            SelectorEvent::PageUp => {
                if !self.filtered.is_empty() {
                    self.selected = self.selected.saturating_sub(self.page_size());
                    self.scroll_to_selection();
                }
            }
            SelectorEvent::PageDown => {
                if !self.filtered.is_empty() {
                    self.selected = (self.selected + self.page_size()).min(self.filtered.len() - 1);
                    self.scroll_to_selection();
                }
            }
            SelectorEvent::Confirm => {
                if let Some(ranked) = self.filtered.get(self.selected) {
                    self.outcome = Some(Outcome::Selected(ranked.scored.clone()));
                }
            }
            SelectorEvent::Cancel => self.outcome = Some(Outcome::Cancelled),
            SelectorEvent::Resize { width, height } => self.resize(width, height),
            SelectorEvent::TogglePin => self.toggle_pin(),
        }
    }

    fn clear_filter(&mut self) {
        self.query.clear();
        self.refilter();
        self.selected = 0;
        self.offset = 0;
    }

    fn refilter(&mut self) {
        self.filtered = self.engine.rank(&self.candidates, &self.query);
        if self.selected >= self.filtered.len() {
            self.selected = 0;
        }
        self.scroll_to_selection();
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.viewport_height = usize::from(height)
            .saturating_sub(self.config.chrome_lines)
            .max(self.config.min_viewport_height);
        self.scroll_to_selection();
    }

    fn toggle_pin(&mut self) {
        let Some(ranked) = self.filtered.get(self.selected) else {
            return;
        };
        let name = ranked.name().to_string();
        let source = ranked.scored.source();

        let Some(target) = self
            .candidates
            .iter_mut()
            .find(|c| c.candidate.same_unit(&name, source))
        else {
            return;
        };
        target.pinned = !target.pinned;
        let pinned = target.pinned;

        sort_base_order(&mut self.candidates);
        self.filtered = self.engine.rank(&self.candidates, &self.query);
        self.selected = self
            .filtered
            .iter()
            .position(|r| r.scored.candidate.same_unit(&name, source))
            .unwrap_or(0);
        self.scroll_to_selection();

        // Toggling twice in one session cancels out.
        if let Some(existing) = self
            .pin_changes
            .iter()
            .position(|c| c.name == name && c.source == source)
        {
            self.pin_changes.remove(existing);
        } else {
            self.pin_changes.push(PinChange { name, source, pinned });
        }
    }

    /// Move the viewport the least amount that shows the whole selected block.
    fn scroll_to_selection(&mut self) {
        let lines = self.config.lines_per_candidate.max(1);
        let first = self.selected * lines;
        let last = first + lines - 1;
        if first < self.offset {
            self.offset = first;
        } else if last >= self.offset + self.viewport_height {
            self.offset = (last + 1).saturating_sub(self.viewport_height);
        }
    }

    fn page_size(&self) -> usize {
        (self.viewport_height / self.config.lines_per_candidate.max(1)).max(1)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filtered(&self) -> &[RankedCandidate] {
        &self.filtered
    }

    pub fn candidates(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn lines_per_candidate(&self) -> usize {
        self.config.lines_per_candidate.max(1)
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn frecency(&self) -> &FrecencyConfig {
        &self.frecency
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn into_parts(self) -> (Option<Outcome>, Vec<PinChange>) {
        (self.outcome, self.pin_changes)
    }

    pub fn pin_changes(&self) -> &[PinChange] {
        &self.pin_changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;

    fn scored(name: &str, command: &str, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            frecency_score: score,
            use_count: score as u32,
            ..ScoredCandidate::unused(Candidate::new(name, command, Source::Npm))
        }
    }

    fn candidates(n: usize) -> Vec<ScoredCandidate> {
        (0..n)
            .map(|i| scored(&format!("task-{i:02}"), &format!("run {i}"), (n - i) as f64))
            .collect()
    }

    fn state(candidates: Vec<ScoredCandidate>, query: &str) -> SelectorState {
        SelectorState::new(candidates, query, &Config::default()).unwrap()
    }

    fn assert_selection_visible(state: &SelectorState) {
        let lines = state.lines_per_candidate();
        let first = state.selected() * lines;
        let last = first + lines - 1;
        assert!(first >= state.offset(), "{first} above offset {}", state.offset());
        assert!(
            last < state.offset() + state.viewport_height(),
            "{last} below viewport {}+{}",
            state.offset(),
            state.viewport_height()
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            SelectorState::new(Vec::new(), "", &Config::default()),
            Err(RunnerError::NoCandidates)
        ));
    }

    #[test]
    fn initial_query_is_applied() {
        let s = state(
            vec![scored("dev", "vite", 1.0), scored("lint", "eslint .", 2.0)],
            "lint",
        );
        assert_eq!(s.filtered().len(), 1);
        assert_eq!(s.filtered()[0].name(), "lint");
    }

    #[test]
    fn navigation_wraps() {
        let mut s = state(candidates(3), "");
        s.update(SelectorEvent::Up);
        assert_eq!(s.selected(), 2);
        s.update(SelectorEvent::Down);
        assert_eq!(s.selected(), 0);
        s.update(SelectorEvent::Down);
        s.update(SelectorEvent::Down);
        assert_eq!(s.selected(), 2);
    }

    #[test]
    fn navigation_on_empty_list_is_noop() {
        let mut s = state(candidates(3), "zzzz");
        assert!(s.filtered().is_empty());
        s.update(SelectorEvent::Down);
        s.update(SelectorEvent::Up);
        s.update(SelectorEvent::PageDown);
        assert_eq!(s.selected(), 0);
        s.update(SelectorEvent::Confirm);
        assert!(!s.is_finished());
    }

    #[test]
    fn selection_resets_when_list_shrinks() {
        let mut s = state(candidates(10), "");
        for _ in 0..7 {
            s.update(SelectorEvent::Down);
        }
        assert_eq!(s.selected(), 7);
        for c in "task-03".chars() {
            s.update(SelectorEvent::Insert(c));
        }
        assert_eq!(s.filtered().len(), 1);
        assert_eq!(s.selected(), 0);
        assert_eq!(s.offset(), 0);
    }

    #[test]
    fn scrolling_keeps_selection_visible() {
        let mut s = state(candidates(30), "");
        s.update(SelectorEvent::Resize { width: 80, height: 16 });
        assert_eq!(s.viewport_height(), 10);

        for _ in 0..12 {
            s.update(SelectorEvent::Down);
            assert_selection_visible(&s);
        }
        // Minimal scroll: selected block sits on the last two lines.
        assert_eq!(s.offset(), 12 * 2 + 2 - 10);

        for _ in 0..12 {
            s.update(SelectorEvent::Up);
            assert_selection_visible(&s);
        }
        assert_eq!(s.offset(), 0);

        s.update(SelectorEvent::Up);
        assert_eq!(s.selected(), 29);
        assert_selection_visible(&s);
    }

    #[test]
    fn resize_honors_minimum_viewport() {
        let mut s = state(candidates(30), "");
        s.update(SelectorEvent::Resize { width: 40, height: 3 });
        assert_eq!(s.viewport_height(), 5);
        assert_eq!(s.size(), (40, 3));
        s.update(SelectorEvent::PageDown);
        assert_selection_visible(&s);
    }

    #[test]
    fn paging_clamps() {
        let mut s = state(candidates(30), "");
        s.update(SelectorEvent::Resize { width: 80, height: 16 });
        s.update(SelectorEvent::PageDown);
        assert_eq!(s.selected(), 5);
        for _ in 0..10 {
            s.update(SelectorEvent::PageDown);
        }
        assert_eq!(s.selected(), 29);
        s.update(SelectorEvent::PageUp);
        assert_eq!(s.selected(), 24);
        assert_selection_visible(&s);
    }

    #[test]
    fn clearing_twice_keeps_session_open() {
        let mut s = state(candidates(5), "task-01");
        s.update(SelectorEvent::ClearFilter);
        assert_eq!(s.query(), "");
        assert_eq!(s.filtered().len(), 5);
        assert!(!s.is_finished());

        s.update(SelectorEvent::ClearFilter);
        assert!(!s.is_finished());
        assert!(s.outcome().is_none());
    }

    #[test]
    fn clear_filter_restores_base_order() {
        let mut s = state(candidates(5), "run 3");
        s.update(SelectorEvent::ClearFilter);
        assert_eq!(s.selected(), 0);
        assert_eq!(s.offset(), 0);
        let names: Vec<&str> = s.filtered().iter().map(|r| r.name()).collect();
        let base: Vec<&str> = s.candidates().iter().map(|c| c.name()).collect();
        assert_eq!(names, base);
    }

    #[test]
    fn confirm_picks_selected() {
        let mut s = state(candidates(3), "");
        s.update(SelectorEvent::Down);
        s.update(SelectorEvent::Confirm);
        match s.outcome() {
            Some(Outcome::Selected(picked)) => assert_eq!(picked.name(), "task-01"),
            other => panic!("unexpected outcome {other:?}"),
        }
        // Finished sessions ignore further input.
        s.update(SelectorEvent::Down);
        assert_eq!(s.selected(), 1);
    }

    #[test]
    fn cancel_finishes_without_selection() {
        let mut s = state(candidates(3), "task");
        s.update(SelectorEvent::Cancel);
        let (outcome, pins) = s.into_parts();
        assert_eq!(outcome, Some(Outcome::Cancelled));
        assert!(pins.is_empty());
    }

    #[test]
    fn backspace_widens_results() {
        let mut s = state(candidates(12), "task-1");
        let narrow = s.filtered().len();
        s.update(SelectorEvent::Backspace);
        s.update(SelectorEvent::Backspace);
        assert!(s.filtered().len() > narrow);
        assert_eq!(s.query(), "task");
    }

    #[test]
    fn pin_moves_candidate_to_top_and_keeps_selection() {
        let mut s = state(candidates(4), "");
        s.update(SelectorEvent::Down);
        s.update(SelectorEvent::Down);
        s.update(SelectorEvent::TogglePin);

        assert_eq!(s.candidates()[0].name(), "task-02");
        assert!(s.candidates()[0].pinned);
        assert_eq!(s.selected(), 0);
        assert_eq!(
            s.pin_changes(),
            [PinChange {
                name: "task-02".into(),
                source: Source::Npm,
                pinned: true,
            }]
        );

        s.update(SelectorEvent::TogglePin);
        assert_eq!(s.candidates()[2].name(), "task-02");
        assert_eq!(s.selected(), 2);
        assert!(s.pin_changes().is_empty());
    }

    #[test]
    fn pin_under_filter() {
        let mut s = state(candidates(6), "task");
        s.update(SelectorEvent::Up);
        let name = s.filtered()[s.selected()].name().to_string();
        s.update(SelectorEvent::TogglePin);
        assert_eq!(s.filtered()[s.selected()].name(), name);
        assert_eq!(s.query(), "task");
        assert_eq!(s.pin_changes().len(), 1);
    }
}

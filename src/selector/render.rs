use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::candidate::{RankedCandidate, Source};
use crate::frecency::render_stars;

use super::SelectorState;

const CURSOR: &str = "❯ ";
const NO_CURSOR: &str = "  ";
const COMMAND_INDENT: &str = "   ";
const PIN_MARKER: &str = " (pinned)";
const ELLIPSIS: char = '…';

pub struct Theme {
    pub title_fg: Color,
    pub name_fg: Color,
    pub command_fg: Color,
    pub metadata_fg: Color,
    pub make_fg: Color,
    pub cursor_fg: Color,
    pub pinned_fg: Color,
    pub selection_bg: Color,
    pub placeholder_fg: Color,
    pub accent: Color,
    pub dim_fg: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            title_fg: Color::Cyan,
            name_fg: Color::Rgb(102, 194, 205),
            command_fg: Color::Rgb(188, 188, 188),
            metadata_fg: Color::Rgb(88, 88, 88),
            make_fg: Color::Rgb(168, 204, 140),
            cursor_fg: Color::Rgb(210, 144, 228),
            pinned_fg: Color::Rgb(219, 171, 121),
            selection_bg: Color::Rgb(42, 42, 42),
            placeholder_fg: Color::Rgb(100, 100, 100),
            accent: Color::Cyan,
            dim_fg: Color::Rgb(100, 100, 100),
        }
    }
}

pub fn render(frame: &mut Frame, state: &SelectorState, now: DateTime<Utc>) {
    let t = Theme::dark();
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(1), // Spacing
            Constraint::Length(1), // Query
            Constraint::Length(1), // Spacing
            Constraint::Min(0),    // Candidates
            Constraint::Length(1), // Spacing
            Constraint::Length(1), // Help
        ])
        .split(area);

    render_title(frame, state, &t, layout[0]);
    render_query(frame, state, &t, layout[2]);
    render_candidates(frame, state, &t, layout[4], now);
    render_help(frame, &t, layout[6]);
}

fn render_title(frame: &mut Frame, state: &SelectorState, t: &Theme, area: Rect) {
    let width = usize::from(area.width);
    let title = "Search scripts (type to filter)";
    let count = format!(" {}/{}", state.filtered().len(), state.candidates().len());

    let title = truncate(title, width);
    let count = truncate(&count, width.saturating_sub(title.width()));
    let line = Line::from(vec![
        Span::styled(title, Style::default().fg(t.title_fg).add_modifier(Modifier::BOLD)),
        Span::styled(count, Style::default().fg(t.dim_fg)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_query(frame: &mut Frame, state: &SelectorState, t: &Theme, area: Rect) {
    let width = usize::from(area.width);
    let prompt = truncate("/ ", width);
    let rest = width.saturating_sub(prompt.width());

    let mut spans = vec![Span::styled(prompt, Style::default().fg(t.accent).add_modifier(Modifier::BOLD))];
    if state.query().is_empty() {
        spans.push(Span::styled(
            truncate("Type to filter...", rest),
            Style::default().fg(t.placeholder_fg),
        ));
    } else {
        // Keep the end of a long query visible, it is where typing happens.
        let query = tail(state.query(), rest.saturating_sub(1));
        let cursor_room = rest.saturating_sub(query.width());
        spans.push(Span::raw(query));
        if cursor_room > 0 {
            spans.push(Span::styled("█", Style::default().fg(t.accent)));
        }
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_candidates(
    frame: &mut Frame,
    state: &SelectorState,
    t: &Theme,
    area: Rect,
    now: DateTime<Utc>,
) {
    let width = usize::from(area.width);
    if state.filtered().is_empty() {
        let msg = truncate("No matching scripts found", width);
        frame.render_widget(
            Paragraph::new(Span::styled(msg, Style::default().fg(t.dim_fg))),
            area,
        );
        return;
    }

    let lines_per_candidate = state.lines_per_candidate().max(1);
    let visible = usize::from(area.height);
    let offset = drawn_offset(state, visible);
    let first_block = offset / lines_per_candidate;
    let skip = offset % lines_per_candidate;

    let lines: Vec<Line> = state
        .filtered()
        .iter()
        .enumerate()
        .skip(first_block)
        .flat_map(|(i, ranked)| {
            let mut block = candidate_lines(state, ranked, i == state.selected(), width, t, now);
            block.resize(lines_per_candidate, Line::from(""));
            block
        })
        .skip(skip)
        .take(visible)
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

/// The state scrolls against a viewport of at least the configured minimum,
/// which can be taller than the area a short terminal leaves for the list.
/// Scroll further when needed so the selected name line is drawn.
fn drawn_offset(state: &SelectorState, visible: usize) -> usize {
    let lines = state.lines_per_candidate().max(1);
    let first = state.selected() * lines;
    let last = first + lines - 1;
    let offset = state.offset().min(first);
    if visible < lines {
        first
    } else if last >= offset + visible {
        last + 1 - visible
    } else {
        offset
    }
}

fn candidate_lines(
    state: &SelectorState,
    ranked: &RankedCandidate,
    is_selected: bool,
    width: usize,
    t: &Theme,
    now: DateTime<Utc>,
) -> Vec<Line<'static>> {
    let scored = &ranked.scored;

    let (prefix, prefix_style) = if is_selected {
        (CURSOR, Style::default().fg(t.cursor_fg))
    } else {
        (NO_CURSOR, Style::default())
    };
    let prefix = truncate(prefix, width);
    let marker = if scored.pinned {
        truncate(PIN_MARKER, width.saturating_sub(prefix.width()))
    } else {
        String::new()
    };
    let name = truncate(
        scored.name(),
        width.saturating_sub(prefix.width() + marker.width()),
    );
    let name_line = Line::from(vec![
        Span::styled(prefix, prefix_style),
        Span::styled(name, Style::default().fg(t.name_fg).add_modifier(Modifier::BOLD)),
        Span::styled(marker, Style::default().fg(t.pinned_fg)),
    ]);

    let stars = render_stars(state.frecency().star_rating(scored.frecency_score));
    let metadata = format_metadata(&stars, scored.source(), scored.use_count, scored.last_used, now);
    let source_style = if scored.source() == Source::Make {
        Style::default().fg(t.make_fg)
    } else {
        Style::default().fg(t.metadata_fg)
    };

    let indent = truncate(COMMAND_INDENT, width);
    let room = width.saturating_sub(indent.width());
    let metadata = truncate(&metadata, room);
    // One column between command and metadata; drop the command if it would
    // not fit even a couple of characters.
    let command_room = room.saturating_sub(metadata.width() + 1);
    let mut detail = vec![Span::raw(indent)];
    if command_room >= 2 {
        detail.push(Span::styled(
            truncate(scored.command(), command_room),
            Style::default().fg(t.command_fg),
        ));
        detail.push(Span::raw(" "));
    }
    detail.push(Span::styled(metadata, source_style));
    let detail_line = Line::from(detail);

    if is_selected {
        let bg = Style::default().bg(t.selection_bg);
        vec![name_line.style(bg), detail_line.style(bg)]
    } else {
        vec![name_line, detail_line]
    }
}

fn render_help(frame: &mut Frame, t: &Theme, area: Rect) {
    let help = "↑/↓ navigate • enter select • esc clear • alt+p pin • ctrl+c quit";
    let help = truncate(help, usize::from(area.width));
    frame.render_widget(
        Paragraph::new(Span::styled(help, Style::default().fg(t.metadata_fg))),
        area,
    );
}

/// `[★★☆☆☆ make · 3 runs, 2h ago]`
pub fn format_metadata(
    stars: &str,
    source: Source,
    use_count: u32,
    last_used: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String {
    let runs = if use_count == 1 {
        "1 run".to_string()
    } else {
        format!("{use_count} runs")
    };
    match last_used {
        Some(last_used) => format!(
            "[{stars} {source} · {runs}, {}]",
            format_time_ago(last_used, now)
        ),
        None => format!("[{stars} {source} · {runs}]"),
    }
}

pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(then);

    if duration.num_minutes() < 1 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_days() < 30 {
        format!("{}w ago", duration.num_weeks())
    } else {
        then.format("%b %d").to_string()
    }
}

/// Cut `s` to at most `max` display columns, ending in `…` when shortened.
fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push(ELLIPSIS);
    out
}

/// The last `max` display columns of `s`.
fn tail(s: &str, max: usize) -> String {
    let mut used = 0;
    let mut start = s.len();
    for (i, c) in s.char_indices().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > max {
            break;
        }
        used += w;
        start = i;
    }
    s[start..].to_string()
}

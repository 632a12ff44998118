//! Layout arithmetic for the triage screen.
//!
//! Pure geometry, recomputed inside every `terminal.draw()` so it always
//! reflects the current terminal size.
//!
//! ```text
//! ┌ header ─────────────────────────────────────┐
//! ├ root cause ──────────┬ suggested fix ───────┤  (only with an analysis)
//! ├ logs ────────────────┬ chat ────────────────┤
//! │                      │                      │
//! └──────────────────────┴──────────────────────┘
//!  status bar
//! ```
//!
//! Below 100 columns only the focused panel of the logs/chat pair is shown.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{AppState, Mode, PanelFocus, View};
use crate::theme::Theme;

/// Narrowest terminal that shows logs and chat side by side.
pub const SPLIT_MIN_WIDTH: u16 = 100;

/// Panel rects for one frame. Zero-sized rects are hidden panels.
#[derive(Debug, Clone, Copy)]
pub struct Areas {
    pub header: Rect,
    pub analysis: Rect,
    pub logs: Rect,
    pub chat: Rect,
    pub status_bar: Rect,
}

/// Splits `area` into the panels for the current state.
pub fn compute_layout(area: Rect, state: &AppState) -> Areas {
    let has_analysis = state.run.as_ref().is_some_and(|r| r.analysis.is_some());
    let analysis_height = if has_analysis { 4 } else { 0 };

    let [header, analysis, main_area, status_bar] = area.layout(&Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(analysis_height),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]));

    let horizontal = if area.width >= SPLIT_MIN_WIDTH {
        Layout::horizontal([Constraint::Percentage(state.log_pct), Constraint::Fill(1)])
            .spacing(Spacing::Overlap(1))
    } else {
        match state.focus {
            PanelFocus::Logs => Layout::horizontal([Constraint::Fill(1), Constraint::Length(0)]),
            PanelFocus::Chat => Layout::horizontal([Constraint::Length(0), Constraint::Fill(1)]),
        }
    };
    let [logs, chat] = main_area.layout(&horizontal);

    Areas { header, analysis, logs, chat, status_bar }
}

/// The area inside a 1-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered block for a panel; thick border when focused.
///
/// `MergeStrategy::Fuzzy` keeps junctions correct where thick and plain
/// borders meet.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let color = if is_focused { theme.border_active } else { theme.border_inactive };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(Style::default().fg(color))
        .merge_borders(MergeStrategy::Fuzzy)
}

/// A bold label span, used for mode indicators and card titles.
pub fn label(text: impl Into<String>, color: ratatui::style::Color) -> Span<'static> {
    Span::styled(text.into(), Style::default().fg(color).add_modifier(Modifier::BOLD))
}

/// Renders the 1-row status bar.
///
/// Prompts (search, open-run, quit confirmation) take over the bar while
/// their mode is active; otherwise it shows the mode, the run, and hints.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let line = match state.mode {
        Mode::Search => Line::from(vec![
            label(" SEARCH ", theme.status_mode_search),
            Span::raw(format!(" /{}\u{2588}", state.query)),
        ]),
        Mode::OpenRun => Line::from(vec![
            label(" OPEN ", theme.status_mode_search),
            Span::raw(format!(" run id: {}\u{2588}", state.run_prompt)),
        ]),
        Mode::ConfirmQuit => Line::from(vec![
            label(" QUIT ", theme.status_failure),
            Span::raw(" A reply is still pending. Quit anyway? (y/n)"),
        ]),
        Mode::Normal | Mode::Insert | Mode::HelpOverlay => {
            let (mode_text, mode_fg) = if state.mode == Mode::Insert {
                (" INSERT ", theme.status_mode_insert)
            } else {
                (" NORMAL ", theme.status_mode_normal)
            };
            let mut spans = vec![label(mode_text, mode_fg), Span::raw(format!(" run #{} ", state.run_id))];
            if state.view == View::Ready && !state.visible.is_empty() {
                spans.push(Span::raw(format!(
                    " line {}/{} ",
                    state.log_cursor + 1,
                    state.visible.len()
                )));
            }
            if state.is_sending() {
                spans.push(Span::styled(" waiting for reply ", Style::default().fg(theme.chat_pending)));
            }
            if let Some(flash) = &state.flash {
                spans.push(Span::styled(format!(" {flash} "), Style::default().add_modifier(Modifier::BOLD)));
            }
            spans.push(Span::styled(" ? help  q quit", Style::default().fg(theme.muted)));
            Line::from(spans)
        }
    };

    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}

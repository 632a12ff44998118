//! UI rendering.
//!
//! [`render`] is the single entry point, called from the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`; each
//! panel has its own module.

pub mod chat_view;
pub mod header;
pub mod help;
pub mod keybindings;
mod layout;
pub mod log_view;
pub mod wrap;

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::Paragraph,
};

use crate::app::{AppState, Mode, View};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_status_bar};

/// Renders one complete frame for the current view.
///
/// Inner viewport heights and panel rects are written back into `state` so
/// the next keypress can page and hit-test against what is on screen.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let areas = compute_layout(frame.area(), state);

    state.log_viewport_height = inner_rect(areas.logs).height;
    // The chat panel reserves one inner row for the input line.
    state.chat_viewport_height = inner_rect(areas.chat).height.saturating_sub(1);
    state.panel_rects = [areas.logs, areas.chat];

    header::render_header(frame, areas.header, state, theme);

    let main = areas.logs.union(areas.chat);
    match &state.view {
        View::Loading => render_loading(frame, main, state, theme),
        View::NotFound { reason } => render_not_found(frame, main, reason, theme),
        View::Ready => {
            header::render_analysis(frame, areas.analysis, state, theme);
            if areas.logs.width > 0 {
                log_view::fit_log_scroll(state, areas.logs);
                log_view::render_logs(frame, areas.logs, state, theme);
            }
            if areas.chat.width > 0 {
                chat_view::render_chat(frame, areas.chat, state, theme);
            }
        }
    }

    render_status_bar(frame, areas.status_bar, state, theme);

    if state.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, theme, state.help_scroll);
    }
}

fn render_loading(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let text = vec![Line::styled(
        format!("Loading run #{}...", state.run_id),
        Style::default().fg(theme.muted),
    )];
    render_centered(frame, area, text);
}

fn render_not_found(frame: &mut Frame, area: Rect, reason: &str, theme: &Theme) {
    let text = vec![
        Line::styled(
            "Run not found",
            Style::default().fg(theme.status_failure).add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::raw(reason.to_owned()),
        Line::raw(""),
        Line::styled("o open another run    q quit", Style::default().fg(theme.muted)),
    ];
    render_centered(frame, area, text);
}

fn render_centered(frame: &mut Frame, area: Rect, text: Vec<Line<'static>>) {
    let height = text.len() as u16;
    let target = area.centered(Constraint::Percentage(80), Constraint::Length(height));
    frame.render_widget(Paragraph::new(text).centered(), target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{chunk, loaded};
    use ratatui::{Terminal, backend::TestBackend};
    use triage_core::error::ApiError;

    fn screen(state: &mut AppState, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, state, &Theme::dark())).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn ready_view_shows_header_logs_and_welcome() {
        let mut state = loaded(vec![chunk(1, 0, Some(1), "npm install", false)]);
        let out = screen(&mut state, 120, 30);
        assert!(out.contains("CI"));
        assert!(out.contains("acme/app"));
        assert!(out.contains("abcdef0"));
        assert!(out.contains("npm install"));
        assert!(out.contains("AI Copilot"));
        assert!(state.log_viewport_height > 0);
    }

    #[test]
    fn status_bar_shows_flash() {
        let mut state = loaded(vec![chunk(1, 0, Some(1), "npm install", false)]);
        state.flash = Some("copied line 1".into());
        let out = screen(&mut state, 120, 30);
        assert!(out.lines().last().unwrap().contains("copied line 1"));
    }

    #[test]
    fn missing_run_shows_not_found() {
        let mut state = AppState::new("999");
        state.apply_run_loaded("999", Err(ApiError::Status { status: 404, message: "no".into() }));
        let out = screen(&mut state, 100, 20);
        assert!(out.contains("Run not found"));
        assert!(out.contains("The run does not exist."));
    }

    #[test]
    fn loading_view_names_the_run() {
        let mut state = AppState::new("7");
        assert!(screen(&mut state, 100, 20).contains("Loading run #7"));
    }
}

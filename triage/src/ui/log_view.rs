//! Log panel renderer.
//!
//! Long lines wrap under their line number instead of being cut at the panel
//! edge. Only the lines from `log_scroll` until the viewport is full are
//! wrapped per frame, so rendering cost follows the viewport rather than the
//! log size.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use triage_core::types::LogLine;

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};
use crate::ui::wrap::wrap_plain;

/// Gutter width for line numbers, excluding the trailing space.
const GUTTER: usize = 6;

/// Columns left for log text once the gutter and its space are taken.
fn content_width(inner_width: u16) -> usize {
    usize::from(inner_width).saturating_sub(GUTTER + 1).max(1)
}

fn row_count(line: &LogLine, width: usize) -> usize {
    wrap_plain(&line.content, width).len()
}

/// Moves `log_scroll` forward until the cursor line's last wrapped row lies
/// inside the panel at `area`.
///
/// `keep_cursor_visible` works in logical lines; this refines it once the
/// panel width, and therefore each line's wrapped height, is known.
pub fn fit_log_scroll(state: &mut AppState, area: Rect) {
    if state.visible.is_empty() {
        return;
    }
    let inner = inner_rect(area);
    let width = content_width(inner.width);
    let height = usize::from(inner.height).max(1);

    let cursor = state.log_cursor.min(state.visible.len() - 1);
    state.log_scroll = state.log_scroll.min(cursor);
    let mut used: usize = state.visible[state.log_scroll..=cursor]
        .iter()
        .map(|&i| row_count(&state.lines[i], width))
        .sum();
    while used > height && state.log_scroll < cursor {
        used -= row_count(&state.lines[state.visible[state.log_scroll]], width);
        state.log_scroll += 1;
    }
}

pub fn render_logs(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Logs;
    let mut block = panel_block(title(state, theme), is_focused, theme);
    if let Some(line) = state.selected_line() {
        block = block.title_bottom(Line::styled(
            format!(" step: {} ", line.step_name),
            Style::default().fg(theme.muted),
        ));
    }
    if state.defaulted_chunks > 0 {
        block = block.title_bottom(
            Line::styled(
                format!(" ~ {} chunk(s) numbered from 1 ", state.defaulted_chunks),
                Style::default().fg(theme.line_number_defaulted),
            )
            .right_aligned(),
        );
    }
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    if state.visible.is_empty() {
        let msg = if state.lines.is_empty() { "No logs available" } else { "No matches found" };
        let item = ListItem::new(Line::styled(msg, Style::default().fg(theme.muted)));
        frame.render_widget(List::new(vec![item]), inner);
        return;
    }

    let start = state.log_scroll.min(state.visible.len() - 1);
    let width = content_width(inner.width);
    let mut remaining = usize::from(inner.height);

    let mut items: Vec<ListItem> = Vec::new();
    for (pos, &line_idx) in state.visible.iter().enumerate().skip(start) {
        if remaining == 0 {
            break;
        }
        let rows = log_rows(&state.lines[line_idx], width, remaining, theme);
        remaining -= rows.len();
        let item = ListItem::new(rows);
        items.push(if pos == state.log_cursor {
            item.style(Style::default().bg(theme.selection_bg).add_modifier(Modifier::BOLD))
        } else {
            item
        });
    }

    frame.render_widget(List::new(items), inner);
}

fn title<'a>(state: &AppState, theme: &Theme) -> Line<'a> {
    if state.query.trim().is_empty() {
        return Line::from(format!(" Build Logs ({} lines) ", state.lines.len()));
    }
    Line::from(vec![
        Span::raw(format!(" Build Logs {}/{} matching ", state.visible.len(), state.lines.len())),
        Span::styled(format!("\"{}\" ", state.query), Style::default().fg(theme.search_match)),
    ])
}

/// The wrapped screen rows of one log line, at most `max_rows` of them.
///
/// The first row carries the line number; continuation rows get a blank
/// gutter so wrapped text stays aligned.
fn log_rows<'a>(line: &LogLine, width: usize, max_rows: usize, theme: &Theme) -> Vec<Line<'a>> {
    let number = if line.number_defaulted {
        Span::styled(
            format!("~{:>width$} ", line.line_number, width = GUTTER - 1),
            Style::default().fg(theme.line_number_defaulted),
        )
    } else {
        Span::styled(
            format!("{:>width$} ", line.line_number, width = GUTTER),
            Style::default().fg(theme.line_number),
        )
    };
    let text = Style::default().fg(if line.is_error { theme.log_error } else { theme.log_text });
    let mut gutter = Some(number);
    wrap_plain(&line.content, width)
        .into_iter()
        .take(max_rows)
        .map(|row| {
            let lead = gutter.take().unwrap_or_else(|| Span::raw(" ".repeat(GUTTER + 1)));
            Line::from(vec![lead, Span::styled(row, text)])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{chunk, loaded};
    use ratatui::{Terminal, backend::TestBackend};

    fn draw(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal
            .draw(|frame| render_logs(frame, frame.area(), state, &Theme::dark()))
            .unwrap();
        dump(&terminal)
    }

    fn dump(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn shows_numbered_lines() {
        let state = loaded(vec![chunk(1, 0, Some(10), "alpha\nbeta", false)]);
        let screen = draw(&state);
        assert!(screen.contains("    10 alpha"));
        assert!(screen.contains("    11 beta"));
    }

    #[test]
    fn marks_defaulted_numbers() {
        let state = loaded(vec![chunk(1, 0, None, "alpha", false)]);
        assert!(draw(&state).contains("~    1 alpha"));
    }

    #[test]
    fn distinguishes_empty_log_from_empty_filter() {
        let empty = loaded(Vec::new());
        assert!(draw(&empty).contains("No logs available"));

        let mut filtered = loaded(vec![chunk(1, 0, Some(1), "alpha", false)]);
        filtered.set_query("zeta".into());
        assert!(draw(&filtered).contains("No matches found"));
    }

    #[test]
    fn long_lines_wrap_under_the_gutter() {
        let long = format!("{}TAIL_ERROR_CAUSE", "x".repeat(80));
        let state = loaded(vec![chunk(1, 0, Some(1), &long, true)]);
        let screen = draw(&state);
        assert!(screen.contains("TAIL_ERROR_CAUSE"), "{screen}");

        // 58 inner columns leave 51 for text after the gutter.
        let rows: Vec<&str> = screen.lines().collect();
        assert!(rows[1].contains(&format!("     1 {}", "x".repeat(51))), "{screen}");
        let continuation: String = rows[2].chars().skip(1).collect();
        assert!(continuation.starts_with(&format!("       {}TAIL", "x".repeat(29))), "{screen}");
    }

    #[test]
    fn cursor_line_stays_on_screen_when_lines_wrap() {
        let content: Vec<String> = (1..=12).map(|n| format!("{}END{n:02}", "y".repeat(60))).collect();
        let mut state = loaded(vec![chunk(1, 0, Some(1), &content.join("\n"), false)]);
        state.log_viewport_height = 6;
        state.scroll_bottom();

        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal
            .draw(|frame| {
                fit_log_scroll(&mut state, frame.area());
                render_logs(frame, frame.area(), &state, &Theme::dark());
            })
            .unwrap();
        let screen = dump(&terminal);
        assert!(screen.contains("END12"), "{screen}");
        // Each line takes two rows, so three lines fill the six-row panel.
        assert_eq!(state.log_scroll, 9);
    }

    #[test]
    fn fit_keeps_scroll_when_cursor_already_fits() {
        let mut state = loaded(vec![chunk(1, 0, Some(1), "a\nb\nc", false)]);
        state.log_cursor = 2;
        fit_log_scroll(&mut state, Rect::new(0, 0, 60, 8));
        assert_eq!(state.log_scroll, 0);
    }
}

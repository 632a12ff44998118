//! Chat panel renderer.
//!
//! The transcript is bottom-anchored: the newest message sits just above the
//! input row and older messages grow upwards. Only as many messages as fit in
//! the viewport are wrapped each frame; `chat_scroll` hides that many of the
//! newest messages so older ones come into view.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use triage_core::types::{ChatMessage, ChatRole};

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};
use crate::ui::wrap::wrap_plain;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Current spinner glyph for `frame`.
pub fn spinner(frame: usize) -> &'static str {
    SPINNER[frame % SPINNER.len()]
}

pub fn render_chat(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Chat;
    let mut block = panel_block(" AI Copilot ", is_focused, theme);
    if state.chat_scroll > 0 {
        block = block.title_bottom(Line::styled(
            format!(" {} newer below ", state.chat_scroll),
            Style::default().fg(theme.muted),
        ));
    }
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let [transcript, input] =
        inner.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let rows = transcript_rows(state, usize::from(transcript.width), usize::from(transcript.height), theme);
    let top_pad = transcript.height.saturating_sub(rows.len() as u16);
    let anchored = Rect { y: transcript.y + top_pad, height: transcript.height - top_pad, ..transcript };
    frame.render_widget(Paragraph::new(rows), anchored);

    frame.render_widget(Paragraph::new(input_line(state, theme)), input);
}

/// The last `height` rows of the transcript, oldest first.
fn transcript_rows<'a>(state: &AppState, width: usize, height: usize, theme: &Theme) -> Vec<Line<'a>> {
    let mut blocks: Vec<Vec<Line<'a>>> = Vec::new();
    let mut total = 0;

    if state.is_sending() && state.chat_scroll == 0 {
        let pending = vec![Line::styled(
            format!("{} Analyzing logs...", spinner(state.spinner_frame)),
            Style::default().fg(theme.chat_pending),
        )];
        total += pending.len();
        blocks.push(pending);
    }

    let messages = state.session.messages();
    let end = messages.len().saturating_sub(state.chat_scroll);
    for message in messages[..end].iter().rev() {
        if total >= height {
            break;
        }
        let lines = message_lines(message, width, theme);
        total += lines.len();
        blocks.push(lines);
    }

    let mut rows: Vec<Line<'a>> = blocks.into_iter().rev().flatten().collect();
    if rows.len() > height {
        rows.drain(..rows.len() - height);
    }
    rows
}

fn message_lines<'a>(message: &ChatMessage, width: usize, theme: &Theme) -> Vec<Line<'a>> {
    let (who, color) = match message.role {
        ChatRole::User => ("You", theme.chat_user),
        ChatRole::Ai => ("AI Copilot", theme.chat_ai),
    };
    let body_color = if message.is_error { theme.chat_error } else { color };

    let mut lines = vec![Line::from(vec![
        Span::styled(who, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  {}", message.timestamp.with_timezone(&chrono::Local).format("%H:%M")),
            Style::default().fg(theme.muted),
        ),
    ])];
    lines.extend(
        wrap_plain(&message.content, width.saturating_sub(2))
            .into_iter()
            .map(|row| Line::styled(format!("  {row}"), Style::default().fg(body_color))),
    );
    lines.push(Line::raw(""));
    lines
}

fn input_line<'a>(state: &AppState, theme: &Theme) -> Line<'a> {
    let muted = Style::default().fg(theme.muted);
    if state.is_sending() {
        Line::styled("  waiting for reply...", muted)
    } else if state.mode == Mode::Insert {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.status_mode_insert)),
            Span::raw(format!("{}\u{2588}", state.input)),
        ])
    } else {
        Line::styled("  press i to ask about the failure", muted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::loaded;
    use crate::bridge::TriageCommand;
    use pretty_assertions::assert_eq;

    #[test]
    fn transcript_is_clipped_to_newest_rows() {
        let mut state = loaded(Vec::new());
        let req = state.apply_triage_command(TriageCommand::SendMessage("why?".into())).unwrap();
        state.apply_chat_reply(req.ticket, Ok("because".into()));

        let rows = transcript_rows(&state, 40, 3, &Theme::dark());
        assert_eq!(rows.len(), 3);
        let text: Vec<String> = rows.iter().map(|l| l.to_string()).collect();
        assert!(text[0].starts_with("AI Copilot"));
        assert_eq!(text[1], "  because");
        assert_eq!(text[2], "");
    }

    #[test]
    fn wide_text_wraps_inside_the_panel() {
        let mut state = loaded(Vec::new());
        state.apply_triage_command(TriageCommand::SendMessage("ビルドが失敗しました".into()));

        let rows = transcript_rows(&state, 12, 20, &Theme::dark());
        let text: Vec<String> = rows.iter().map(|l| l.to_string()).collect();
        assert!(text.contains(&"  ビルドが失".to_string()), "{text:?}");
        assert!(text.contains(&"  敗しました".to_string()), "{text:?}");
    }

    #[test]
    fn pending_indicator_is_newest_row() {
        let mut state = loaded(Vec::new());
        state.apply_triage_command(TriageCommand::SendMessage("why?".into()));
        let rows = transcript_rows(&state, 40, 20, &Theme::dark());
        let last = rows.last().unwrap().to_string();
        assert!(last.ends_with("Analyzing logs..."));
    }

    #[test]
    fn scrolled_transcript_hides_newest_messages() {
        let mut state = loaded(Vec::new());
        let req = state.apply_triage_command(TriageCommand::SendMessage("why?".into())).unwrap();
        state.apply_chat_reply(req.ticket, Ok("because".into()));
        state.chat_scroll = 1;

        let text: Vec<String> = transcript_rows(&state, 40, 50, &Theme::dark())
            .iter()
            .map(|l| l.to_string())
            .collect();
        assert!(text.iter().any(|l| l == "  why?"));
        assert!(!text.iter().any(|l| l == "  because"));
    }
}

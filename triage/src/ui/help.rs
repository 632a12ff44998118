//! Help overlay renderer.
//!
//! Drawn last inside the same `terminal.draw()` closure as the panels;
//! `Clear` erases the background so the overlay reads as a modal.

use ratatui::{
    Frame,
    layout::Constraint,
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;
use crate::ui::layout::label;

/// Renders the help overlay centred over the panels, scrolled by `help_scroll`.
///
/// Skipped below 60 columns, where the overlay would collapse to nothing.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help: j/k scroll, ? or Esc to dismiss ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text(theme))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text(theme: &Theme) -> Text<'static> {
    let heading = |text: &'static str| Line::from(label(text, theme.border_active));
    Text::from(vec![
        heading("Navigation"),
        Line::from("  j / k         Move down / up"),
        Line::from("  g / G         Jump to first / last"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from("  Ctrl-f / b    Full page down / up"),
        Line::from("  Tab / H / L   Switch between logs and chat"),
        Line::from("  < / >         Shrink / grow the log panel"),
        Line::from(""),
        heading("Logs"),
        Line::from("  /             Search (case-insensitive, live)"),
        Line::from("  Enter         Keep the query and leave search"),
        Line::from("  Esc           Clear the query"),
        Line::from("  a / Enter     Ask the AI about the selected line"),
        Line::from("  y             Copy the selected line to the clipboard"),
        Line::from(""),
        heading("Chat"),
        Line::from("  i             Compose a question"),
        Line::from("  Enter         Send (ignored while a reply is pending)"),
        Line::from("  Esc           Stop composing"),
        Line::from(""),
        heading("General"),
        Line::from("  o             Open another run by id"),
        Line::from("  ?             Open / close this help"),
        Line::from("  q / Esc       Quit (asks first while a reply is pending)"),
        Line::from("  Ctrl-c        Quit immediately"),
    ])
}

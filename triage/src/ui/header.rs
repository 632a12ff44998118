//! Run header and analysis cards.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::label;

/// Renders the workflow name, status badge, and repository coordinates.
pub fn render_header(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let block = Block::bordered().border_style(Style::default().fg(theme.border_inactive));

    let Some(run) = state.run.as_ref() else {
        let line = Line::from(format!("Run #{}", state.run_id));
        frame.render_widget(Paragraph::new(line).block(block), area);
        return;
    };

    let status_color = if run.is_failure() { theme.status_failure } else { theme.status_other };
    let title = Line::from(vec![
        Span::styled(
            run.workflow_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        label(format!(" {} ", run.status.to_uppercase()), status_color),
    ]);
    let muted = Style::default().fg(theme.muted);
    let coords = Line::from(vec![
        Span::raw(run.repo.full_name.clone()),
        Span::styled("  branch ", muted),
        Span::raw(run.branch.clone()),
        Span::styled("  commit ", muted),
        Span::raw(run.short_sha().to_owned()),
        Span::styled(format!("  run #{}", run.id), muted),
    ]);

    frame.render_widget(Paragraph::new(vec![title, coords]).block(block), area);
}

/// Renders the Root Cause and Suggested Fix cards side by side.
///
/// Each card shows at most two wrapped lines. No-op when the run has no
/// analysis or the row was collapsed by the layout.
pub fn render_analysis(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let Some(analysis) = state.run.as_ref().and_then(|r| r.analysis.as_ref()) else {
        return;
    };
    if area.height == 0 {
        return;
    }

    let [cause_area, fix_area] =
        area.layout(&Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]));

    let card = |title: &'static str, body: &str, color| {
        Paragraph::new(body.to_owned())
            .wrap(Wrap { trim: true })
            .block(
                Block::bordered()
                    .title(label(title, color))
                    .border_style(Style::default().fg(theme.border_inactive)),
            )
    };

    frame.render_widget(card(" Root Cause ", &analysis.root_cause, theme.root_cause), cause_area);
    frame.render_widget(card(" Suggested Fix ", &analysis.suggested_fix, theme.suggested_fix), fix_area);
}

//! Keybinding dispatcher.
//!
//! Translates crossterm key and mouse events into `AppState` mutations and
//! returns a [`KeyAction`] for the event loop. Dispatch branches first on
//! `state.mode`, so each mode has its own isolated handler.
//!
//! Chat sends never touch the session directly: both the compose box and the
//! log panel's "ask AI" action go through the [`TriageBridge`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use crate::app::{AppState, Mode, PanelFocus, View};
use crate::bridge::{ask_ai_prompt, TriageBridge};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
    /// Switch to the run with this id.
    OpenRun(String),
    /// Put this text on the system clipboard.
    Copy(String),
}

/// Dispatches a key event to the handler for the current mode.
pub fn handle_key(key: KeyEvent, state: &mut AppState, bridge: &TriageBridge) -> KeyAction {
    state.flash = None;
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::Normal => handle_normal(key, state, bridge),
        Mode::Search => handle_search(key, state),
        Mode::Insert => handle_insert(key, state, bridge),
        Mode::OpenRun => handle_open_run(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState, bridge: &TriageBridge) -> KeyAction {
    // Keys that work whatever the run's load state.
    match key.code {
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            return KeyAction::Continue;
        }
        KeyCode::Char('o') => {
            state.run_prompt.clear();
            state.mode = Mode::OpenRun;
            return KeyAction::Continue;
        }
        KeyCode::Esc if !state.query.trim().is_empty() => {
            state.set_query(String::new());
            return KeyAction::Continue;
        }
        KeyCode::Char('q') | KeyCode::Esc => return request_quit(state),
        _ => {}
    }

    if state.view != View::Ready {
        return KeyAction::Continue;
    }
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }

    match key.code {
        KeyCode::Tab | KeyCode::Char('H') | KeyCode::Char('L') => {
            state.focus = state.focus.toggle();
        }
        KeyCode::Char('<') => state.shrink_log_panel(),
        KeyCode::Char('>') => state.grow_log_panel(),
        KeyCode::Char('/') => {
            state.focus = PanelFocus::Logs;
            state.mode = Mode::Search;
        }
        KeyCode::Char('i') => {
            state.focus = PanelFocus::Chat;
            state.mode = Mode::Insert;
        }
        KeyCode::Char('a') | KeyCode::Enter if state.focus == PanelFocus::Logs => {
            if let Some(line) = state.selected_line() {
                bridge.send_message(ask_ai_prompt(&line.content));
            }
        }
        KeyCode::Char('y') if state.focus == PanelFocus::Logs => {
            let selected = state.selected_line().map(|l| (l.line_number, l.content.clone()));
            if let Some((number, content)) = selected {
                state.flash = Some(format!("copied line {number}"));
                return KeyAction::Copy(content);
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Quits, or asks first while a chat reply is still pending.
fn request_quit(state: &mut AppState) -> KeyAction {
    if state.is_sending() {
        state.mode = Mode::ConfirmQuit;
        KeyAction::Continue
    } else {
        KeyAction::Quit
    }
}

/// Scroll keys shared by both panels. `None` lets the key fall through.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') | KeyCode::Home => state.scroll_top(),
        KeyCode::Char('G') | KeyCode::End => state.scroll_bottom(),
        KeyCode::Char('d') if ctrl => state.half_page_down(),
        KeyCode::Char('u') if ctrl => state.half_page_up(),
        KeyCode::Char('f') if ctrl => state.full_page_down(),
        KeyCode::PageDown => state.full_page_down(),
        KeyCode::Char('b') if ctrl => state.full_page_up(),
        KeyCode::PageUp => state.full_page_up(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Search mode
// ---------------------------------------------------------------------------

/// Edits the query; the filter follows every keystroke.
fn handle_search(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char(c) => {
            let mut query = std::mem::take(&mut state.query);
            query.push(c);
            state.set_query(query);
        }
        KeyCode::Backspace => {
            let mut query = std::mem::take(&mut state.query);
            query.pop();
            state.set_query(query);
        }
        KeyCode::Enter => state.mode = Mode::Normal,
        KeyCode::Esc => {
            state.set_query(String::new());
            state.mode = Mode::Normal;
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

/// Composes a chat message. Enter is ignored while a reply is pending so the
/// draft is kept rather than rejected by the session.
fn handle_insert(key: KeyEvent, state: &mut AppState, bridge: &TriageBridge) -> KeyAction {
    match key.code {
        KeyCode::Char(c) => state.input.push(c),
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Enter if !state.is_sending() && !state.input.trim().is_empty() => {
            bridge.send_message(std::mem::take(&mut state.input));
        }
        KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// OpenRun mode
// ---------------------------------------------------------------------------

fn handle_open_run(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char(c) if !c.is_whitespace() => state.run_prompt.push(c),
        KeyCode::Backspace => {
            state.run_prompt.pop();
        }
        KeyCode::Enter => {
            state.mode = Mode::Normal;
            let id = std::mem::take(&mut state.run_prompt);
            if !id.is_empty() {
                return KeyAction::OpenRun(id);
            }
        }
        KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// HelpOverlay and ConfirmQuit modes
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') | KeyCode::Up => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Click-to-focus on the panel rects cached by the last render, and wheel
/// scrolling by 3 rows.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let pos = Position { x: mouse.column, y: mouse.row };
            let [logs, chat] = state.panel_rects;
            if logs.width > 0 && logs.contains(pos) {
                state.focus = PanelFocus::Logs;
            } else if chat.width > 0 && chat.contains(pos) {
                state.focus = PanelFocus::Chat;
            }
        }
        MouseEventKind::ScrollUp if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_sub(3);
        }
        MouseEventKind::ScrollDown if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_add(3);
        }
        MouseEventKind::ScrollUp => state.scroll_up(3),
        MouseEventKind::ScrollDown => state.scroll_down(3),
        _ => {}
    }
    KeyAction::Continue
}

//! Central application state for triage.
//!
//! Owns everything scoped to the run being viewed: the fetched chunks, the
//! derived line index, the active search, the chat session, and per-panel
//! scroll state. Switching runs replaces all of it at once, so nothing from a
//! previous run can leak into the next. No rendering logic lives here.

use ratatui::layout::Rect;
use tokio::task::AbortHandle;

use triage_core::error::ApiError;
use triage_core::index::{defaulted_chunk_count, index_chunks};
use triage_core::search::{LineSearch, SubstringSearch};
use triage_core::session::{PendingRequest, RequestTicket};
use triage_core::types::{LogChunk, LogLine, RunDetail};
use triage_core::{ChatSession, SessionAction, SessionEffect};

use crate::bridge::TriageCommand;
use crate::worker::LoadedRun;

/// Which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Editing the log search query.
    Search,
    /// Composing a chat message.
    Insert,
    /// Typing the id of another run to open.
    OpenRun,
    HelpOverlay,
    /// Quit requested while a chat reply is still pending.
    ConfirmQuit,
}

/// Which panel receives scroll and action keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    #[default]
    Logs,
    Chat,
}

impl PanelFocus {
    pub fn toggle(self) -> Self {
        match self {
            PanelFocus::Logs => PanelFocus::Chat,
            PanelFocus::Chat => PanelFocus::Logs,
        }
    }
}

/// Lifecycle of the run being viewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Loading,
    /// Run or logs could not be fetched. Terminal until another run is opened.
    NotFound { reason: String },
    Ready,
}

pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,
    pub view: View,

    pub run_id: String,
    pub run: Option<RunDetail>,
    /// Chunks sorted by `index`, exactly as handed to the indexer.
    pub chunks: Vec<LogChunk>,
    /// Derived from `chunks`; rebuilt whenever they change.
    pub lines: Vec<LogLine>,
    /// Chunks whose line numbers fell back to 1.
    pub defaulted_chunks: usize,

    /// Current log search query (may be blank).
    pub query: String,
    /// Positions in `lines` matching `query`, in order.
    pub visible: Vec<usize>,
    /// Selected row, as an index into `visible`.
    pub log_cursor: usize,
    /// First rendered row, as an index into `visible`.
    pub log_scroll: usize,

    pub session: ChatSession,
    /// Number of newest messages scrolled out below the chat viewport.
    pub chat_scroll: usize,
    /// Chat compose buffer.
    pub input: String,
    /// Buffer for the open-run prompt.
    pub run_prompt: String,
    pub help_scroll: u16,

    /// Inner heights cached after each render for page-wise scrolling.
    pub log_viewport_height: u16,
    pub chat_viewport_height: u16,
    /// Width percentage of the log panel; the chat panel gets the rest.
    pub log_pct: u16,
    /// Outer rects of [logs, chat] from the last render, for mouse hit tests.
    pub panel_rects: [Rect; 2],

    /// One-shot status bar notice, cleared by the next key press.
    pub flash: Option<String>,

    /// Advances while a chat reply is pending; drives the spinner.
    pub spinner_frame: usize,

    pub load_task: Option<AbortHandle>,
    pub chat_task: Option<AbortHandle>,
}

impl AppState {
    /// Creates state for `run_id` in the loading view.
    pub fn new(run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            view: View::Loading,
            session: ChatSession::new(run_id.clone()),
            run_id,
            run: None,
            chunks: Vec::new(),
            lines: Vec::new(),
            defaulted_chunks: 0,
            query: String::new(),
            visible: Vec::new(),
            log_cursor: 0,
            log_scroll: 0,
            chat_scroll: 0,
            input: String::new(),
            run_prompt: String::new(),
            help_scroll: 0,
            log_viewport_height: 0,
            chat_viewport_height: 0,
            log_pct: 60,
            panel_rects: [Rect::default(); 2],
            flash: None,
            spinner_frame: 0,
            load_task: None,
            chat_task: None,
        }
    }

    /// Switches to `run_id`: aborts in-flight work and discards all run state.
    ///
    /// Layout preferences survive the switch; everything scoped to the old run
    /// does not.
    pub fn switch_run(&mut self, run_id: impl Into<String>) {
        if let Some(task) = self.chat_task.take() {
            task.abort();
        }
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        let log_pct = self.log_pct;
        *self = Self::new(run_id);
        self.log_pct = log_pct;
        tracing::info!(run_id = %self.run_id, "opening run");
    }

    /// Applies a finished load. Results for any other run id are dropped.
    pub fn apply_run_loaded(&mut self, run_id: &str, result: Result<LoadedRun, ApiError>) {
        if run_id != self.run_id {
            tracing::debug!(stale = run_id, current = %self.run_id, "dropping stale run load");
            return;
        }
        self.load_task = None;
        match result {
            Ok(LoadedRun { run, mut chunks }) => {
                chunks.sort_by_key(|c| c.index);
                self.set_chunks(chunks);
                self.run = Some(run);
                self.view = View::Ready;
            }
            Err(e) => {
                let reason = if e.is_not_found() { "The run does not exist.".to_owned() } else { e.to_string() };
                self.view = View::NotFound { reason };
            }
        }
    }

    /// Replaces the chunk list and rebuilds everything derived from it.
    pub fn set_chunks(&mut self, chunks: Vec<LogChunk>) {
        self.lines = index_chunks(&chunks);
        self.defaulted_chunks = defaulted_chunk_count(&chunks);
        if self.defaulted_chunks > 0 {
            tracing::warn!(
                run_id = %self.run_id,
                chunks = self.defaulted_chunks,
                "chunks without startLine; numbering from 1"
            );
        }
        self.chunks = chunks;
        self.refilter();
    }

    /// Recomputes `visible` for the current query and resets the cursor.
    pub fn refilter(&mut self) {
        self.visible = SubstringSearch.filter_indices(&self.lines, &self.query);
        self.log_cursor = 0;
        self.log_scroll = 0;
    }

    pub fn set_query(&mut self, query: String) {
        self.query = query;
        self.refilter();
    }

    /// The line under the cursor, if any line is visible.
    pub fn selected_line(&self) -> Option<&LogLine> {
        self.visible.get(self.log_cursor).map(|&i| &self.lines[i])
    }

    /// Runs a bridge command through the session. Returns the request to send.
    pub fn apply_triage_command(&mut self, cmd: TriageCommand) -> Option<PendingRequest> {
        let TriageCommand::SendMessage(text) = cmd;
        let effects = self.session.reduce(SessionAction::Send(text));
        self.apply_effects(effects)
    }

    /// Feeds a chat reply into the session. Stale tickets are ignored there.
    pub fn apply_chat_reply(&mut self, ticket: RequestTicket, outcome: Result<String, ApiError>) {
        let effects = self.session.reduce(SessionAction::Resolve { ticket, outcome });
        if !effects.is_empty() {
            self.chat_task = None;
        }
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Vec<SessionEffect>) -> Option<PendingRequest> {
        let mut dispatch = None;
        for effect in effects {
            match effect {
                SessionEffect::ScrollToLatest => self.chat_scroll = 0,
                SessionEffect::Dispatch(req) => dispatch = Some(req),
            }
        }
        dispatch
    }

    pub fn is_sending(&self) -> bool {
        self.session.is_sending()
    }

    /// Logic tick: advances the pending-reply spinner.
    pub fn tick(&mut self) {
        if self.is_sending() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    /// Scrolls the focused panel down (towards later lines / newer messages).
    pub fn scroll_down(&mut self, rows: usize) {
        match self.focus {
            PanelFocus::Logs => {
                let last = self.visible.len().saturating_sub(1);
                self.log_cursor = (self.log_cursor + rows).min(last);
                self.keep_cursor_visible();
            }
            PanelFocus::Chat => {
                self.chat_scroll = self.chat_scroll.saturating_sub(rows);
            }
        }
    }

    /// Scrolls the focused panel up (towards earlier lines / older messages).
    pub fn scroll_up(&mut self, rows: usize) {
        match self.focus {
            PanelFocus::Logs => {
                self.log_cursor = self.log_cursor.saturating_sub(rows);
                self.keep_cursor_visible();
            }
            PanelFocus::Chat => {
                let max = self.session.messages().len().saturating_sub(1);
                self.chat_scroll = (self.chat_scroll + rows).min(max);
            }
        }
    }

    pub fn scroll_top(&mut self) {
        match self.focus {
            PanelFocus::Logs => {
                self.log_cursor = 0;
                self.keep_cursor_visible();
            }
            PanelFocus::Chat => self.chat_scroll = self.session.messages().len().saturating_sub(1),
        }
    }

    pub fn scroll_bottom(&mut self) {
        match self.focus {
            PanelFocus::Logs => {
                self.log_cursor = self.visible.len().saturating_sub(1);
                self.keep_cursor_visible();
            }
            PanelFocus::Chat => self.chat_scroll = 0,
        }
    }

    /// Page size of the focused panel, from the last rendered viewport.
    fn page(&self) -> usize {
        let rows = match self.focus {
            PanelFocus::Logs => self.log_viewport_height,
            // Chat scrolls by message, not by row; a page is a few messages.
            PanelFocus::Chat => self.chat_viewport_height / 4,
        };
        usize::from(rows).max(1)
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down((self.page() / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.page() / 2).max(1));
    }

    pub fn full_page_down(&mut self) {
        self.scroll_down(self.page());
    }

    pub fn full_page_up(&mut self) {
        self.scroll_up(self.page());
    }

    /// Adjusts `log_scroll` so the cursor row lies inside the viewport.
    pub fn keep_cursor_visible(&mut self) {
        let height = usize::from(self.log_viewport_height).max(1);
        if self.log_cursor < self.log_scroll {
            self.log_scroll = self.log_cursor;
        } else if self.log_cursor >= self.log_scroll + height {
            self.log_scroll = self.log_cursor + 1 - height;
        }
    }

    /// Widens the chat panel by shrinking the log panel (floor 30%).
    pub fn shrink_log_panel(&mut self) {
        self.log_pct = self.log_pct.saturating_sub(5).max(30);
    }

    /// Widens the log panel (ceiling 80%).
    pub fn grow_log_panel(&mut self) {
        self.log_pct = (self.log_pct + 5).min(80);
    }
}

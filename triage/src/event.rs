//! Event bus for triage.
//!
//! Terminal input, timer ticks, background fetch results, and bridge commands
//! are all normalised into [`AppEvent`] and delivered over one tokio unbounded
//! channel. The main loop is the only consumer, so every state transition runs
//! on a single task in arrival order.
//!
//! Two intervals drive the loop: a 33 ms render tick and a 250 ms logic tick
//! (used to animate the "sending" indicator).

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

use triage_core::error::ApiError;
use triage_core::session::RequestTicket;

use crate::bridge::TriageCommand;
use crate::worker::LoadedRun;

/// All events the application can receive from any source.
#[derive(Debug)]
#[non_exhaustive]
pub enum AppEvent {
    /// A key press (`KeyEventKind::Press` only).
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Terminal was resized; the next render picks up the new size.
    Resize,
    /// Logic tick (4 Hz).
    Tick,
    /// Render tick (about 30 FPS).
    Render,
    /// Run detail and log chunks for `run_id` finished loading.
    RunLoaded {
        run_id: String,
        result: Box<Result<LoadedRun, ApiError>>,
    },
    /// A chat request finished; applied only if `ticket` is still in flight.
    ChatReply {
        ticket: RequestTicket,
        outcome: Result<String, ApiError>,
    },
    /// A command from outside the chat panel (see [`crate::bridge`]).
    Triage(TriageCommand),
}

/// Holds the sender and receiver ends of the unified event channel.
pub struct EventHandler {
    /// Cloned into every background task and the bridge.
    pub tx: mpsc::UnboundedSender<AppEvent>,
    /// Owned by the main loop.
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a terminal event onto the bus. Key releases and repeats, focus and
/// paste events are dropped.
fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Resize(_, _) => Some(AppEvent::Resize),
        _ => None,
    }
}

/// Spawns the task that feeds terminal input and timer ticks into the bus.
///
/// Runs until the receiver is dropped. `reader.next().fuse()` keeps
/// `tokio::select!` from polling a finished stream, and only key presses are
/// forwarded because some platforms also report releases.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            let sent = tokio::select! {
                _ = tick_tick => tx.send(AppEvent::Tick),
                _ = render_tick => tx.send(AppEvent::Render),
                maybe_event = crossterm_event => match maybe_event {
                    Some(Ok(event)) => match translate(event) {
                        Some(app_event) => tx.send(app_event),
                        None => Ok(()),
                    },
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "terminal input error");
                        Ok(())
                    }
                    None => Ok(()),
                },
            };
            if sent.is_err() {
                tracing::debug!("event bus closed, input task exiting");
                break;
            }
        }
    });
}

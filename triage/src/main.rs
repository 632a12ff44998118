//! triage: a terminal viewer for failed CI runs.
//!
//! Loads one run's build log from the triage API, lets the user search it,
//! and hosts a chat with the AI copilot about the failure.
//!
//! # Startup sequence
//!
//! 1. Parse flags and load config (file, then env, then flags).
//! 2. Install file logging; config problems are logged, not fatal.
//! 3. `install_panic_hook()` before the terminal is touched.
//! 4. `register_signals()`; the flag is polled on a 50 ms heartbeat.
//! 5. `init_tui()`, spawn the input task, start loading the run.
//!
//! The event loop only leaves via `break`, so `restore_tui()` runs on every
//! non-panic exit path.

mod app;
mod bridge;
mod config;
mod event;
mod logging;
mod theme;
mod tui;
mod ui;
mod worker;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use triage_core::{HttpApi, TriageApi};

use crate::app::AppState;
use crate::bridge::TriageBridge;
use crate::config::{Config, Overrides};
use crate::event::AppEvent;
use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};

/// Inspect a CI run's logs and ask the AI copilot about the failure.
#[derive(Debug, Parser)]
#[command(name = "triage", version, about)]
struct Args {
    /// Id of the run to open.
    run_id: String,

    /// Base URL of the triage API [env: TRIAGE_API_URL]
    #[arg(long)]
    api_url: Option<String>,

    /// Bearer token for the API [env: TRIAGE_TOKEN]
    #[arg(long)]
    token: Option<String>,

    /// Color theme: dark or catppuccin-mocha.
    #[arg(long)]
    theme: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let (config, config_err) = Config::load(Overrides {
        api_url: args.api_url,
        token: args.token,
        theme: args.theme,
    });

    logging::init(&config.log_path())?;
    if let Some(e) = config_err {
        tracing::warn!(error = %e, "ignoring config file");
    }
    tracing::info!(api_url = %config.api_url, run_id = %args.run_id, "starting");

    let api: Arc<dyn TriageApi> = Arc::new(
        HttpApi::new(&config.api_url, config.token.clone()).context("invalid API configuration")?,
    );
    let theme = theme::Theme::from_name(&config.theme);

    tui::install_panic_hook();
    let term_flag = tui::register_signals().context("cannot register signal handlers")?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let tx = handler.tx;
    let mut rx = handler.rx;
    let bridge = TriageBridge::new(tx.clone());

    let mut state = AppState::new(args.run_id);
    state.load_task = Some(worker::spawn_run_load(Arc::clone(&api), state.run_id.clone(), tx.clone()));

    let result = run_loop(&mut terminal, &mut state, &mut rx, &api, &tx, &bridge, &theme, &term_flag).await;

    tui::restore_tui()?;
    result
}

/// Drives state from the event bus until quit, SIGTERM/SIGHUP, or bus close.
#[allow(clippy::too_many_arguments)]
async fn run_loop(
    terminal: &mut tui::Tui,
    state: &mut AppState,
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<AppEvent>,
    api: &Arc<dyn TriageApi>,
    tx: &tokio::sync::mpsc::UnboundedSender<AppEvent>,
    bridge: &TriageBridge,
    theme: &theme::Theme,
    term_flag: &std::sync::atomic::AtomicBool,
) -> anyhow::Result<()> {
    'event_loop: loop {
        tokio::select! {
            // Heartbeat: a quiet terminal would otherwise block in recv() and
            // never observe the signal flag.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {}
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else { break 'event_loop };
                match event {
                    AppEvent::Render => {
                        terminal.draw(|frame| ui::render(frame, state, theme))?;
                    }
                    AppEvent::Key(key) => match handle_key(key, state, bridge) {
                        KeyAction::Continue => {}
                        KeyAction::Quit => break 'event_loop,
                        KeyAction::OpenRun(run_id) => {
                            state.switch_run(run_id);
                            state.load_task = Some(worker::spawn_run_load(
                                Arc::clone(api),
                                state.run_id.clone(),
                                tx.clone(),
                            ));
                        }
                        KeyAction::Copy(text) => {
                            if let Err(e) = tui::copy_to_clipboard(terminal, &text) {
                                tracing::warn!(error = %e, "clipboard write failed");
                                state.flash = Some("copy failed".into());
                            }
                        }
                    },
                    AppEvent::Mouse(mouse) => {
                        handle_mouse(mouse, state);
                    }
                    AppEvent::Resize => {}
                    AppEvent::Tick => state.tick(),
                    AppEvent::RunLoaded { run_id, result } => state.apply_run_loaded(&run_id, *result),
                    AppEvent::Triage(cmd) => {
                        if let Some(request) = state.apply_triage_command(cmd) {
                            state.chat_task =
                                Some(worker::spawn_chat_request(Arc::clone(api), request, tx.clone()));
                        }
                    }
                    AppEvent::ChatReply { ticket, outcome } => state.apply_chat_reply(ticket, outcome),
                }
            }
        }
        if term_flag.load(Ordering::Relaxed) {
            tracing::info!("terminated by signal");
            break 'event_loop;
        }
    }
    Ok(())
}

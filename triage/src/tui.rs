//! Terminal lifecycle management for triage.
//!
//! The UI draws to a buffered stderr so stdout stays free for shell pipelines.
//! Every exit path, including panics, must pass through [`restore_tui`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signal_hook::consts::{SIGHUP, SIGTERM};
use signal_hook::flag::register;
use std::io::{stderr, BufWriter, Stderr, Write};
use std::panic;
use std::sync::{atomic::AtomicBool, Arc};

/// CrosstermBackend over a buffered stderr writer.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

/// Enables raw mode, enters the alternate screen, and captures the mouse.
///
/// # Errors
///
/// Returns `Err` if any terminal control sequence cannot be written.
pub fn init_tui() -> std::io::Result<Tui> {
    let mut out = BufWriter::new(stderr());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(out))
}

/// Undoes [`init_tui`]. Idempotent; ratatui does not restore on drop.
///
/// # Errors
///
/// Returns `Err` if raw mode cannot be disabled or the screen cannot be left.
pub fn restore_tui() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stderr(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Chains a panic hook that restores the terminal and records the panic.
///
/// Install before [`init_tui`] so a panic during startup is still readable.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_tui();
        tracing::error!(panic = %panic_info, "panicked");
        original_hook(panic_info);
    }));
}

/// Returns a flag set when the process receives SIGTERM or SIGHUP.
///
/// The main loop polls it on a heartbeat.
///
/// # Errors
///
/// Returns `Err` if the OS refuses to register either handler.
pub fn register_signals() -> std::io::Result<Arc<AtomicBool>> {
    let term = Arc::new(AtomicBool::new(false));
    register(SIGTERM, Arc::clone(&term))?;
    register(SIGHUP, Arc::clone(&term))?;
    Ok(term)
}

/// OSC 52 request asking the terminal to place `text` on the clipboard.
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

/// Copies `text` to the system clipboard through the terminal.
///
/// Also reaches the local clipboard over SSH. Terminals without OSC 52
/// support drop the sequence silently.
///
/// # Errors
///
/// Returns `Err` if the sequence cannot be written to the terminal.
pub fn copy_to_clipboard(terminal: &mut Tui, text: &str) -> std::io::Result<()> {
    let out = terminal.backend_mut();
    out.write_all(osc52_sequence(text).as_bytes())?;
    out.flush()
}

//! Typed command channel into the chat session.
//!
//! Components outside the chat panel (the log panel's "ask AI" action) hold a
//! [`TriageBridge`] instead of a handle to the session. The bridge can only
//! enqueue a message; it cannot read session state or observe the outcome.
//! The main loop applies the command through the same state machine a typed
//! message goes through.

use tokio::sync::mpsc::UnboundedSender;

use crate::event::AppEvent;

/// Commands accepted from outside the chat panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageCommand {
    SendMessage(String),
}

#[derive(Debug, Clone)]
pub struct TriageBridge {
    tx: UnboundedSender<AppEvent>,
}

impl TriageBridge {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    /// Asks the chat session to send `text`. Fire-and-forget.
    pub fn send_message(&self, text: impl Into<String>) {
        let cmd = TriageCommand::SendMessage(text.into());
        if self.tx.send(AppEvent::Triage(cmd)).is_err() {
            tracing::debug!("bridge used after event bus closed");
        }
    }
}

/// Prompt sent when the user asks about a single log line.
pub fn ask_ai_prompt(line_content: &str) -> String {
    format!("Can you explain this log line?\n\n{line_content}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn send_message_enqueues_a_triage_command() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bridge = TriageBridge::new(tx);

        bridge.send_message("hello");

        match rx.try_recv() {
            Ok(AppEvent::Triage(TriageCommand::SendMessage(text))) => assert_eq!(text, "hello"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn send_after_close_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        TriageBridge::new(tx).send_message("ignored");
    }

    #[test]
    fn prompt_embeds_line_verbatim() {
        assert_eq!(
            ask_ai_prompt("ERROR: timeout"),
            "Can you explain this log line?\n\nERROR: timeout"
        );
    }
}

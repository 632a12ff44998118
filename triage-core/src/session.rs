//! Conversational state machine for a single run's triage session.
//!
//! Every mutation goes through [`ChatSession::reduce`], which takes an action
//! and returns the effects the host must carry out. Because the guard check,
//! the optimistic append, and the history snapshot happen inside one `reduce`
//! call, two sends can never both pass the in-flight guard, and the history
//! always includes the message that triggered it.
//!
//! The session owns no I/O. Hosts perform [`SessionEffect::Dispatch`] and feed
//! the outcome back as [`SessionAction::Resolve`] with the ticket they were
//! given; outcomes carrying any other ticket are discarded as stale.

use uuid::Uuid;

use crate::error::ApiError;
use crate::types::{ChatMessage, ChatRequest, ChatRole, HistoryEntry};

/// Greeting shown as the first message of every session.
pub const WELCOME_MESSAGE: &str =
    "Hello! I'm your AI Copilot. I've analyzed these logs. Ask me anything about the failure!";

/// Fixed reply appended when a chat request fails for any reason.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I encountered an error extracting insights from the logs. Please try again.";

/// Identifies one dispatched chat request within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub session_id: Uuid,
    pub seq: u64,
}

/// A request the host must send to the chat endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub ticket: RequestTicket,
    pub body: ChatRequest,
}

/// Inputs to the session state machine.
#[derive(Debug)]
pub enum SessionAction {
    /// A user (typed or bridged) message.
    Send(String),
    /// The outcome of a previously dispatched request.
    Resolve {
        ticket: RequestTicket,
        outcome: Result<String, ApiError>,
    },
}

/// Work the host must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    Dispatch(PendingRequest),
    /// A message was appended; bring the newest one into view.
    ScrollToLatest,
}

/// Message log plus in-flight state for one run.
#[derive(Debug, Clone)]
pub struct ChatSession {
    session_id: Uuid,
    run_id: String,
    messages: Vec<ChatMessage>,
    in_flight: Option<RequestTicket>,
    next_seq: u64,
}

impl ChatSession {
    /// Starts a fresh session for `run_id`, seeded with the welcome message.
    pub fn new(run_id: impl Into<String>) -> Self {
        let mut welcome = ChatMessage::new(ChatRole::Ai, WELCOME_MESSAGE);
        welcome.id = "welcome".to_owned();
        Self {
            session_id: Uuid::new_v4(),
            run_id: run_id.into(),
            messages: vec![welcome],
            in_flight: None,
            next_seq: 1,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The ticket of the request currently awaiting a reply, if any.
    pub fn in_flight(&self) -> Option<RequestTicket> {
        self.in_flight
    }

    /// Applies one action and returns the resulting effects.
    pub fn reduce(&mut self, action: SessionAction) -> Vec<SessionEffect> {
        match action {
            SessionAction::Send(text) => self.send(&text),
            SessionAction::Resolve { ticket, outcome } => self.resolve(ticket, outcome),
        }
    }

    fn send(&mut self, text: &str) -> Vec<SessionEffect> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if let Some(pending) = self.in_flight {
            tracing::debug!(run_id = %self.run_id, seq = pending.seq, "send rejected: request in flight");
            return Vec::new();
        }

        self.messages.push(ChatMessage::new(ChatRole::User, text));
        let history: Vec<HistoryEntry> = self.messages.iter().map(ChatMessage::to_history).collect();

        let ticket = RequestTicket { session_id: self.session_id, seq: self.next_seq };
        self.next_seq += 1;
        self.in_flight = Some(ticket);

        tracing::debug!(run_id = %self.run_id, seq = ticket.seq, history = history.len(), "dispatching chat request");
        vec![
            SessionEffect::ScrollToLatest,
            SessionEffect::Dispatch(PendingRequest {
                ticket,
                body: ChatRequest {
                    run_id: self.run_id.clone(),
                    message: text.to_owned(),
                    history,
                },
            }),
        ]
    }

    fn resolve(&mut self, ticket: RequestTicket, outcome: Result<String, ApiError>) -> Vec<SessionEffect> {
        if self.in_flight != Some(ticket) {
            tracing::debug!(
                run_id = %self.run_id,
                seq = ticket.seq,
                "discarding stale chat reply"
            );
            return Vec::new();
        }
        self.in_flight = None;

        let reply = match outcome {
            Ok(response) => ChatMessage::new(ChatRole::Ai, response),
            Err(err) => {
                tracing::warn!(run_id = %self.run_id, error = %err, "chat request failed");
                let mut msg = ChatMessage::new(ChatRole::Ai, APOLOGY_MESSAGE);
                msg.is_error = true;
                msg
            }
        };
        self.messages.push(reply);
        vec![SessionEffect::ScrollToLatest]
    }
}

/// Extracts the dispatched request, if any, from a list of effects.
pub fn dispatched(effects: &[SessionEffect]) -> Option<&PendingRequest> {
    effects.iter().find_map(|e| match e {
        SessionEffect::Dispatch(req) => Some(req),
        SessionEffect::ScrollToLatest => None,
    })
}

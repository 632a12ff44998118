//! Integration tests for the chat session state machine driven through a
//! mock chat endpoint.
//!
//! Exercises: blank-send guard, single-flight guard, history snapshotting,
//! failure bubbles, stale replies, and endpoint round-trips whose resolution
//! is controlled by the test.

use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::oneshot;
use triage_core::error::Result;
use triage_core::session::{dispatched, APOLOGY_MESSAGE, WELCOME_MESSAGE};
use triage_core::types::{ChatRequest, ChatRole, HistoryEntry, LogChunk, RunDetail};
use triage_core::{ApiError, ChatSession, SessionAction, SessionEffect, TriageApi};

/// Chat endpoint whose replies are released by the test through oneshots.
struct ControlledApi {
    requests: Mutex<Vec<ChatRequest>>,
    replies: Mutex<Vec<oneshot::Receiver<Result<String>>>>,
}

impl ControlledApi {
    fn new() -> (Self, Vec<oneshot::Sender<Result<String>>>) {
        let (txs, rxs): (Vec<_>, Vec<_>) = (0..4).map(|_| oneshot::channel()).unzip();
        let api = Self { requests: Mutex::new(Vec::new()), replies: Mutex::new(rxs) };
        (api, txs)
    }
}

#[async_trait]
impl TriageApi for ControlledApi {
    async fn fetch_run(&self, run_id: &str) -> Result<RunDetail> {
        Err(ApiError::Status { status: 404, message: format!("no run {run_id}") })
    }

    async fn fetch_logs(&self, _run_id: &str) -> Result<Vec<LogChunk>> {
        Ok(Vec::new())
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        let rx = self.replies.lock().unwrap().remove(0);
        rx.await.unwrap_or_else(|_| Err(ApiError::InvalidUrl("dropped".into())))
    }
}

fn send(session: &mut ChatSession, text: &str) -> Vec<SessionEffect> {
    session.reduce(SessionAction::Send(text.to_owned()))
}

fn contents(session: &ChatSession) -> Vec<(ChatRole, &str)> {
    session.messages().iter().map(|m| (m.role, m.content.as_str())).collect()
}

#[test]
fn blank_sends_are_no_ops() {
    let mut session = ChatSession::new("42");
    for text in ["", "   ", "\n\t"] {
        assert!(send(&mut session, text).is_empty());
    }
    assert_eq!(session.messages().len(), 1);
    assert!(!session.is_sending());
}

#[test]
fn second_send_is_rejected_until_first_resolves() {
    let mut session = ChatSession::new("42");

    let first = send(&mut session, "a");
    let ticket = dispatched(&first).expect("first send dispatches").ticket;
    assert!(session.is_sending());

    assert!(send(&mut session, "b").is_empty(), "second send must not dispatch");
    assert_eq!(
        contents(&session),
        vec![(ChatRole::Ai, WELCOME_MESSAGE), (ChatRole::User, "a")]
    );

    let effects = session.reduce(SessionAction::Resolve { ticket, outcome: Ok("answer".into()) });
    assert_eq!(effects, vec![SessionEffect::ScrollToLatest]);
    assert!(!session.is_sending());

    assert!(dispatched(&send(&mut session, "b")).is_some());
    assert_eq!(session.messages().len(), 4);
}

#[test]
fn history_includes_the_message_being_sent() {
    let mut session = ChatSession::new("42");

    let first = send(&mut session, "hi");
    let first_req = &dispatched(&first).unwrap().body;
    assert_eq!(
        first_req.history,
        vec![
            HistoryEntry { role: ChatRole::Ai, content: WELCOME_MESSAGE.into() },
            HistoryEntry { role: ChatRole::User, content: "hi".into() },
        ]
    );
    let ticket = dispatched(&first).unwrap().ticket;
    session.reduce(SessionAction::Resolve { ticket, outcome: Ok("hello".into()) });

    let effects = send(&mut session, "how?");
    let req = &dispatched(&effects).unwrap().body;
    assert_eq!(req.run_id, "42");
    assert_eq!(req.message, "how?");
    assert_eq!(
        req.history,
        vec![
            HistoryEntry { role: ChatRole::Ai, content: WELCOME_MESSAGE.into() },
            HistoryEntry { role: ChatRole::User, content: "hi".into() },
            HistoryEntry { role: ChatRole::Ai, content: "hello".into() },
            HistoryEntry { role: ChatRole::User, content: "how?".into() },
        ]
    );
}

#[test]
fn failure_appends_one_apology_and_returns_to_idle() {
    let mut session = ChatSession::new("42");
    let ticket = dispatched(&send(&mut session, "why?")).unwrap().ticket;

    session.reduce(SessionAction::Resolve {
        ticket,
        outcome: Err(ApiError::Status { status: 500, message: "HTTP 500".into() }),
    });

    assert!(!session.is_sending());
    let errors: Vec<_> = session.messages().iter().filter(|m| m.is_error).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].role, ChatRole::Ai);
    assert_eq!(errors[0].content, APOLOGY_MESSAGE);
    assert_eq!(session.messages().len(), 3);

    assert!(dispatched(&send(&mut session, "retry")).is_some(), "session stays usable");
}

#[test]
fn stale_replies_are_discarded() {
    let mut old = ChatSession::new("42");
    let stale = dispatched(&send(&mut old, "a")).unwrap().ticket;

    let mut session = ChatSession::new("42");
    let live = dispatched(&send(&mut session, "b")).unwrap().ticket;
    assert_eq!(stale.seq, live.seq, "same seq, different session");

    let effects = session.reduce(SessionAction::Resolve { ticket: stale, outcome: Ok("late".into()) });
    assert!(effects.is_empty());
    assert!(session.is_sending());
    assert_eq!(session.messages().len(), 2);

    session.reduce(SessionAction::Resolve { ticket: live, outcome: Ok("fresh".into()) });
    assert_eq!(session.messages().last().unwrap().content, "fresh");

    // A duplicate delivery of an already-applied ticket is also stale.
    assert!(session
        .reduce(SessionAction::Resolve { ticket: live, outcome: Ok("again".into()) })
        .is_empty());
    assert_eq!(session.messages().len(), 3);
}

#[tokio::test]
async fn controlled_endpoint_resolves_only_when_released() {
    let (api, mut releases) = ControlledApi::new();
    let api = std::sync::Arc::new(api);
    let mut session = ChatSession::new("42");

    let pending = dispatched(&send(&mut session, "a")).unwrap().clone();
    let task = {
        let api = api.clone();
        let body = pending.body.clone();
        tokio::spawn(async move { api.send_chat(&body).await })
    };

    // While the reply is held back, further sends are rejected.
    tokio::task::yield_now().await;
    assert!(send(&mut session, "b").is_empty());
    assert!(!task.is_finished());

    releases.remove(0).send(Ok("because".into())).unwrap();
    let outcome = task.await.unwrap();
    session.reduce(SessionAction::Resolve { ticket: pending.ticket, outcome });

    assert_eq!(session.messages().last().unwrap().content, "because");
    let requests = api.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].message, "a");
}

#[tokio::test]
async fn rejected_endpoint_produces_error_bubble() {
    let (api, mut releases) = ControlledApi::new();
    let mut session = ChatSession::new("42");
    let pending = dispatched(&send(&mut session, "a")).unwrap().clone();

    releases
        .remove(0)
        .send(Err(ApiError::Status { status: 502, message: "HTTP 502".into() }))
        .unwrap();
    let outcome = api.send_chat(&pending.body).await;
    session.reduce(SessionAction::Resolve { ticket: pending.ticket, outcome });

    let last = session.messages().last().unwrap();
    assert!(last.is_error);
    assert_eq!(last.content, APOLOGY_MESSAGE);
    assert!(!session.is_sending());
}

//! Background I/O tasks.
//!
//! Each request runs on its own tokio task and reports back through the event
//! bus, so the main loop never awaits the network. Tasks are tagged with what
//! they were started for (run id or chat ticket); the loop drops results that
//! no longer match current state.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;

use triage_core::error::ApiError;
use triage_core::session::PendingRequest;
use triage_core::types::{LogChunk, RunDetail};
use triage_core::TriageApi;

use crate::event::AppEvent;

/// Everything the view needs to leave the loading state.
#[derive(Debug, Clone)]
pub struct LoadedRun {
    pub run: RunDetail,
    pub chunks: Vec<LogChunk>,
}

/// Fetches the run detail and its log chunks concurrently.
///
/// Either failure fails the whole load; the view then shows "not found".
pub async fn load_run(api: &dyn TriageApi, run_id: &str) -> Result<LoadedRun, ApiError> {
    let (run, chunks) = tokio::try_join!(api.fetch_run(run_id), api.fetch_logs(run_id))?;
    Ok(LoadedRun { run, chunks })
}

/// Spawns [`load_run`] and posts `AppEvent::RunLoaded` when it completes.
pub fn spawn_run_load(
    api: Arc<dyn TriageApi>,
    run_id: String,
    tx: UnboundedSender<AppEvent>,
) -> AbortHandle {
    tokio::spawn(async move {
        let result = load_run(api.as_ref(), &run_id).await;
        match &result {
            Ok(loaded) => tracing::info!(%run_id, chunks = loaded.chunks.len(), "run loaded"),
            Err(e) => tracing::warn!(%run_id, error = %e, "failed to load run"),
        }
        let _ = tx.send(AppEvent::RunLoaded { run_id, result: Box::new(result) });
    })
    .abort_handle()
}

/// Sends one chat request and posts `AppEvent::ChatReply` with its ticket.
///
/// Aborting the returned handle drops the request; no reply is posted.
pub fn spawn_chat_request(
    api: Arc<dyn TriageApi>,
    request: PendingRequest,
    tx: UnboundedSender<AppEvent>,
) -> AbortHandle {
    tokio::spawn(async move {
        let outcome = api.send_chat(&request.body).await;
        let _ = tx.send(AppEvent::ChatReply { ticket: request.ticket, outcome });
    })
    .abort_handle()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::{mpsc, oneshot};
    use triage_core::error::Result;
    use triage_core::types::{ChatRequest, RepoRef};
    use triage_core::{ChatSession, SessionAction};

    struct StubApi {
        run: Option<RunDetail>,
        chat: Mutex<Option<oneshot::Receiver<Result<String>>>>,
    }

    fn run_42() -> RunDetail {
        RunDetail {
            id: "42".into(),
            workflow_name: "CI".into(),
            status: "failure".into(),
            branch: "main".into(),
            commit_sha: "abcdef0123".into(),
            repo: RepoRef { full_name: "acme/app".into() },
            analysis: None,
        }
    }

    #[async_trait]
    impl TriageApi for StubApi {
        async fn fetch_run(&self, _run_id: &str) -> Result<RunDetail> {
            self.run.clone().ok_or(ApiError::Status { status: 404, message: "HTTP 404".into() })
        }

        async fn fetch_logs(&self, _run_id: &str) -> Result<Vec<LogChunk>> {
            Ok(Vec::new())
        }

        async fn send_chat(&self, _request: &ChatRequest) -> Result<String> {
            let rx = self.chat.lock().unwrap().take().expect("one chat request");
            rx.await.unwrap_or_else(|_| Err(ApiError::InvalidUrl("dropped".into())))
        }
    }

    #[tokio::test]
    async fn load_failure_on_either_request_fails_the_load() {
        let api = StubApi { run: None, chat: Mutex::new(None) };
        let err = load_run(&api, "42").await.unwrap_err();
        assert!(err.is_not_found());

        let api = StubApi { run: Some(run_42()), chat: Mutex::new(None) };
        let loaded = load_run(&api, "42").await.unwrap();
        assert_eq!(loaded.run.id, "42");
    }

    #[tokio::test]
    async fn chat_reply_is_posted_with_its_ticket_once_released() {
        let (release, rx_reply) = oneshot::channel();
        let api: Arc<dyn TriageApi> =
            Arc::new(StubApi { run: None, chat: Mutex::new(Some(rx_reply)) });
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut session = ChatSession::new("42");
        let effects = session.reduce(SessionAction::Send("why?".into()));
        let pending = triage_core::session::dispatched(&effects).unwrap().clone();
        let ticket = pending.ticket;
        spawn_chat_request(api, pending, tx);

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err(), "no reply before release");

        release.send(Ok("because".into())).unwrap();
        match rx.recv().await {
            Some(AppEvent::ChatReply { ticket: got, outcome }) => {
                assert_eq!(got, ticket);
                assert_eq!(outcome.unwrap(), "because");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn aborted_chat_request_posts_nothing() {
        let (_release, rx_reply) = oneshot::channel();
        let api: Arc<dyn TriageApi> =
            Arc::new(StubApi { run: None, chat: Mutex::new(Some(rx_reply)) });
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut session = ChatSession::new("42");
        let effects = session.reduce(SessionAction::Send("why?".into()));
        let pending = triage_core::session::dispatched(&effects).unwrap().clone();
        let handle = spawn_chat_request(api, pending, tx);

        tokio::task::yield_now().await;
        handle.abort();
        assert!(rx.recv().await.is_none(), "sender dropped without posting");
    }
}

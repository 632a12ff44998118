//! REST client for the run, log and chat endpoints.
//!
//! [`TriageApi`] is the seam the UI depends on; [`HttpApi`] is the reqwest
//! implementation. Tests substitute their own implementation to control when
//! and how requests resolve.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, Result};
use crate::types::{ChatReply, ChatRequest, LogChunk, LogsEnvelope, RunDetail};

/// The three endpoints the triage view consumes.
#[async_trait]
pub trait TriageApi: Send + Sync {
    /// `GET /api/runs/{id}`
    async fn fetch_run(&self, run_id: &str) -> Result<RunDetail>;

    /// `GET /api/runs/{id}/logs`
    async fn fetch_logs(&self, run_id: &str) -> Result<Vec<LogChunk>>;

    /// `POST /api/chat`, returning the assistant's `response` text.
    async fn send_chat(&self, request: &ChatRequest) -> Result<String>;
}

/// Upper bound on one request, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// JSON-over-HTTP client with optional bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpApi {
    /// Creates a client rooted at `base_url` (e.g. `http://localhost:3001`)
    /// with the default [`REQUEST_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if `base_url` is not an http(s) URL, or
    /// `ApiError::Transport` if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        Self::with_timeout(base_url, token, REQUEST_TIMEOUT)
    }

    /// Like [`HttpApi::new`] with an explicit per-request timeout.
    pub fn with_timeout(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let invalid = || ApiError::InvalidUrl(base_url.to_owned());
        let parsed = Url::parse(base_url.trim_end_matches('/')).map_err(|_| invalid())?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(invalid());
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: parsed, token: token.filter(|t| !t.is_empty()) })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends `segments` to the base path, percent-encoding each one, so a
    /// run id can never inject `/`, `?` or `#` into the request.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header(header::CONTENT_TYPE, "application/json");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(%url, "GET");
        let res = self.authorize(self.client.get(url)).send().await?;
        decode(res).await
    }
}

#[async_trait]
impl TriageApi for HttpApi {
    async fn fetch_run(&self, run_id: &str) -> Result<RunDetail> {
        self.get_json(self.endpoint(&["api", "runs", run_id])).await
    }

    async fn fetch_logs(&self, run_id: &str) -> Result<Vec<LogChunk>> {
        let envelope: LogsEnvelope = self.get_json(self.endpoint(&["api", "runs", run_id, "logs"])).await?;
        Ok(envelope.chunks)
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<String> {
        let url = self.endpoint(&["api", "chat"]);
        tracing::debug!(%url, history = request.history.len(), "POST");
        let res = self.authorize(self.client.post(url)).json(request).send().await?;
        let reply: ChatReply = decode(res).await?;
        Ok(reply.response)
    }
}

/// Turns a response into `T`, mapping non-2xx statuses to `ApiError::Status`.
async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(status.as_u16(), &body),
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// Extracts a human-readable message from an error body.
///
/// Prefers the body's `message` field, then `error`, then `HTTP <status>`.
pub fn error_message(status: u16, body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).filter(|m| !m.is_empty()))
        })
        .map(str::to_owned)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

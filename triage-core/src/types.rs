//! Wire and view types shared by the triage client.
//!
//! The REST payloads use camelCase JSON; every struct here maps it onto
//! snake_case fields via serde. Optional or partially-trusted fields default
//! instead of failing the whole payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One named, ordered segment of a run's build log.
///
/// `index` is unique per run and defines chunk ordering. `start_line` is the
/// 1-based number of the chunk's first line in the full log; it may be absent,
/// null, or non-positive, in which case the indexer numbers from 1.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogChunk {
    pub id: i64,
    pub index: i64,
    #[serde(default)]
    pub step_name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub has_errors: bool,
    #[serde(default)]
    pub start_line: Option<i64>,
}

/// One addressable line of the flattened log.
///
/// Derived from a [`LogChunk`]; never persisted. `is_error` is inherited from
/// the owning chunk. `number_defaulted` is set when the chunk carried no
/// usable `startLine` and numbering fell back to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub chunk_id: i64,
    pub step_name: String,
    pub line_number: u64,
    pub content: String,
    pub is_error: bool,
    pub number_defaulted: bool,
}

/// Repository reference embedded in a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoRef {
    pub full_name: String,
}

/// Static AI analysis attached to a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[serde(default)]
    pub root_cause: String,
    #[serde(default)]
    pub suggested_fix: String,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub failure_type: String,
}

/// Response of `GET /api/runs/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDetail {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub workflow_name: String,
    pub status: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub commit_sha: String,
    pub repo: RepoRef,
    #[serde(default)]
    pub analysis: Option<Analysis>,
}

impl RunDetail {
    /// First seven characters of the commit sha, as shown in run headers.
    pub fn short_sha(&self) -> &str {
        match self.commit_sha.char_indices().nth(7) {
            Some((idx, _)) => &self.commit_sha[..idx],
            None => &self.commit_sha,
        }
    }

    /// True when the run concluded with a failure status.
    pub fn is_failure(&self) -> bool {
        self.status.eq_ignore_ascii_case("failure")
    }
}

/// Response of `GET /api/runs/{id}/logs`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsEnvelope {
    #[serde(default)]
    pub chunks: Vec<LogChunk>,
}

/// Author of a chat message. Serialized as `"user"` / `"ai"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

/// A message in a triage conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Time-ordered identifier (UUIDv7 text; `"welcome"` for the greeting).
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_error: bool,
}

impl ChatMessage {
    /// Builds a message stamped with the current time and a fresh UUIDv7 id.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    /// Reduces the message to the `{role, content}` pair sent as history.
    pub fn to_history(&self) -> HistoryEntry {
        HistoryEntry { role: self.role, content: self.content.clone() }
    }
}

/// One prior conversation turn as sent to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub run_id: String,
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// Accepts a run id encoded either as a JSON string or a JSON number.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

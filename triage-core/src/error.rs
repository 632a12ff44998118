use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Failures talking to the dashboard REST API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// True for a 404, which the view reports as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

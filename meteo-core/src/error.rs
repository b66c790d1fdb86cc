use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Why a single geocoding or weather call did not yield a value.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("No place matched the query")]
    NotFound,
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Malformed response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Lookup timed out")]
    Timeout,
    #[error("Lookup was superseded by a newer one")]
    Cancelled,
}

impl LookupError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LookupError::NotFound => FailureKind::NotFound,
            LookupError::Transport(e) if e.is_timeout() => FailureKind::Timeout,
            LookupError::Transport(_) | LookupError::Status { .. } => FailureKind::Transport,
            LookupError::Parse(_) => FailureKind::Parse,
            LookupError::Timeout => FailureKind::Timeout,
            LookupError::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// Failure category carried by a failed resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    NotFound,
    Transport,
    Parse,
    Timeout,
    Cancelled,
}

/// A failed resolution as shown to the user: a fixed message plus its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use translator_core::JobStatus;

use crate::PersistError;

#[derive(Debug)]
pub enum EngineEvent {
    Uploaded(Result<String, ApiError>),
    TranslationStarted(Result<String, ApiError>),
    StatusPolled {
        seq: u64,
        result: Result<JobStatus, ApiError>,
    },
    PreviewFetched(Result<String, ApiError>),
    Downloaded(Result<PathBuf, DownloadError>),
    /// The poll timer fired.
    PollTick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub bytes: bytes::Bytes,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
    /// Human-readable reason from the server's error body, when it sent one.
    pub detail: Option<String>,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }

    /// Reason to show the user. A rejected request yields the server's detail
    /// (none if it sent none) and transport failures describe themselves.
    /// Malformed replies and local setup errors yield none, leaving the
    /// caller's generic message in place.
    pub fn reason(&self) -> Option<String> {
        match self.kind {
            FailureKind::HttpStatus(_) => self.detail.clone(),
            FailureKind::Timeout | FailureKind::Network => Some(self.to_string()),
            FailureKind::InvalidUrl | FailureKind::Decode | FailureKind::TooLarge { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    TooLarge { max_bytes: u64, actual: Option<u64> },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub file_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartTranslationBody<'a> {
    pub file_id: &'a str,
    pub provider: &'a str,
    pub api_key: &'a str,
    pub model: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskCreated {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

/// Extracts the `detail` field of an error body. Strings are used verbatim;
/// structured details (validation error lists) are rendered as compact JSON.
pub(crate) fn parse_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_verbatim() {
        assert_eq!(parse_detail(br#"{"detail":"too large"}"#), Some("too large".into()));
    }

    #[test]
    fn structured_detail_is_compact_json() {
        let body = br#"{"detail":[{"loc":["body","file_id"],"msg":"field required"}]}"#;
        assert_eq!(
            parse_detail(body),
            Some(r#"[{"loc":["body","file_id"],"msg":"field required"}]"#.into())
        );
    }

    #[test]
    fn missing_or_non_json_detail_is_none() {
        assert_eq!(parse_detail(br#"{"error":"x"}"#), None);
        assert_eq!(parse_detail(br#"{"detail":null}"#), None);
        assert_eq!(parse_detail(b"<html>502</html>"), None);
    }

    #[test]
    fn reason_prefers_detail_for_rejections() {
        let rejected = ApiError::new(FailureKind::HttpStatus(400), "400 Bad Request")
            .with_detail(Some("unsupported type".into()));
        assert_eq!(rejected.reason(), Some("unsupported type".into()));

        let bare = ApiError::new(FailureKind::HttpStatus(500), "500");
        assert_eq!(bare.reason(), None);

        let network = ApiError::new(FailureKind::Network, "connection refused");
        assert_eq!(network.reason(), Some("network error: connection refused".into()));
    }

    #[test]
    fn malformed_reply_has_no_reason() {
        let decode = ApiError::new(FailureKind::Decode, "error decoding response body");
        assert_eq!(decode.reason(), None);

        let too_large = ApiError::new(
            FailureKind::TooLarge {
                max_bytes: 10,
                actual: Some(11),
            },
            "artifact too large",
        );
        assert_eq!(too_large.reason(), None);
    }
}

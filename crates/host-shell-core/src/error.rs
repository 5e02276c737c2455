use serde::{Deserialize, Serialize};

use crate::registry::ApplicationId;

pub const UNKNOWN_AUTH_ERROR_MESSAGE: &str = "unknown authentication error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Network,
    Decode,
    Service,
    Unknown,
}

impl HostErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Network => "network",
            Self::Decode => "decode",
            Self::Service => "service",
            Self::Unknown => "unknown",
        }
    }
}

/// Failure talking to the application backend.
///
/// `Display` renders only the human-readable message so it can be shown
/// as-is; `describe` carries the diagnostic fields for logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostApiError {
    pub status_code: u16,
    pub code: Option<String>,
    pub message: String,
    pub kind: HostErrorKind,
}

impl HostApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status_code: 401,
            code: Some("unauthorized".to_string()),
            message: message.into(),
            kind: HostErrorKind::Unauthorized,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status_code: 0,
            code: Some("network_error".to_string()),
            message: message.into(),
            kind: HostErrorKind::Network,
        }
    }

    pub fn decode(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            code: Some("decode_failed".to_string()),
            message: message.into(),
            kind: HostErrorKind::Decode,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status_code == 401
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match &self.code {
            Some(code) => format!(
                "{} ({code}, status={}, kind={})",
                self.message,
                self.status_code,
                self.kind.as_str()
            ),
            None => format!(
                "{} (status={}, kind={})",
                self.message,
                self.status_code,
                self.kind.as_str()
            ),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[must_use]
pub fn classify_http_status(status_code: u16) -> HostErrorKind {
    match status_code {
        0 => HostErrorKind::Network,
        401 => HostErrorKind::Unauthorized,
        403 => HostErrorKind::Forbidden,
        404 => HostErrorKind::NotFound,
        500..=599 => HostErrorKind::Service,
        _ => HostErrorKind::Unknown,
    }
}

/// Builds the error for a non-2xx response, preferring the server's own
/// message over a generic status line.
#[must_use]
pub fn error_from_response(status_code: u16, raw_body: &str) -> HostApiError {
    let parsed: ApiErrorBody = serde_json::from_str(raw_body).unwrap_or_default();
    let code = parsed.error.as_ref().and_then(|detail| detail.code.clone());
    let message = parsed
        .message
        .filter(|message| !message.trim().is_empty())
        .or_else(|| parsed.error.and_then(|detail| detail.message))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("request failed with status {status_code}"));
    HostApiError {
        status_code,
        code,
        message,
        kind: classify_http_status(status_code),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenStoreError {
    #[error("durable storage is unavailable")]
    Unavailable,
    #[error("failed to read session token: {0}")]
    Read(String),
    #[error("failed to write session token: {0}")]
    Write(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStage {
    Download,
    Render,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RemoteLoadError {
    pub stage: LoadStage,
    pub message: String,
}

impl RemoteLoadError {
    pub fn download(message: impl Into<String>) -> Self {
        Self {
            stage: LoadStage::Download,
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self {
            stage: LoadStage::Render,
            message: message.into(),
        }
    }
}

/// User-visible failures. Missing sessions, unmatched paths and inactive
/// applications are states of the shell, not errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShellError {
    #[error("authentication error: {0}")]
    AuthFailure(String),
    #[error("failed to load applications: {0}")]
    FetchFailure(String),
    #[error("application {application_id} failed to load: {message}")]
    RemoteLoadFailure {
        application_id: ApplicationId,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins_over_status_line() {
        let error = error_from_response(503, r#"{"message":"registry is down"}"#);
        assert_eq!(error.message, "registry is down");
        assert_eq!(error.kind, HostErrorKind::Service);
        assert!(!error.is_unauthorized());
    }

    #[test]
    fn nested_error_detail_is_used_when_top_level_message_missing() {
        let error = error_from_response(
            403,
            r#"{"error":{"code":"forbidden","message":"role lacks access"}}"#,
        );
        assert_eq!(error.message, "role lacks access");
        assert_eq!(error.code.as_deref(), Some("forbidden"));
        assert_eq!(error.kind, HostErrorKind::Forbidden);
    }

    #[test]
    fn unparseable_body_falls_back_to_status_line() {
        let error = error_from_response(401, "<html>nope</html>");
        assert_eq!(error.message, "request failed with status 401");
        assert!(error.is_unauthorized());
    }

    #[test]
    fn display_is_message_only() {
        let error = HostApiError::network("connection refused");
        assert_eq!(error.to_string(), "connection refused");
        assert!(error.describe().contains("kind=network"));
    }
}

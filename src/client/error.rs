//! Error taxonomy for calls against the REST API.
//!
//! Every failure is classified into one [`ErrorKind`] so callers can pick
//! a presentation: inline retry for network trouble, the server's message
//! for validation failures, a login redirect for authorization failures,
//! and a generic recoverable screen for everything else.

use thiserror::Error;

/// Coarse classification used for user-facing handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or timeout.
    Network,
    /// The API rejected the request (4xx other than 401/403).
    Validation,
    /// Missing or rejected credentials (401/403).
    Authorization,
    /// Server errors, undecodable payloads and anything unforeseen.
    Unexpected,
}

/// Errors that can occur while talking to the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failed to connect or transfer
    #[error("Connection to '{url}' failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request exceeded total timeout
    #[error("Request to '{url}' timed out after {duration}s")]
    Timeout { url: String, duration: u64 },

    /// API refused the request with a message payload
    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// 401 or 403
    #[error("Not authorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// 5xx and other unclassified statuses
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Payload did not match the expected envelope
    #[error("Failed to decode '{resource}' response: {source}")]
    Decode {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    /// A scoped resource was requested without its parent id
    #[error("'{resource}' requires '{field}' to be set")]
    MissingScope { resource: String, field: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// Build an error from a non-success HTTP status and its body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| default_message(status));
        match status {
            401 | 403 => ApiError::Unauthorized { status, message },
            400..=499 => ApiError::Validation { status, message },
            _ => ApiError::Server { status, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Connection { .. } | ApiError::Timeout { .. } => ErrorKind::Network,
            ApiError::Validation { .. } | ApiError::MissingScope { .. } => ErrorKind::Validation,
            ApiError::Unauthorized { .. } => ErrorKind::Authorization,
            ApiError::Server { .. } | ApiError::Decode { .. } | ApiError::Unexpected(_) => {
                ErrorKind::Unexpected
            }
        }
    }

    /// HTTP status when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { status, .. }
            | ApiError::Unauthorized { status, .. }
            | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the local session should be dropped and the user sent
    /// back through the login flow.
    pub fn requires_reauth(&self) -> bool {
        self.kind() == ErrorKind::Authorization
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"message": "..."}`, `{"message": ["...", "..."]}` and
/// `{"error": "..."}`; falls back to the trimmed body text.
fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let field = json.get("message").or_else(|| json.get("error"));
        match field {
            Some(serde_json::Value::String(msg)) => return Some(msg.clone()),
            Some(serde_json::Value::Array(items)) => {
                let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
                if !parts.is_empty() {
                    return Some(parts.join("; "));
                }
            }
            _ => {}
        }
    }

    Some(body.chars().take(200).collect())
}

fn default_message(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("request failed")
        .to_string()
}

/// Cloneable snapshot of an [`ApiError`] for storing in UI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl From<&ApiError> for ListError {
    fn from(err: &ApiError) -> Self {
        Self {
            kind: err.kind(),
            status: err.status(),
            message: err.to_string(),
        }
    }
}

// Error type shared by the configuration store, resolver, session and API
// client. Front-ends match on it to decide how to phrase a failure.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Every configured server failed the liveness probe (or none are configured).
    #[error("no training server available (tried: {})", display_list(.tried))]
    NoServerAvailable { tried: Vec<String> },

    #[error("server index {index} is out of range ({len} servers configured)")]
    ServerIndexOutOfRange { index: usize, len: usize },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Connection, timeout or other failure before a status line was received.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("not found: {url} {body}")]
    NotFound { url: String, body: String },

    #[error("authentication rejected ({status}): {body}")]
    Auth { status: StatusCode, body: String },

    #[error("request failed ({status}): {body}")]
    Http { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(reqwest::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid configuration in {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("could not parse {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Classify a non-success response. 404 and 401/403 get their own
    /// variants so callers can react without inspecting status codes.
    pub fn from_status(status: StatusCode, url: String, body: String) -> Self {
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound { url, body },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth { status, body },
            _ => ClientError::Http { status, body },
        }
    }
}

fn display_list(items: &[String]) -> String {
    if items.is_empty() {
        "none configured".into()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        let err = ClientError::from_status(StatusCode::NOT_FOUND, "http://x/a".into(), "".into());
        assert!(matches!(err, ClientError::NotFound { .. }));

        let err = ClientError::from_status(StatusCode::FORBIDDEN, "http://x/a".into(), "".into());
        assert!(matches!(err, ClientError::Auth { .. }));

        let err = ClientError::from_status(StatusCode::BAD_GATEWAY, "http://x/a".into(), "down".into());
        assert_eq!(err.to_string(), "request failed (502 Bad Gateway): down");
    }

    #[test]
    fn no_server_message_lists_candidates() {
        let err = ClientError::NoServerAvailable { tried: vec![] };
        assert_eq!(err.to_string(), "no training server available (tried: none configured)");

        let err = ClientError::NoServerAvailable {
            tried: vec!["http://a".into(), "http://b".into()],
        };
        assert!(err.to_string().ends_with("(tried: http://a, http://b)"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(ClientError::from(io_err), ClientError::Io(_)));
    }
}

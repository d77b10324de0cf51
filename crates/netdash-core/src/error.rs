use thiserror::Error;

/// Errors surfaced by the dashboard engine to its callers.
///
/// Wire errors from `netdash-api` are mapped into these variants with
/// user-readable messages; the CLI attaches diagnostics on top.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    // ── Submission ───────────────────────────────────────────────────
    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("Submission rejected: {message}")]
    SubmissionRejected { message: String },

    // ── Setup ────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<netdash_api::Error> for CoreError {
    fn from(err: netdash_api::Error) -> Self {
        use netdash_api::Error as Api;
        match err {
            Api::Transport(ref e) => Self::ConnectionFailed {
                url: e.url().map_or_else(String::new, ToString::to_string),
                reason: err.to_string(),
            },
            Api::WebSocketConnect(reason) => Self::ConnectionFailed {
                url: String::new(),
                reason,
            },
            Api::Tls(message) => Self::Config {
                message: format!("TLS: {message}"),
            },
            Api::InvalidUrl(e) => Self::Config {
                message: format!("invalid URL: {e}"),
            },
            Api::Rejected { status, message } => Self::SubmissionRejected {
                message: message.unwrap_or_else(|| format!("HTTP {status}")),
            },
            other => Self::Internal(other.to_string()),
        }
    }
}

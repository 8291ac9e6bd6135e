//! Error types for ytdlp-client
//!
//! Every failure a download session can hit maps onto one variant here:
//! - local input problems that never reach the network (`Validation`, `Busy`)
//! - endpoint failures (`Submission`, `Stream`, `NotFound`, `LogFetch`)
//! - controller plumbing (`Cancelled`, `ControllerClosed`, `Config`)
//!
//! Only `LogFetch` is non-fatal for a session; all the others end the attempt.

use thiserror::Error;

/// Result type alias for ytdlp-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message surfaced when an endpoint answers with a non-2xx status
pub const RESPONSE_NOT_OK: &str = "Network response was not ok";

/// Main error type for ytdlp-client
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied input that cannot be submitted
    #[error("validation error: {0}")]
    Validation(String),

    /// A session is already in flight; `start` is rejected until it ends
    #[error("a download is already in progress")]
    Busy,

    /// The Submission Endpoint rejected the request or was unreachable
    #[error("submission failed: {0}")]
    Submission(String),

    /// The progress stream failed at the transport or framing level
    #[error("progress stream error: {0}")]
    Stream(String),

    /// The backend does not know the session identifier
    #[error("download not found: {0}")]
    NotFound(String),

    /// The Log Endpoint failed
    #[error("log fetch failed: {0}")]
    LogFetch(String),

    /// The pending operation was abandoned because the session was reset
    #[error("operation cancelled by reset")]
    Cancelled,

    /// The controller task is no longer running
    #[error("session controller is not running")]
    ControllerClosed,

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Text suitable for the session's single user-facing error slot.
    ///
    /// Transport-level detail (reqwest and serde messages) is kept as-is so the
    /// user sees why a submission failed, mirroring what a browser client shows.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::Busy => "A download is already in progress".to_string(),
            Error::Submission(detail) => format!("Error starting download: {detail}"),
            Error::Stream(_) => "Error in progress stream".to_string(),
            Error::NotFound(_) => "Download not found".to_string(),
            Error::LogFetch(detail) => format!("Error fetching logs: {detail}"),
            Error::Cancelled => "Download was reset".to_string(),
            Error::ControllerClosed => "Session controller is not running".to_string(),
            Error::Config { message, .. } => message.clone(),
            Error::Network(e) => e.to_string(),
            Error::Url(e) => e.to_string(),
        }
    }

    /// Detail string without the variant prefix, used when one failure is
    /// re-wrapped as another (e.g. a network error inside a submission).
    pub(crate) fn detail(&self) -> String {
        match self {
            Error::Validation(d)
            | Error::Submission(d)
            | Error::Stream(d)
            | Error::NotFound(d)
            | Error::LogFetch(d) => d.clone(),
            other => other.to_string(),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_message_matches_user_facing_format() {
        let err = Error::Submission(RESPONSE_NOT_OK.to_string());
        assert_eq!(
            err.user_message(),
            "Error starting download: Network response was not ok"
        );
    }

    #[test]
    fn stream_and_not_found_have_fixed_messages() {
        assert_eq!(
            Error::Stream("connection reset".into()).user_message(),
            "Error in progress stream"
        );
        assert_eq!(
            Error::NotFound("abc".into()).user_message(),
            "Download not found"
        );
    }

    #[test]
    fn detail_strips_variant_prefix() {
        let err = Error::Stream("unexpected eof".into());
        assert_eq!(err.detail(), "unexpected eof");
        assert_eq!(err.to_string(), "progress stream error: unexpected eof");
    }
}

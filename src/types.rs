//! Core types for ytdlp-client
//!
//! Wire types mirror the JSON the backend speaks; domain types (`Session`,
//! `UiSignal`) are what the presentation layer reads.

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier the Submission Endpoint hands out for one download
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the backend should fetch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// Best video merged with best audio
    #[default]
    Video,
    /// Audio track only
    Audio,
}

impl DownloadMode {
    /// Wire name sent as `download_type`
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadMode::Video => "video",
            DownloadMode::Audio => "audio",
        }
    }
}

impl std::fmt::Display for DownloadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DownloadMode {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(DownloadMode::Video),
            "audio" | "audio-only" | "audio_only" => Ok(DownloadMode::Audio),
            other => Err(crate::error::Error::Validation(format!(
                "unknown download mode: {other}"
            ))),
        }
    }
}

/// Status reported by the Progress Endpoint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Submitted, backend not yet reporting
    Starting,
    /// Transfer running
    #[serde(alias = "in-progress", alias = "in_progress", alias = "downloading")]
    Processing,
    /// Finished successfully
    Completed,
    /// Finished with a failure
    Error,
    /// Backend does not know the session id
    NotFound,
    /// Any status this client does not recognise
    #[serde(other)]
    Unknown,
}

impl ProgressStatus {
    /// True for statuses after which no further snapshots are expected
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressStatus::Completed | ProgressStatus::Error | ProgressStatus::NotFound
        )
    }
}

/// The most recent progress state pushed by the backend
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Current status
    #[serde(default)]
    pub status: ProgressStatus,

    /// Percent complete, 0-100
    #[serde(default, deserialize_with = "lenient_percent")]
    pub percent: f64,

    /// Transfer rate as displayed by the backend
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,

    /// Estimated time remaining as displayed by the backend
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,

    /// Total size as displayed by the backend
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Human-readable log line
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressSnapshot {
    /// Snapshot of a controller that has not started anything
    pub fn idle() -> Self {
        Self::default()
    }

    /// Snapshot shown between `start` and the first pushed event
    pub fn starting() -> Self {
        Self {
            status: ProgressStatus::Starting,
            message: Some("Starting download...".to_string()),
            ..Self::default()
        }
    }
}

// The backend fills unset display fields with "" rather than omitting them.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn lenient_percent<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// Payload for the Submission Endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Media URL to fetch
    pub url: String,
    /// Video or audio-only
    pub download_type: DownloadMode,
    /// Forwarded verbatim; false asks the backend to skip playlists
    pub playlist: bool,
}

/// Successful Submission Endpoint response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Identifier for the new session
    pub download_id: SessionId,
}

/// Log Endpoint response
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsResponse {
    /// Full accumulated log, oldest first
    #[serde(default)]
    pub logs: Vec<String>,
}

/// A finished file as listed by the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadedFile {
    /// File name inside the backend's download directory
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Modification time, seconds since the Unix epoch
    pub modified: f64,
}

/// File listing response
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesResponse {
    /// Files currently held by the backend
    #[serde(default)]
    pub files: Vec<DownloadedFile>,
}

/// User-level description of one download attempt
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Set only after a successful submission
    pub session_id: Option<SessionId>,
    /// URL as submitted (trimmed)
    pub source_url: String,
    /// Requested mode
    pub mode: DownloadMode,
    /// Whether the whole playlist was requested
    pub whole_playlist: bool,
}

/// Fire-and-forget signals for the presentation layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiSignal {
    /// Show the progress surface
    RevealProgress,
    /// Hide the progress surface
    HideProgress,
    /// The log grew or was replaced; scroll it to the end
    ScrollLog,
}

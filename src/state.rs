//! Session state machine
//!
//! [`SessionState`] holds everything the presentation layer observes about one
//! download attempt. It is mutated only through [`SessionState::begin`],
//! [`SessionState::apply`] and [`SessionState::reset`], each of which returns
//! the [`Effect`]s the controller must carry out. Nothing in here performs I/O.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{
    DownloadMode, DownloadRequest, ProgressSnapshot, ProgressStatus, Session, SessionId, UiSignal,
};

/// Message shown when `start` is called without a usable URL
pub const INVALID_URL_MESSAGE: &str = "Please enter a valid URL";

/// Inputs produced by the endpoint adapters
#[derive(Clone, Debug, PartialEq)]
pub enum Msg {
    /// Submission Endpoint accepted the request
    Submitted(SessionId),
    /// Submission Endpoint rejected the request or could not be reached
    SubmitFailed(String),
    /// One snapshot pushed by the Progress Endpoint
    Snapshot(ProgressSnapshot),
    /// Transport-level failure on the progress stream
    StreamFailed(String),
    /// Progress stream closed before a terminal snapshot
    StreamEnded,
    /// Log Endpoint answered
    LogsFetched(Vec<String>),
    /// Log Endpoint failed
    LogsFailed(String),
}

/// Side effects requested by a state transition
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Send the request to the Submission Endpoint
    Submit(DownloadRequest),
    /// Subscribe to the Progress Endpoint, releasing any previous subscription
    OpenStream(SessionId),
    /// Release the current subscription, if any
    CloseStream,
    /// Request the full log from the Log Endpoint
    FetchLogs(SessionId),
    /// Notify the presentation layer
    Signal(UiSignal),
}

/// Observable state of the controller
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionState {
    /// What was submitted, and the id once known
    pub session: Session,
    /// Latest snapshot, fully replaced on every event
    pub progress: ProgressSnapshot,
    /// Log lines, first-seen order
    pub logs: Vec<String>,
    /// Single user-facing error slot
    pub error: Option<String>,
    /// A session is active and `start` is rejected
    pub busy: bool,
    /// `logs` holds the Log Endpoint's answer rather than streamed lines
    pub final_log: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session: Session::default(),
            progress: ProgressSnapshot::idle(),
            logs: Vec::new(),
            error: None,
            busy: false,
            final_log: false,
        }
    }
}

impl SessionState {
    /// Fresh, idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Session id of the current attempt, if submission succeeded
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.session_id.as_ref()
    }

    /// Validate and prepare a new attempt.
    ///
    /// On an empty or whitespace-only URL the error slot is set and
    /// `Error::Validation` is returned, busy or not; nothing else changes and
    /// no effect is produced. A valid URL while busy is rejected with
    /// `Error::Busy` and the state is left untouched.
    pub fn begin(&mut self, url: &str, mode: DownloadMode, playlist: bool) -> Result<Vec<Effect>> {
        let url = url.trim();
        if url.is_empty() {
            self.error = Some(INVALID_URL_MESSAGE.to_string());
            return Err(Error::Validation(INVALID_URL_MESSAGE.to_string()));
        }

        if self.busy {
            return Err(Error::Busy);
        }

        self.error = None;
        self.session = Session {
            session_id: None,
            source_url: url.to_string(),
            mode,
            whole_playlist: playlist,
        };
        self.progress = ProgressSnapshot::starting();
        self.logs.clear();
        self.final_log = false;
        self.busy = true;

        Ok(vec![
            Effect::Signal(UiSignal::RevealProgress),
            Effect::Submit(DownloadRequest {
                url: url.to_string(),
                download_type: mode,
                playlist,
            }),
        ])
    }

    /// Apply one endpoint input and return the resulting effects
    pub fn apply(&mut self, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::Submitted(id) => {
                self.session.session_id = Some(id.clone());
                vec![Effect::OpenStream(id)]
            }
            Msg::SubmitFailed(detail) => {
                self.error = Some(Error::Submission(detail).user_message());
                self.busy = false;
                Vec::new()
            }
            Msg::Snapshot(snapshot) => self.on_snapshot(snapshot),
            Msg::StreamFailed(detail) => {
                tracing::warn!(error = %detail, "progress stream failed");
                self.fail_stream(detail)
            }
            Msg::StreamEnded => {
                tracing::warn!("progress stream closed before a terminal status");
                self.fail_stream("stream closed".to_string())
            }
            Msg::LogsFetched(lines) => {
                self.logs = lines;
                self.final_log = true;
                vec![Effect::Signal(UiSignal::ScrollLog)]
            }
            Msg::LogsFailed(detail) => {
                tracing::warn!(error = %detail, "error fetching logs");
                Vec::new()
            }
        }
    }

    /// Effects for an explicit log refresh; empty without a session id
    pub fn request_logs(&self) -> Vec<Effect> {
        match self.session_id() {
            Some(id) => vec![Effect::FetchLogs(id.clone())],
            None => Vec::new(),
        }
    }

    /// Restore the initial state from anywhere
    pub fn reset(&mut self) -> Vec<Effect> {
        *self = Self::default();
        vec![Effect::CloseStream, Effect::Signal(UiSignal::HideProgress)]
    }

    fn on_snapshot(&mut self, snapshot: ProgressSnapshot) -> Vec<Effect> {
        let Some(id) = self.session.session_id.clone() else {
            tracing::debug!(status = ?snapshot.status, "ignoring snapshot without a session");
            return Vec::new();
        };

        if snapshot.status == ProgressStatus::NotFound {
            self.error = Some(Error::NotFound(id.to_string()).user_message());
            self.busy = false;
            return vec![Effect::CloseStream];
        }

        let mut effects = Vec::new();

        if let Some(message) = snapshot.message.as_ref()
            && !self.logs.iter().any(|line| line == message)
        {
            self.logs.push(message.clone());
            effects.push(Effect::Signal(UiSignal::ScrollLog));
        }

        let terminal = snapshot.status.is_terminal();
        self.progress = snapshot;

        if terminal {
            self.busy = false;
            effects.push(Effect::CloseStream);
            effects.push(Effect::FetchLogs(id));
        }

        effects
    }

    fn fail_stream(&mut self, detail: String) -> Vec<Effect> {
        self.error = Some(Error::Stream(detail).user_message());
        self.busy = false;
        vec![Effect::CloseStream]
    }
}

//! Download session controller split into focused submodules.
//!
//! - [`event_loop`] - the single task that owns [`SessionState`] and applies every transition
//! - [`tasks`] - network workers and delayed signals spawned by the loop
//!
//! [`SessionController`] is the cheap, clonable handle the presentation layer
//! holds. It never touches the state directly: every operation is a message to
//! the loop, and the state is read back through a `watch` channel.

mod event_loop;
mod tasks;


use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::backend::{Backend, HttpBackend};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::state::SessionState;
use crate::types::{DownloadMode, DownloadedFile, SessionId, UiSignal};

use event_loop::ControllerLoop;

/// Requests from handles to the loop
pub(crate) enum Command {
    Start {
        url: String,
        mode: DownloadMode,
        playlist: bool,
        reply: oneshot::Sender<Result<SessionId>>,
    },
    FetchLogs,
    Reset {
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Handle to a running session controller
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use ytdlp_client::{Config, DownloadMode, SessionController, UiSignal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let controller = SessionController::new(Config::default())?;
///
///     let mut signals = controller.subscribe();
///     tokio::spawn(async move {
///         while let Ok(signal) = signals.recv().await {
///             if signal == UiSignal::ScrollLog {
///                 // redraw the log view
///             }
///         }
///     });
///
///     controller
///         .start("https://example.com/watch?v=1", DownloadMode::Video, false)
///         .await?;
///     let finished = controller.wait_until_idle().await?;
///     println!("{:?}", finished.progress.status);
///
///     // the server's full log replaces the streamed lines shortly after
///     let wait = controller.wait_for_final_log();
///     if let Ok(Ok(done)) = tokio::time::timeout(Duration::from_secs(5), wait).await {
///         println!("{} log lines", done.logs.len());
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct SessionController {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionState>,
    signals: broadcast::Sender<UiSignal>,
    backend: Arc<dyn Backend>,
}

impl SessionController {
    /// Spawn a controller talking HTTP to `config.base_url`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config) -> Result<Self> {
        let backend = HttpBackend::new(&config)?;
        Self::with_backend(backend, config)
    }

    /// Spawn a controller over any [`Backend`]
    pub fn with_backend<B: Backend>(backend: B, config: Config) -> Result<Self> {
        config.validate()?;
        let backend: Arc<dyn Backend> = Arc::new(backend);

        let (commands, command_rx) = mpsc::channel(config.command_capacity);
        let (state_tx, state) = watch::channel(SessionState::new());
        let (signals, _) = broadcast::channel(config.signal_capacity);

        let event_loop = ControllerLoop::new(
            Arc::clone(&backend),
            config,
            command_rx,
            state_tx,
            signals.clone(),
        );
        tokio::spawn(event_loop.run());

        Ok(Self {
            commands,
            state,
            signals,
            backend,
        })
    }

    /// Start a new download attempt.
    ///
    /// Returns as soon as the Submission Endpoint has answered; progress then
    /// continues in the background. Fails with `Error::Validation` for a blank
    /// URL (no request is made), `Error::Busy` while another attempt is
    /// active, `Error::Submission` when the endpoint rejects the request, and
    /// `Error::Cancelled` if [`reset`](Self::reset) runs before it answers.
    pub async fn start(
        &self,
        url: impl Into<String>,
        mode: DownloadMode,
        playlist: bool,
    ) -> Result<SessionId> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Start {
            url: url.into(),
            mode,
            playlist,
            reply,
        })
        .await?;
        response.await.map_err(|_| Error::ControllerClosed)?
    }

    /// Ask for the full log of the current session; no-op without one.
    ///
    /// The result lands in the observable state. A failure is only logged.
    pub async fn fetch_logs(&self) -> Result<()> {
        self.send(Command::FetchLogs).await
    }

    /// Return to the initial state, releasing any open progress stream
    pub async fn reset(&self) -> Result<()> {
        let (reply, done) = oneshot::channel();
        self.send(Command::Reset { reply }).await?;
        done.await.map_err(|_| Error::ControllerClosed)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published state
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Subscribe to presentation signals
    pub fn subscribe(&self) -> broadcast::Receiver<UiSignal> {
        self.signals.subscribe()
    }

    /// Wait until no attempt is active and return the state at that point
    pub async fn wait_until_idle(&self) -> Result<SessionState> {
        let mut state = self.state.clone();
        let idle = state
            .wait_for(|s| !s.busy)
            .await
            .map_err(|_| Error::ControllerClosed)?;
        Ok(idle.clone())
    }

    /// Wait until the finished attempt's log has been replaced by the Log
    /// Endpoint's answer.
    ///
    /// A failed log fetch is only logged and never resolves this, so bound the
    /// wait with a timeout.
    pub async fn wait_for_final_log(&self) -> Result<SessionState> {
        let mut state = self.state.clone();
        let done = state
            .wait_for(|s| !s.busy && s.final_log)
            .await
            .map_err(|_| Error::ControllerClosed)?;
        Ok(done.clone())
    }

    /// Files the backend has finished, straight from the backend
    pub async fn downloaded_files(&self) -> Result<Vec<DownloadedFile>> {
        self.backend.downloaded_files().await
    }

    /// Stop the controller task and release any open stream
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::ControllerClosed)
    }
}

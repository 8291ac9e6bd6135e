//! # ytdlp-client
//!
//! Client-side controller for a remote yt-dlp style download service.
//!
//! One [`SessionController`] drives one download attempt at a time through
//! its whole lifecycle: submit the request, follow the server-pushed progress
//! stream, accumulate log lines, and fetch the authoritative log once the
//! backend reports a terminal status. The presentation layer only reads the
//! published [`SessionState`] and listens for [`UiSignal`]s.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ytdlp_client::{Config, DownloadMode, SessionController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::with_base_url("http://127.0.0.1:5001");
//!     let controller = SessionController::new(config)?;
//!
//!     // Follow state changes
//!     let mut state = controller.watch();
//!     tokio::spawn(async move {
//!         while state.changed().await.is_ok() {
//!             let s = state.borrow().clone();
//!             println!("{:?} {:.1}%", s.progress.status, s.progress.percent);
//!         }
//!     });
//!
//!     controller
//!         .start("https://example.com/watch?v=1", DownloadMode::Audio, false)
//!         .await?;
//!     controller.wait_until_idle().await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Endpoint adapters
pub mod backend;
/// Configuration types
pub mod config;
/// Session controller task and handle
pub mod controller;
/// Error types
pub mod error;
/// Server-sent events decoding
pub mod sse;
/// Pure session state machine
pub mod state;
/// Core wire and domain types
pub mod types;

// Re-export commonly used types
pub use backend::{Backend, HttpBackend, ProgressStream};
pub use config::Config;
pub use controller::SessionController;
pub use error::{Error, Result};
pub use state::{Effect, Msg, SessionState};
pub use types::{
    DownloadMode, DownloadRequest, DownloadedFile, ProgressSnapshot, ProgressStatus, Session,
    SessionId, UiSignal,
};

/// Stop the controller once `signal` resolves.
///
/// Closing the controller releases the progress subscription; a download
/// already accepted by the backend keeps running there.
pub async fn run_until<F>(controller: SessionController, signal: F) -> Result<()>
where
    F: std::future::Future<Output = ()>,
{
    signal.await;
    tracing::info!("stopping session controller");
    controller.shutdown().await
}

/// [`run_until`] the process receives SIGTERM or Ctrl+C
pub async fn run_with_shutdown(controller: SessionController) -> Result<()> {
    run_until(controller, termination()).await
}

#[cfg(unix)]
async fn termination() {
    use tokio::signal::unix::{SignalKind, signal};

    // registration can fail in restricted sandboxes; Ctrl+C still works there
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            _ = tokio::signal::ctrl_c() => tracing::info!("received Ctrl+C"),
        },
        Err(e) => {
            tracing::warn!(error = %e, "no SIGTERM handler, waiting for Ctrl+C only");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl+C");
            }
        }
    }
}

#[cfg(not(unix))]
async fn termination() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C"),
        Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl+C"),
    }
}

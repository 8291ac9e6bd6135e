//! Workers spawned by the controller loop.
//!
//! Each worker does one network operation (or one timer) and reports back
//! through the loop's inbox. None of them touch `SessionState`.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::backend::{Backend, ProgressStream};
use crate::state::Msg;
use crate::types::{DownloadRequest, SessionId, UiSignal};

use super::event_loop::Inbound;

pub(super) fn spawn_submit(
    backend: Arc<dyn Backend>,
    request: DownloadRequest,
    epoch: u64,
    tx: mpsc::Sender<Inbound>,
) {
    tokio::spawn(async move {
        let result = backend.submit(&request).await;
        tx.send(Inbound::Submission { epoch, result }).await.ok();
    });
}

pub(super) fn spawn_fetch_logs(
    backend: Arc<dyn Backend>,
    session_id: SessionId,
    epoch: u64,
    tx: mpsc::Sender<Inbound>,
) {
    tokio::spawn(async move {
        tracing::debug!(session_id = %session_id, "fetching logs");
        let result = backend.logs(&session_id).await;
        tx.send(Inbound::Logs { epoch, result }).await.ok();
    });
}

pub(super) fn spawn_delayed_signal(
    signals: broadcast::Sender<UiSignal>,
    signal: UiSignal,
    delay: Duration,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {
                signals.send(signal).ok();
            }
        }
    });
}

/// Parameters for a progress forwarding task
pub(super) struct ProgressTask {
    pub(super) backend: Arc<dyn Backend>,
    pub(super) session_id: SessionId,
    /// Identifies this subscription to the loop
    pub(super) stream: u64,
    pub(super) cancel: CancellationToken,
    pub(super) idle_timeout: Option<Duration>,
    pub(super) tx: mpsc::Sender<Inbound>,
}

pub(super) fn spawn_progress(task: ProgressTask) {
    tokio::spawn(forward_progress(task));
}

/// Pump one progress subscription into the loop until it ends or is cancelled.
///
/// Stops after the first terminal snapshot, error or end of stream.
async fn forward_progress(task: ProgressTask) {
    let ProgressTask {
        backend,
        session_id,
        stream,
        cancel,
        idle_timeout,
        tx,
    } = task;

    let opened = tokio::select! {
        _ = cancel.cancelled() => return,
        opened = backend.progress(&session_id) => opened,
    };

    let mut snapshots = match opened {
        Ok(snapshots) => snapshots,
        Err(e) => {
            let msg = Msg::StreamFailed(e.detail());
            tx.send(Inbound::Progress { stream, msg }).await.ok();
            return;
        }
    };

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(session_id = %session_id, "progress stream released");
                return;
            }
            next = next_frame(&mut snapshots, idle_timeout) => next,
        };

        let (msg, last) = match next {
            Ok(Some(Ok(snapshot))) => {
                let terminal = snapshot.status.is_terminal();
                (Msg::Snapshot(snapshot), terminal)
            }
            Ok(Some(Err(e))) => (Msg::StreamFailed(e.detail()), true),
            Ok(None) => (Msg::StreamEnded, true),
            Err(_) => {
                let detail = format!("no progress event for {:?}", idle_timeout.unwrap_or_default());
                (Msg::StreamFailed(detail), true)
            }
        };

        if tx.send(Inbound::Progress { stream, msg }).await.is_err() || last {
            return;
        }
    }
}

async fn next_frame(
    snapshots: &mut ProgressStream,
    idle_timeout: Option<Duration>,
) -> Result<Option<crate::error::Result<crate::types::ProgressSnapshot>>, tokio::time::error::Elapsed>
{
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, snapshots.next()).await,
        None => Ok(snapshots.next().await),
    }
}

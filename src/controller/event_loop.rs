//! The controller's single task.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::backend::Backend;
use crate::config::Config;
use crate::error::Result;
use crate::state::{Effect, Msg, SessionState};
use crate::types::{SessionId, UiSignal};

use super::Command;
use super::tasks;

/// Results reported back by spawned workers
pub(crate) enum Inbound {
    /// Submission Endpoint answered for the attempt started in `epoch`
    Submission {
        epoch: u64,
        result: Result<SessionId>,
    },
    /// Something happened on progress stream `stream`
    Progress { stream: u64, msg: Msg },
    /// Log Endpoint answered for `epoch`
    Logs {
        epoch: u64,
        result: Result<Vec<String>>,
    },
}

struct ActiveStream {
    id: u64,
    cancel: CancellationToken,
}

pub(crate) struct ControllerLoop {
    backend: Arc<dyn Backend>,
    config: Config,
    commands: mpsc::Receiver<Command>,
    inbound_tx: mpsc::Sender<Inbound>,
    inbound: mpsc::Receiver<Inbound>,
    state_tx: watch::Sender<SessionState>,
    signals: broadcast::Sender<UiSignal>,
    state: SessionState,
    // bumped by every start and reset; worker results from older epochs are dropped
    epoch: u64,
    next_stream_id: u64,
    stream: Option<ActiveStream>,
    pending_start: Option<oneshot::Sender<Result<SessionId>>>,
    shutdown: CancellationToken,
}

impl ControllerLoop {
    pub(crate) fn new(
        backend: Arc<dyn Backend>,
        config: Config,
        commands: mpsc::Receiver<Command>,
        state_tx: watch::Sender<SessionState>,
        signals: broadcast::Sender<UiSignal>,
    ) -> Self {
        let (inbound_tx, inbound) = mpsc::channel(config.command_capacity);
        Self {
            backend,
            config,
            commands,
            inbound_tx,
            inbound,
            state_tx,
            signals,
            state: SessionState::new(),
            epoch: 0,
            next_stream_id: 0,
            stream: None,
            pending_start: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub(crate) async fn run(mut self) {
        tracing::debug!(base_url = %self.config.base_url, "session controller started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.on_command(command),
                },
                Some(inbound) = self.inbound.recv() => self.on_inbound(inbound),
            }
        }

        self.close_stream();
        self.shutdown.cancel();
        tracing::debug!("session controller stopped");
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Start {
                url,
                mode,
                playlist,
                reply,
            } => match self.state.begin(&url, mode, playlist) {
                Ok(effects) => {
                    self.epoch += 1;
                    self.close_stream();
                    tracing::info!(source = %self.state.session.source_url, %mode, playlist, "starting download");
                    self.pending_start = Some(reply);
                    self.run_effects(effects);
                    self.publish();
                }
                Err(e) => {
                    tracing::debug!(error = %e, "start rejected");
                    self.publish();
                    reply.send(Err(e)).ok();
                }
            },
            Command::FetchLogs => {
                let effects = self.state.request_logs();
                self.run_effects(effects);
            }
            Command::Reset { reply } => {
                self.epoch += 1;
                if let Some(pending) = self.pending_start.take() {
                    pending.send(Err(crate::error::Error::Cancelled)).ok();
                }
                let effects = self.state.reset();
                self.run_effects(effects);
                self.publish();
                tracing::debug!("session reset");
                reply.send(()).ok();
            }
            // handled by the loop itself
            Command::Shutdown => {}
        }
    }

    fn on_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Submission { epoch, result } => {
                if epoch != self.epoch {
                    tracing::debug!(epoch, current = self.epoch, "dropping stale submission result");
                    return;
                }
                let pending = self.pending_start.take();
                match result {
                    Ok(id) => {
                        tracing::info!(session_id = %id, "download accepted");
                        let effects = self.state.apply(Msg::Submitted(id.clone()));
                        self.run_effects(effects);
                        self.publish();
                        if let Some(pending) = pending {
                            pending.send(Ok(id)).ok();
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "error starting download");
                        let detail = e.detail();
                        let effects = self.state.apply(Msg::SubmitFailed(detail.clone()));
                        self.run_effects(effects);
                        self.publish();
                        if let Some(pending) = pending {
                            pending
                                .send(Err(crate::error::Error::Submission(detail)))
                                .ok();
                        }
                    }
                }
            }
            Inbound::Progress { stream, msg } => {
                if self.stream.as_ref().map(|s| s.id) != Some(stream) {
                    tracing::debug!(stream, "dropping event from closed progress stream");
                    return;
                }
                let effects = self.state.apply(msg);
                self.run_effects(effects);
                self.publish();
                if !self.state.busy {
                    tracing::info!(
                        status = ?self.state.progress.status,
                        error = ?self.state.error,
                        "download session ended"
                    );
                }
            }
            Inbound::Logs { epoch, result } => {
                if epoch != self.epoch {
                    tracing::debug!(epoch, current = self.epoch, "dropping stale log response");
                    return;
                }
                let msg = match result {
                    Ok(lines) => Msg::LogsFetched(lines),
                    Err(e) => Msg::LogsFailed(e.detail()),
                };
                let effects = self.state.apply(msg);
                self.run_effects(effects);
                self.publish();
            }
        }
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Submit(request) => {
                    tasks::spawn_submit(
                        Arc::clone(&self.backend),
                        request,
                        self.epoch,
                        self.inbound_tx.clone(),
                    );
                }
                Effect::OpenStream(session_id) => {
                    self.close_stream();
                    self.next_stream_id += 1;
                    let stream = ActiveStream {
                        id: self.next_stream_id,
                        cancel: self.shutdown.child_token(),
                    };
                    tasks::spawn_progress(tasks::ProgressTask {
                        backend: Arc::clone(&self.backend),
                        session_id,
                        stream: stream.id,
                        cancel: stream.cancel.clone(),
                        idle_timeout: self.config.stream_idle_timeout,
                        tx: self.inbound_tx.clone(),
                    });
                    self.stream = Some(stream);
                }
                Effect::CloseStream => self.close_stream(),
                Effect::FetchLogs(session_id) => {
                    tasks::spawn_fetch_logs(
                        Arc::clone(&self.backend),
                        session_id,
                        self.epoch,
                        self.inbound_tx.clone(),
                    );
                }
                Effect::Signal(UiSignal::ScrollLog) => {
                    tasks::spawn_delayed_signal(
                        self.signals.clone(),
                        UiSignal::ScrollLog,
                        self.config.scroll_delay,
                        self.shutdown.child_token(),
                    );
                }
                Effect::Signal(signal) => {
                    // no receivers is fine
                    self.signals.send(signal).ok();
                }
            }
        }
    }

    fn close_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            tracing::debug!(stream = stream.id, "closing progress stream");
            stream.cancel.cancel();
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

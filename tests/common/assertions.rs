//! Waiting helpers for controller state

use std::time::Duration;
use ytdlp_client::{SessionController, SessionState};

/// Default upper bound for any wait in these tests
pub const WAIT: Duration = Duration::from_secs(5);

/// Wait until `pred` holds for the published state, panicking after [`WAIT`]
pub async fn wait_for_state(
    controller: &SessionController,
    pred: impl FnMut(&SessionState) -> bool,
) -> SessionState {
    let mut rx = controller.watch();
    let state = tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for controller state")
        .expect("controller stopped");
    state.clone()
}

/// Wait for the attempt to end, panicking after [`WAIT`]
pub async fn wait_until_idle(controller: &SessionController) -> SessionState {
    tokio::time::timeout(WAIT, controller.wait_until_idle())
        .await
        .expect("session never went idle")
        .expect("controller stopped")
}

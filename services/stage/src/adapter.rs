use improv_core::generic_types::{AgentActivity, StageInput};
use improv_core::session_state::{StageSession, StageView};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

/// Feeds agent activity and stage events into a [`StageSession`] and publishes
/// a fresh [`StageView`] after every change.
pub struct StageAdapter {
    handle: JoinHandle<()>,
}

async fn next_input(inputs: &mut Option<mpsc::Receiver<StageInput>>) -> Option<StageInput> {
    match inputs {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl StageAdapter {
    pub fn spawn(
        session: Arc<Mutex<StageSession>>,
        mut activity: watch::Receiver<AgentActivity>,
        mut inputs: Option<mpsc::Receiver<StageInput>>,
        views: mpsc::Sender<StageView>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let initial = activity.borrow_and_update().clone();
            let view = {
                let mut stage = session.lock().await;
                stage.set_activity(initial);
                stage.view()
            };
            if views.send(view).await.is_err() {
                return;
            }

            let mut activity_open = true;
            loop {
                let input = tokio::select! {
                    changed = activity.changed(), if activity_open => match changed {
                        Ok(()) => StageInput::Activity(activity.borrow_and_update().clone()),
                        Err(_) => {
                            tracing::debug!("Activity signal closed");
                            activity_open = false;
                            continue;
                        }
                    },
                    input = next_input(&mut inputs), if inputs.is_some() => match input {
                        Some(input) => input,
                        None => {
                            tracing::debug!("Stage input channel closed");
                            inputs = None;
                            continue;
                        }
                    },
                    else => break,
                };

                let view = {
                    let mut stage = session.lock().await;
                    if let Err(e) = stage.apply(input) {
                        tracing::warn!("Ignoring stage event: {}", e);
                    }
                    stage.view()
                };
                if views.send(view).await.is_err() {
                    tracing::debug!("View receiver dropped, stopping stage adapter");
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Stops delivering views. Events that arrive afterwards are dropped.
    pub fn shutdown(&self) {
        self.handle.abort();
    }

    /// Waits for both sources to close.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::error!("Stage adapter task failed: {}", e);
            }
        }
    }
}

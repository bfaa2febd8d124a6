use crate::generic_types::{AgentActivity, AudioTrack, StageInput};
use crate::identity::PlayerIdentity;
use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::{mpsc, watch};

/// A trait abstracting the realtime voice session the stage runs on top of.
///
/// Transport, codecs and reconnection belong to the implementation; the stage
/// only needs to start and stop it and to observe what the agent is doing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RealtimeSession: Send + Sync {
    /// Joins the session as `identity`. Resolves once the session is live.
    async fn start(&self, identity: &PlayerIdentity) -> Result<()>;

    /// Leaves the session.
    async fn stop(&self) -> Result<()>;

    /// Subscribes to the agent activity signal.
    fn activity(&self) -> watch::Receiver<AgentActivity>;

    /// The agent's audio track, once one is published.
    fn audio_track(&self) -> Option<AudioTrack>;

    /// Round and scenario events relayed by the session. Can only be taken once.
    fn stage_inputs(&self) -> Option<mpsc::Receiver<StageInput>>;
}

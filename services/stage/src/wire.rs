//! JSON frames exchanged with the agent bridge.

use improv_core::generic_types::{AgentActivity, AudioTrack, StageInput};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "session.start")]
    SessionStart {
        identity: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        agent_name: Option<String>,
    },
    #[serde(rename = "session.stop")]
    SessionStop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "session.started")]
    SessionStarted {
        #[serde(default)]
        audio_track: Option<AudioTrack>,
    },
    #[serde(rename = "session.error")]
    SessionError { message: String },
    #[serde(rename = "agent.state")]
    AgentState { state: AgentActivity },
    #[serde(rename = "round.advanced")]
    RoundAdvanced,
    #[serde(rename = "scenario.announced")]
    ScenarioAnnounced { text: String },
    #[serde(rename = "scenario.dismissed")]
    ScenarioDismissed,
}

impl ServerMessage {
    /// Parses a text frame. Frames we don't understand are logged and skipped.
    pub fn decode(text: &str) -> Option<Self> {
        match serde_json::from_str::<ServerMessage>(text) {
            Ok(message) => Some(message),
            Err(e) => {
                let event_type = serde_json::from_str::<serde_json::Value>(text)
                    .ok()
                    .and_then(|json| json.get("type").and_then(|t| t.as_str()).map(String::from));
                tracing::debug!(
                    "skipping frame: {}, type={}",
                    e,
                    event_type.as_deref().unwrap_or("unknown")
                );
                None
            }
        }
    }

    /// The stage event this message carries, if any.
    pub fn stage_input(&self) -> Option<StageInput> {
        match self {
            ServerMessage::AgentState { state } => Some(StageInput::Activity(state.clone())),
            ServerMessage::RoundAdvanced => Some(StageInput::AdvanceRound),
            ServerMessage::ScenarioAnnounced { text } => {
                Some(StageInput::AnnounceScenario(text.clone()))
            }
            ServerMessage::ScenarioDismissed => Some(StageInput::DismissScenario),
            ServerMessage::SessionStarted { .. } | ServerMessage::SessionError { .. } => None,
        }
    }
}

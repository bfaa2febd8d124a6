use serde::{Deserialize, Serialize};
use std::fmt;

/// What the remote voice agent is doing right now.
///
/// Owned and updated by the realtime session; the stage only reads it.
/// Any state string the session sends that we don't know about lands in
/// `Unknown` instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentActivity {
    #[default]
    Idle,
    Listening,
    Thinking,
    Speaking,
    Unknown(String),
}

impl AgentActivity {
    pub fn as_str(&self) -> &str {
        match self {
            AgentActivity::Idle => "idle",
            AgentActivity::Listening => "listening",
            AgentActivity::Thinking => "thinking",
            AgentActivity::Speaking => "speaking",
            AgentActivity::Unknown(raw) => raw,
        }
    }

    /// True while audio is flowing in either direction.
    pub fn is_audible(&self) -> bool {
        matches!(self, AgentActivity::Listening | AgentActivity::Speaking)
    }
}

impl From<&str> for AgentActivity {
    fn from(raw: &str) -> Self {
        match raw {
            "idle" => AgentActivity::Idle,
            "listening" => AgentActivity::Listening,
            "thinking" => AgentActivity::Thinking,
            "speaking" => AgentActivity::Speaking,
            other => AgentActivity::Unknown(other.to_string()),
        }
    }
}

impl From<String> for AgentActivity {
    fn from(raw: String) -> Self {
        AgentActivity::from(raw.as_str())
    }
}

impl From<AgentActivity> for String {
    fn from(activity: AgentActivity) -> Self {
        activity.as_str().to_string()
    }
}

impl fmt::Display for AgentActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to the agent's audio track, for visualisation only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub track_sid: String,
}

/// Events the stage state machine consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageInput {
    Activity(AgentActivity),
    AdvanceRound,
    AnnounceScenario(String),
    DismissScenario,
}

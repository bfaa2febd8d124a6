//! Maps agent activity onto what the stage shows.
//!
//! The status triple is deterministic. The audio bars are not: their jitter
//! is drawn from whatever `Rng` the renderer passes in.

use crate::generic_types::AgentActivity;
use rand::Rng;

/// Status icon, label and the classes that colour them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub icon: &'static str,
    pub label: &'static str,
    pub label_class: &'static str,
    pub highlight_class: &'static str,
}

pub const SPEAKING: Presentation = Presentation {
    icon: "🎭",
    label: "Host is speaking...",
    label_class: "text-purple-400",
    highlight_class: "from-purple-500/30 via-purple-900/20",
};

pub const LISTENING: Presentation = Presentation {
    icon: "🎤",
    label: "Your turn to perform!",
    label_class: "text-green-400",
    highlight_class: "from-green-500/30 via-green-900/20",
};

pub const THINKING: Presentation = Presentation {
    icon: "🤔",
    label: "Host is thinking...",
    label_class: "text-yellow-400",
    highlight_class: "from-yellow-500/30 via-yellow-900/20",
};

pub const IDLE: Presentation = Presentation {
    icon: "⏸️",
    label: "Ready",
    label_class: "text-slate-400",
    highlight_class: "from-slate-500/20 via-slate-900/10",
};

/// Never fails: unknown activity falls back to the idle presentation.
pub fn presentation_for(activity: &AgentActivity) -> Presentation {
    match activity {
        AgentActivity::Speaking => SPEAKING,
        AgentActivity::Listening => LISTENING,
        AgentActivity::Thinking => THINKING,
        AgentActivity::Idle => IDLE,
        AgentActivity::Unknown(raw) => {
            tracing::warn!("Unrecognised agent activity {:?}, showing idle", raw);
            IDLE
        }
    }
}

pub const AUDIO_BAR_COUNT: usize = 7;

/// One bar of the audio-activity indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBar {
    pub height_px: f32,
    pub pulse_secs: f32,
    pub delay_secs: f32,
    pub color_class: &'static str,
}

/// Samples a fresh set of bars, or `None` when the indicator is hidden.
pub fn audio_bars<R: Rng + ?Sized>(
    activity: &AgentActivity,
    rng: &mut R,
) -> Option<Vec<AudioBar>> {
    if !activity.is_audible() {
        return None;
    }
    let color_class = if *activity == AgentActivity::Speaking {
        "bg-purple-500"
    } else {
        "bg-green-500"
    };
    let bars = (0..AUDIO_BAR_COUNT)
        .map(|i| AudioBar {
            height_px: rng.gen_range(20.0..60.0),
            pulse_secs: rng.gen_range(0.5..1.0),
            delay_secs: i as f32 * 0.1,
            color_class,
        })
        .collect();
    Some(bars)
}

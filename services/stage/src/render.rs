//! Text rendering of the welcome screen and the live stage.

use improv_core::config::SessionConfig;
use improv_core::presentation::{AudioBar, audio_bars};
use improv_core::session_state::StageView;
use rand::Rng;

const BAR_GLYPHS: [char; 5] = ['▁', '▂', '▄', '▆', '█'];

pub fn welcome(config: &SessionConfig) -> String {
    let mut features = Vec::new();
    if config.supports_chat_input {
        features.push("chat");
    }
    if config.supports_video_input {
        features.push("video");
    }
    if config.supports_screen_share {
        features.push("screen share");
    }

    let mut out = format!(
        "{}\n{}\n\n[ {} ]",
        config.page_title, config.page_description, config.start_button_text
    );
    if !features.is_empty() {
        out.push_str(&format!("\nAvailable: {}", features.join(", ")));
    }
    out
}

fn bar_glyph(bar: &AudioBar) -> char {
    // Heights span 20..60 px.
    let step = ((bar.height_px - 20.0) / 40.0 * (BAR_GLYPHS.len() - 1) as f32).round();
    let index = (step.max(0.0) as usize).min(BAR_GLYPHS.len() - 1);
    BAR_GLYPHS[index]
}

/// One frame of the stage: round lights, status and, when visible, the cue card.
pub fn stage_line<R: Rng + ?Sized>(view: &StageView, rng: &mut R) -> String {
    let lights: String = view
        .round_lights
        .iter()
        .map(|lit| if *lit { '●' } else { '○' })
        .collect();

    let mut line = format!(
        "{} {} | {} {}",
        lights, view.round_label, view.presentation.icon, view.presentation.label
    );
    if view.show_audio_indicator {
        if let Some(bars) = audio_bars(&view.activity, rng) {
            let glyphs: String = bars.iter().map(bar_glyph).collect();
            line.push(' ');
            line.push_str(&glyphs);
        }
    }
    if let Some(scenario) = &view.scenario {
        line.push_str(&format!("\n  🎬 Your scenario: {}", scenario));
    }
    line
}

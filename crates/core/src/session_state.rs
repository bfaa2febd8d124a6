use crate::error::ValidationError;
use crate::generic_types::{AgentActivity, StageInput};
use crate::identity::PlayerIdentity;
use crate::presentation::{Presentation, presentation_for};

/// Number of rounds in a game.
pub const MAX_ROUNDS: u32 = 3;

/// Round progress. Starts at round 1 and never goes back within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundState {
    current_round: u32,
    max_rounds: u32,
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new(MAX_ROUNDS)
    }
}

impl RoundState {
    /// `max_rounds` below 1 is treated as 1.
    pub fn new(max_rounds: u32) -> Self {
        Self {
            current_round: 1,
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn is_final_round(&self) -> bool {
        self.current_round == self.max_rounds
    }

    /// Moves to the next round. At the last round this does nothing and returns `false`.
    pub fn advance(&mut self) -> bool {
        if self.current_round >= self.max_rounds {
            return false;
        }
        self.current_round += 1;
        true
    }

    /// One entry per round, lit for every round reached so far.
    pub fn lights(&self) -> Vec<bool> {
        (0..self.max_rounds).map(|i| i < self.current_round).collect()
    }

    pub fn label(&self) -> String {
        format!("Round {}/{}", self.current_round, self.max_rounds)
    }
}

/// The cue card shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioCard {
    pub text: String,
    pub visible: bool,
}

/// Everything the stage needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub player_name: String,
    pub activity: AgentActivity,
    pub presentation: Presentation,
    /// Audio bars are drawn and the spotlight pulses.
    pub show_audio_indicator: bool,
    pub round_lights: Vec<bool>,
    pub round_label: String,
    pub scenario: Option<String>,
}

/// Per-session stage state: the last activity seen, rounds and the cue card.
#[derive(Debug)]
pub struct StageSession {
    identity: PlayerIdentity,
    activity: AgentActivity,
    rounds: RoundState,
    scenario: Option<ScenarioCard>,
}

impl StageSession {
    pub fn new(identity: PlayerIdentity) -> Self {
        Self {
            identity,
            activity: AgentActivity::Idle,
            rounds: RoundState::default(),
            scenario: None,
        }
    }

    pub fn identity(&self) -> &PlayerIdentity {
        &self.identity
    }

    pub fn activity(&self) -> &AgentActivity {
        &self.activity
    }

    pub fn rounds(&self) -> RoundState {
        self.rounds
    }

    pub fn scenario(&self) -> Option<&ScenarioCard> {
        self.scenario.as_ref()
    }

    pub fn set_activity(&mut self, activity: AgentActivity) {
        if self.activity != activity {
            tracing::debug!("Agent activity {} -> {}", self.activity, activity);
        }
        self.activity = activity;
    }

    pub fn advance_round(&mut self) -> bool {
        let advanced = self.rounds.advance();
        if advanced {
            tracing::info!("Advanced to {}", self.rounds.label());
        } else {
            tracing::debug!("Already at final round, ignoring advance");
        }
        advanced
    }

    /// Shows a new cue card, replacing any previous one.
    pub fn announce_scenario(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyScenario);
        }
        tracing::info!("Scenario announced for {}", self.rounds.label());
        self.scenario = Some(ScenarioCard {
            text,
            visible: true,
        });
        Ok(())
    }

    /// Hides the cue card but keeps its text.
    pub fn dismiss_scenario(&mut self) {
        if let Some(card) = self.scenario.as_mut() {
            card.visible = false;
        }
    }

    pub fn apply(&mut self, input: StageInput) -> Result<(), ValidationError> {
        match input {
            StageInput::Activity(activity) => self.set_activity(activity),
            StageInput::AdvanceRound => {
                self.advance_round();
            }
            StageInput::AnnounceScenario(text) => self.announce_scenario(text)?,
            StageInput::DismissScenario => self.dismiss_scenario(),
        }
        Ok(())
    }

    pub fn view(&self) -> StageView {
        StageView {
            player_name: self.identity.to_string(),
            activity: self.activity.clone(),
            presentation: presentation_for(&self.activity),
            show_audio_indicator: self.activity.is_audible(),
            round_lights: self.rounds.lights(),
            round_label: self.rounds.label(),
            scenario: self
                .scenario
                .as_ref()
                .filter(|card| card.visible && !card.text.is_empty())
                .map(|card| card.text.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation;

    fn session() -> StageSession {
        StageSession::new(PlayerIdentity::new("Alex").unwrap())
    }

    #[test]
    fn test_round_advance_is_clamped() {
        let mut rounds = RoundState::default();
        assert_eq!(rounds.current_round(), 1);
        assert!(rounds.advance());
        assert!(rounds.advance());
        assert!(rounds.is_final_round());

        for _ in 0..5 {
            assert!(!rounds.advance());
            assert_eq!(rounds.current_round(), MAX_ROUNDS);
        }
    }

    #[test]
    fn test_round_lights_and_label() {
        let mut rounds = RoundState::new(3);
        assert_eq!(rounds.lights(), vec![true, false, false]);
        rounds.advance();
        assert_eq!(rounds.lights(), vec![true, true, false]);
        assert_eq!(rounds.label(), "Round 2/3");
    }

    #[test]
    fn test_announce_dismiss_announce() {
        let mut stage = session();
        assert!(stage.scenario().is_none());

        stage.announce_scenario("A").unwrap();
        assert_eq!(
            stage.scenario(),
            Some(&ScenarioCard {
                text: "A".into(),
                visible: true
            })
        );

        stage.dismiss_scenario();
        assert_eq!(
            stage.scenario(),
            Some(&ScenarioCard {
                text: "A".into(),
                visible: false
            })
        );
        assert_eq!(stage.view().scenario, None);

        stage.announce_scenario("B").unwrap();
        assert_eq!(
            stage.scenario(),
            Some(&ScenarioCard {
                text: "B".into(),
                visible: true
            })
        );
        assert_eq!(stage.view().scenario.as_deref(), Some("B"));
    }

    #[test]
    fn test_empty_scenario_is_rejected_and_keeps_card() {
        let mut stage = session();
        stage.announce_scenario("A").unwrap();

        assert_eq!(stage.announce_scenario(""), Err(ValidationError::EmptyScenario));
        assert_eq!(
            stage.apply(StageInput::AnnounceScenario("  ".into())),
            Err(ValidationError::EmptyScenario)
        );
        assert_eq!(stage.scenario().map(|c| c.text.as_str()), Some("A"));
        assert!(stage.scenario().is_some_and(|c| c.visible));
    }

    #[test]
    fn test_dismiss_without_card_is_harmless() {
        let mut stage = session();
        stage.dismiss_scenario();
        assert!(stage.scenario().is_none());
    }

    #[test]
    fn test_view_follows_activity() {
        let mut stage = session();
        let view = stage.view();
        assert_eq!(view.presentation, presentation::IDLE);
        assert!(!view.show_audio_indicator);

        stage.apply(StageInput::Activity(AgentActivity::Thinking)).unwrap();
        let view = stage.view();
        assert_eq!(view.presentation, presentation::THINKING);
        assert!(!view.show_audio_indicator);

        stage
            .apply(StageInput::Activity(AgentActivity::Unknown("reconnecting".into())))
            .unwrap();
        assert_eq!(stage.view().presentation, presentation::IDLE);
    }

    #[test]
    fn test_stage_walkthrough() {
        let mut stage = session();

        stage.apply(StageInput::Activity(AgentActivity::Listening)).unwrap();
        let view = stage.view();
        assert_eq!(view.presentation.label, "Your turn to perform!");
        assert!(view.show_audio_indicator);

        stage.apply(StageInput::Activity(AgentActivity::Speaking)).unwrap();
        assert_eq!(stage.view().presentation.label, "Host is speaking...");

        for _ in 0..3 {
            stage.apply(StageInput::AdvanceRound).unwrap();
        }
        assert_eq!(stage.rounds().current_round(), 3);
        stage.apply(StageInput::AdvanceRound).unwrap();
        assert_eq!(stage.rounds().current_round(), 3);
        assert_eq!(stage.view().round_label, "Round 3/3");
    }
}

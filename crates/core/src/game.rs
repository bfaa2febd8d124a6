//! Game bookkeeping for an improv battle: which round we're on, the scenario
//! each round was played with, and the host's reaction to it.

use crate::generic_types::StageInput;
use crate::scenario::{Scenario, ScenarioDeck};
use crate::session_state::MAX_ROUNDS;
use rand::Rng;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Intro,
    AwaitingImprov,
    Reacting,
    Done,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Intro => "intro",
            GamePhase::AwaitingImprov => "awaiting_improv",
            GamePhase::Reacting => "reacting",
            GamePhase::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRecord {
    pub round_number: u32,
    pub scenario: String,
    pub scenario_id: u32,
    pub host_reaction: String,
    pub completed: bool,
}

/// A round that has just begun.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundStart {
    pub round: u32,
    pub max_rounds: u32,
    pub scenario: Scenario,
}

impl RoundStart {
    /// Stage events announcing this round. Round 1 is where the stage already starts.
    pub fn stage_inputs(&self) -> Vec<StageInput> {
        let mut inputs = Vec::with_capacity(2);
        if self.round > 1 {
            inputs.push(StageInput::AdvanceRound);
        }
        inputs.push(StageInput::AnnounceScenario(self.scenario.scenario.clone()));
        inputs
    }

    pub fn announcement(&self) -> String {
        format!(
            "Round {} of {}: {}",
            self.round, self.max_rounds, self.scenario.scenario
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    pub round: u32,
    pub scenario: String,
    pub reaction: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub player_name: Option<String>,
    pub total_rounds: usize,
    pub max_rounds: u32,
    pub completed: bool,
    pub rounds: Vec<RoundSummary>,
}

#[derive(Debug)]
pub struct ImprovGame {
    player_name: Option<String>,
    current_round: u32,
    max_rounds: u32,
    rounds: Vec<RoundRecord>,
    phase: GamePhase,
}

impl Default for ImprovGame {
    fn default() -> Self {
        Self {
            player_name: None,
            current_round: 0,
            max_rounds: MAX_ROUNDS,
            rounds: Vec::new(),
            phase: GamePhase::Intro,
        }
    }
}

impl ImprovGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    /// Resets the game for a new player.
    pub fn start(&mut self, player_name: &str, max_rounds: u32, deck: &mut ScenarioDeck) {
        *self = Self {
            player_name: Some(player_name.to_string()),
            max_rounds: max_rounds.max(1),
            ..Self::default()
        };
        deck.reset();
        tracing::info!(
            "Started game for {} with {} rounds",
            player_name,
            self.max_rounds
        );
    }

    /// Begins the next round, or returns `None` (and finishes the game) when
    /// every round has been played.
    pub fn start_new_round<R: Rng + ?Sized>(
        &mut self,
        deck: &mut ScenarioDeck,
        rng: &mut R,
    ) -> Option<RoundStart> {
        if self.current_round >= self.max_rounds {
            self.phase = GamePhase::Done;
            tracing::info!("Game over after {} rounds", self.current_round);
            return None;
        }

        if let Some(previous) = self.rounds.last_mut() {
            previous.completed = true;
        }
        self.current_round += 1;

        let scenario = deck.draw(self.current_round, rng);
        self.rounds.push(RoundRecord {
            round_number: self.current_round,
            scenario: scenario.scenario.clone(),
            scenario_id: scenario.id,
            host_reaction: String::new(),
            completed: false,
        });
        self.phase = GamePhase::AwaitingImprov;

        Some(RoundStart {
            round: self.current_round,
            max_rounds: self.max_rounds,
            scenario,
        })
    }

    /// Stores the host's reaction to the round in progress.
    pub fn record_reaction(&mut self, reaction: &str) {
        if let Some(round) = self.rounds.last_mut() {
            round.host_reaction = reaction.to_string();
            round.completed = true;
            self.phase = GamePhase::Reacting;
            tracing::info!("Recorded reaction for round {}", round.round_number);
        }
    }

    pub fn end_game(&mut self) {
        self.phase = GamePhase::Done;
        tracing::info!("Ended game at round {}", self.current_round);
    }

    pub fn is_game_over(&self) -> bool {
        self.current_round >= self.max_rounds || self.phase == GamePhase::Done
    }

    pub fn status_line(&self) -> String {
        format!(
            "Player: {}, Round: {}/{}, Phase: {}",
            self.player_name.as_deref().unwrap_or("Unknown"),
            self.current_round,
            self.max_rounds,
            self.phase
        )
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            player_name: self.player_name.clone(),
            total_rounds: self.rounds.len(),
            max_rounds: self.max_rounds,
            completed: self.phase == GamePhase::Done,
            rounds: self
                .rounds
                .iter()
                .map(|r| RoundSummary {
                    round: r.round_number,
                    scenario: r.scenario.clone(),
                    reaction: r.host_reaction.clone(),
                    completed: r.completed,
                })
                .collect(),
        }
    }
}

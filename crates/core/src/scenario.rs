use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Scenario ids played, in order, for the opening rounds.
pub const FIXED_SCENARIO_IDS: [u32; 3] = [1, 2, 3];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: u32,
    pub scenario: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

fn default_difficulty() -> String {
    "medium".to_string()
}

fn fallback_scenarios() -> Vec<Scenario> {
    vec![Scenario {
        id: 1,
        scenario: "You are a barista who has to tell a customer that their latte is actually a portal to another dimension.".to_string(),
        difficulty: default_difficulty(),
    }]
}

/// Loads scenarios from a JSON array file.
///
/// A missing, unreadable or empty file falls back to a single built-in scenario.
pub fn load_scenarios(path: &Path) -> Vec<Scenario> {
    let loaded = fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|content| Ok(serde_json::from_str::<Vec<Scenario>>(&content)?));

    match loaded {
        Ok(scenarios) if !scenarios.is_empty() => {
            tracing::info!("Loaded {} scenarios", scenarios.len());
            scenarios
        }
        Ok(_) => {
            tracing::error!("No scenarios in {}, using fallback", path.display());
            fallback_scenarios()
        }
        Err(e) => {
            tracing::error!("Error loading scenarios from {}: {}", path.display(), e);
            fallback_scenarios()
        }
    }
}

/// Hands out scenarios for successive rounds without repeating until exhausted.
#[derive(Debug)]
pub struct ScenarioDeck {
    scenarios: Vec<Scenario>,
    used: Vec<u32>,
}

impl ScenarioDeck {
    /// An empty list is replaced by the built-in fallback.
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        let scenarios = if scenarios.is_empty() {
            fallback_scenarios()
        } else {
            scenarios
        };
        Self {
            scenarios,
            used: Vec::new(),
        }
    }

    pub fn used(&self) -> &[u32] {
        &self.used
    }

    pub fn reset(&mut self) {
        self.used.clear();
    }

    /// Picks the scenario for `round` (1-based).
    ///
    /// The opening rounds use [`FIXED_SCENARIO_IDS`] when those ids exist;
    /// later rounds pick a random unused scenario, starting over once every
    /// scenario has been played.
    pub fn draw<R: Rng + ?Sized>(&mut self, round: u32, rng: &mut R) -> Scenario {
        let fixed_id = (round as usize)
            .checked_sub(1)
            .and_then(|i| FIXED_SCENARIO_IDS.get(i));
        if let Some(fixed) = fixed_id.and_then(|id| self.scenarios.iter().find(|s| s.id == *id)) {
            let fixed = fixed.clone();
            tracing::info!("Using fixed scenario {} for round {}", fixed.id, round);
            self.used.push(fixed.id);
            return fixed;
        }

        let mut available: Vec<&Scenario> = self
            .scenarios
            .iter()
            .filter(|s| !self.used.contains(&s.id))
            .collect();
        if available.is_empty() {
            tracing::info!("All scenarios used, resetting available pool");
            self.used.clear();
            available = self.scenarios.iter().collect();
        }

        // `scenarios` is never empty, so neither is `available`.
        let picked = available
            .choose(rng)
            .map(|s| (*s).clone())
            .unwrap_or_else(|| self.scenarios[0].clone());
        tracing::info!("Using random scenario {} for round {}", picked.id, round);
        self.used.push(picked.id);
        picked
    }
}

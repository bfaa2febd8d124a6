//! A local stand-in for the agent bridge that plays a scripted game.
//!
//! The host announces each round's scenario, hands the turn to the player,
//! thinks, reacts, and moves on until every round is played.

use anyhow::Result;
use async_trait::async_trait;
use improv_core::game::{GameSummary, ImprovGame};
use improv_core::generic_types::{AgentActivity, AudioTrack, StageInput};
use improv_core::identity::PlayerIdentity;
use improv_core::realtime_api::RealtimeSession;
use improv_core::scenario::{Scenario, ScenarioDeck};
use improv_core::session_state::MAX_ROUNDS;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

const REACTIONS: [&str; 3] = [
    "That was hilarious! I loved the commitment.",
    "Okay, that was... interesting. Points for creativity?",
    "I did NOT expect you to go there, but it worked!",
];

struct Script {
    activity_tx: watch::Sender<AgentActivity>,
    inputs_tx: mpsc::Sender<StageInput>,
}

pub struct ScriptedSession {
    scenarios: Vec<Scenario>,
    beat: Duration,
    activity_rx: watch::Receiver<AgentActivity>,
    inputs_rx: Mutex<Option<mpsc::Receiver<StageInput>>>,
    script: Mutex<Option<Script>>,
    task: Mutex<Option<JoinHandle<GameSummary>>>,
}

impl ScriptedSession {
    /// `beat` is how long the host spends in each activity.
    pub fn new(scenarios: Vec<Scenario>, beat: Duration) -> Self {
        let (activity_tx, activity_rx) = watch::channel(AgentActivity::Idle);
        let (inputs_tx, inputs_rx) = mpsc::channel(16);
        Self {
            scenarios,
            beat,
            activity_rx,
            inputs_rx: Mutex::new(Some(inputs_rx)),
            script: Mutex::new(Some(Script {
                activity_tx,
                inputs_tx,
            })),
            task: Mutex::new(None),
        }
    }
}

async fn play(
    script: Script,
    player: String,
    scenarios: Vec<Scenario>,
    beat: Duration,
) -> GameSummary {
    let Script {
        activity_tx,
        inputs_tx,
    } = script;
    let mut rng = StdRng::from_entropy();
    let mut deck = ScenarioDeck::new(scenarios);
    let mut game = ImprovGame::new();
    game.start(&player, MAX_ROUNDS, &mut deck);

    let mut reactions = REACTIONS.iter().cycle();
    'rounds: while let Some(round) = game.start_new_round(&mut deck, &mut rng) {
        tracing::info!("{}", round.announcement());
        activity_tx.send_replace(AgentActivity::Speaking);
        for input in round.stage_inputs() {
            if inputs_tx.send(input).await.is_err() {
                tracing::info!("Stage went away, ending the game early");
                game.end_game();
                break 'rounds;
            }
        }
        tokio::time::sleep(beat).await;

        activity_tx.send_replace(AgentActivity::Listening);
        tokio::time::sleep(beat * 2).await;
        if inputs_tx.send(StageInput::DismissScenario).await.is_err() {
            tracing::info!("Stage went away, ending the game early");
            game.end_game();
            break;
        }

        activity_tx.send_replace(AgentActivity::Thinking);
        tokio::time::sleep(beat).await;

        activity_tx.send_replace(AgentActivity::Speaking);
        if let Some(reaction) = reactions.next() {
            game.record_reaction(reaction);
        }
        tokio::time::sleep(beat).await;
        tracing::debug!("{}", game.status_line());
    }

    activity_tx.send_replace(AgentActivity::Idle);
    let summary = game.summary();
    match serde_json::to_string(&summary) {
        Ok(json) => tracing::info!("Game summary: {}", json),
        Err(e) => tracing::warn!("Failed to serialize game summary: {}", e),
    }
    summary
}

#[async_trait]
impl RealtimeSession for ScriptedSession {
    async fn start(&self, identity: &PlayerIdentity) -> Result<()> {
        let script = self
            .script
            .lock()
            .map_err(|_| anyhow::anyhow!("script lock poisoned"))?
            .take()
            .ok_or_else(|| anyhow::anyhow!("scripted session already played"))?;

        let handle = tokio::spawn(play(
            script,
            identity.to_string(),
            self.scenarios.clone(),
            self.beat,
        ));
        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if let Some(handle) = self.task.lock().ok().and_then(|mut task| task.take()) {
            handle.abort();
        }
        Ok(())
    }

    fn activity(&self) -> watch::Receiver<AgentActivity> {
        self.activity_rx.clone()
    }

    fn audio_track(&self) -> Option<AudioTrack> {
        None
    }

    fn stage_inputs(&self) -> Option<mpsc::Receiver<StageInput>> {
        self.inputs_rx.lock().ok().and_then(|mut guard| guard.take())
    }
}

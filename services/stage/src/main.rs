use anyhow::{Context, Result};
use clap::Parser;
use improv_core::bootstrap::{BootstrapController, StartOutcome};
use improv_core::config::SessionConfig;
use improv_core::error::BootstrapError;
use improv_core::realtime_api::RealtimeSession;
use improv_core::scenario::load_scenarios;
use improv_core::session_state::StageSession;
use improv_core::storage::JsonFileStore;
use improv_stage::adapter::StageAdapter;
use improv_stage::bridge::{BridgeConfig, BridgeSession, DEFAULT_START_TIMEOUT};
use improv_stage::config::Config;
use improv_stage::offline::ScriptedSession;
use improv_stage::render;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing_subscriber::fmt::time::ChronoLocal;

const OFFLINE_BEAT: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(version, about = "Take the stage in an improv battle")]
struct Cli {
    /// Your stage name
    name: String,
    /// Play a scripted game locally instead of connecting to the agent bridge
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let mut config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let session_config =
        SessionConfig::load().context("Failed to resolve session configuration")?;
    tracing::info!(
        "Configuration loaded successfully. Starting {}...",
        session_config.company_name
    );

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();
    println!("{}\n", render::welcome(&session_config));

    // --- 4. Pick the realtime session ---
    let session: Arc<dyn RealtimeSession> = if args.offline {
        let scenarios = load_scenarios(&config.scenarios_path);
        tracing::info!("Playing offline with {} scenarios", scenarios.len());
        Arc::new(ScriptedSession::new(scenarios, OFFLINE_BEAT))
    } else {
        Arc::new(BridgeSession::new(BridgeConfig {
            url: config.bridge_url.clone(),
            token: config.bridge_token.take(),
            agent_name: session_config.agent_name.clone(),
            start_timeout: DEFAULT_START_TIMEOUT,
        }))
    };
    let stage_inputs = session.stage_inputs();
    let activity = session.activity();

    // --- 5. Capture the identity and start the session ---
    let store = Arc::new(JsonFileStore::new(config.player_store_path.clone()));
    let controller = BootstrapController::new(session.clone(), store);
    controller.edit(&args.name).await;

    let identity = match controller.start().await {
        Ok(StartOutcome::Started(identity)) => identity,
        Ok(outcome) => anyhow::bail!("Session did not start: {:?}", outcome),
        Err(BootstrapError::Start(e)) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    if let Some(track) = session.audio_track() {
        tracing::info!("Host audio on track {}", track.track_sid);
    }

    // --- 6. Run the stage ---
    let stage = Arc::new(Mutex::new(StageSession::new(identity)));
    let (views_tx, mut views_rx) = mpsc::channel(32);
    let adapter = StageAdapter::spawn(stage, activity, stage_inputs, views_tx);
    let mut rng = StdRng::from_entropy();

    loop {
        tokio::select! {
            view = views_rx.recv() => match view {
                Some(view) => println!("{}", render::stage_line(&view, &mut rng)),
                None => {
                    tracing::info!("Session ended");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down...");
                break;
            }
        }
    }

    tracing::info!("Shutting down...");
    adapter.shutdown();
    if let Err(e) = session.stop().await {
        tracing::warn!("Failed to stop realtime session: {:?}", e);
    }
    controller.teardown().await;
    Ok(())
}

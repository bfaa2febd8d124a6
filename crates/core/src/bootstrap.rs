use crate::error::{BootstrapError, SessionStartError, ValidationError};
use crate::identity::PlayerIdentity;
use crate::realtime_api::RealtimeSession;
use crate::storage::{LocalStore, PLAYER_NAME_KEY};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Where the welcome flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    /// The name field is empty (or only whitespace).
    Editing,
    /// A usable name has been typed; start is enabled.
    Ready,
    /// The realtime session is being started.
    Starting,
    /// The session is live and the identity has been handed off.
    Started,
    /// The welcome flow went away; late completions are ignored.
    TornDown,
}

/// Proof that a start was begun, carried across the external `start` await.
#[derive(Debug)]
pub struct StartTicket {
    identity: PlayerIdentity,
    epoch: u64,
}

impl StartTicket {
    pub fn identity(&self) -> &PlayerIdentity {
        &self.identity
    }
}

#[derive(Debug)]
pub enum BeginStart {
    Ticket(StartTicket),
    /// A start is already in flight.
    AlreadyStarting,
    /// Already started or torn down.
    Inactive,
}

/// The identity-capture-then-connect state machine.
///
/// Every method is a single synchronous transition; callers serialise access.
#[derive(Debug)]
pub struct SessionBootstrap {
    phase: BootstrapPhase,
    draft: String,
    epoch: u64,
}

impl Default for SessionBootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBootstrap {
    pub fn new() -> Self {
        Self {
            phase: BootstrapPhase::Editing,
            draft: String::new(),
            epoch: 0,
        }
    }

    pub fn phase(&self) -> BootstrapPhase {
        self.phase
    }

    fn phase_for_draft(&self) -> BootstrapPhase {
        if self.draft.trim().is_empty() {
            BootstrapPhase::Editing
        } else {
            BootstrapPhase::Ready
        }
    }

    /// Records the name field's new contents.
    pub fn edit(&mut self, text: &str) -> BootstrapPhase {
        match self.phase {
            BootstrapPhase::Editing | BootstrapPhase::Ready => {
                self.draft = text.to_string();
                self.phase = self.phase_for_draft();
            }
            // Kept so a failed start lands on whatever the field says now.
            BootstrapPhase::Starting => self.draft = text.to_string(),
            BootstrapPhase::Started | BootstrapPhase::TornDown => {}
        }
        self.phase
    }

    pub fn begin_start(&mut self) -> Result<BeginStart, ValidationError> {
        match self.phase {
            BootstrapPhase::Editing => Err(ValidationError::EmptyIdentity),
            BootstrapPhase::Ready => {
                let identity = PlayerIdentity::new(&self.draft)?;
                self.phase = BootstrapPhase::Starting;
                Ok(BeginStart::Ticket(StartTicket {
                    identity,
                    epoch: self.epoch,
                }))
            }
            BootstrapPhase::Starting => Ok(BeginStart::AlreadyStarting),
            BootstrapPhase::Started | BootstrapPhase::TornDown => Ok(BeginStart::Inactive),
        }
    }

    fn is_current(&self, ticket: &StartTicket) -> bool {
        self.phase == BootstrapPhase::Starting && ticket.epoch == self.epoch
    }

    /// Finishes a successful start and hands the identity over.
    /// Returns `None` if the ticket is stale.
    pub fn complete_start(&mut self, ticket: StartTicket) -> Option<PlayerIdentity> {
        if !self.is_current(&ticket) {
            return None;
        }
        self.phase = BootstrapPhase::Started;
        Some(ticket.identity)
    }

    /// Returns to `Ready` (or `Editing`) after the external start failed.
    /// Returns `false` if the ticket is stale.
    pub fn fail_start(&mut self, ticket: StartTicket) -> bool {
        if !self.is_current(&ticket) {
            return false;
        }
        self.phase = self.phase_for_draft();
        true
    }

    pub fn teardown(&mut self) {
        self.phase = BootstrapPhase::TornDown;
        self.epoch += 1;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started(PlayerIdentity),
    /// Another start is still pending; nothing was done.
    AlreadyStarting,
    /// The bootstrap is already started or has been torn down.
    Inactive,
    /// Teardown happened while the start was in flight; the result was dropped.
    Cancelled,
}

/// Wires [`SessionBootstrap`] to the realtime session and local storage.
pub struct BootstrapController {
    state: Mutex<SessionBootstrap>,
    session: Arc<dyn RealtimeSession>,
    store: Arc<dyn LocalStore>,
}

impl BootstrapController {
    pub fn new(session: Arc<dyn RealtimeSession>, store: Arc<dyn LocalStore>) -> Self {
        Self {
            state: Mutex::new(SessionBootstrap::new()),
            session,
            store,
        }
    }

    pub async fn phase(&self) -> BootstrapPhase {
        self.state.lock().await.phase()
    }

    pub async fn edit(&self, text: &str) -> BootstrapPhase {
        self.state.lock().await.edit(text)
    }

    pub async fn teardown(&self) {
        self.state.lock().await.teardown();
        tracing::debug!("Bootstrap torn down");
    }

    /// Starts the realtime session with the typed name.
    ///
    /// The lock is released while the session starts, so a second call made
    /// meanwhile sees `Starting` and returns `AlreadyStarting` without
    /// touching the session.
    pub async fn start(&self) -> Result<StartOutcome, BootstrapError> {
        let ticket = {
            let mut state = self.state.lock().await;
            match state.begin_start()? {
                BeginStart::Ticket(ticket) => ticket,
                BeginStart::AlreadyStarting => {
                    tracing::debug!("Start already in progress, ignoring");
                    return Ok(StartOutcome::AlreadyStarting);
                }
                BeginStart::Inactive => return Ok(StartOutcome::Inactive),
            }
        };

        tracing::info!("Starting realtime session for {}", ticket.identity());
        let result = self.session.start(ticket.identity()).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(()) => {
                let Some(identity) = state.complete_start(ticket) else {
                    drop(state);
                    tracing::info!("Session started after teardown, stopping it again");
                    if let Err(e) = self.session.stop().await {
                        tracing::warn!("Failed to stop orphaned session: {:?}", e);
                    }
                    return Ok(StartOutcome::Cancelled);
                };
                drop(state);

                if let Err(e) = self.store.set_item(PLAYER_NAME_KEY, identity.as_str()) {
                    tracing::warn!("Failed to persist player name: {}", e);
                }
                tracing::info!("Realtime session started for {}", identity);
                Ok(StartOutcome::Started(identity))
            }
            Err(e) => {
                if !state.fail_start(ticket) {
                    tracing::debug!("Start failed after teardown: {:?}", e);
                    return Ok(StartOutcome::Cancelled);
                }
                tracing::error!("Failed to start realtime session: {:?}", e);
                Err(SessionStartError::Rejected(e).into())
            }
        }
    }
}

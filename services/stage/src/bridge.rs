use crate::wire::{ClientMessage, ServerMessage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};
use improv_core::generic_types::{AgentActivity, AudioTrack, StageInput};
use improv_core::identity::PlayerIdentity;
use improv_core::realtime_api::RealtimeSession;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

const AUTHORIZATION_HEADER: &str = "Authorization";
const CHANNEL_CAPACITY: usize = 64;

/// Upper bound on connecting plus the `session.start` handshake.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

pub struct BridgeConfig {
    pub url: String,
    pub token: Option<SecretString>,
    pub agent_name: Option<String>,
    pub start_timeout: Duration,
}

fn build_request(config: &BridgeConfig) -> Result<Request> {
    let mut request = config.url.as_str().into_client_request()?;
    if let Some(token) = &config.token {
        request.headers_mut().insert(
            AUTHORIZATION_HEADER,
            format!("Bearer {}", token.expose_secret()).parse::<HeaderValue>()?,
        );
    }
    Ok(request)
}

/// Sending halves of the activity signal and the stage event channel.
///
/// Once the session is live the reader task owns them, so both close when the
/// bridge closes the socket.
struct Producers {
    activity_tx: watch::Sender<AgentActivity>,
    inputs_tx: mpsc::Sender<StageInput>,
}

/// A [`RealtimeSession`] backed by the agent bridge's WebSocket.
///
/// One writer task drains outgoing messages; one reader task publishes agent
/// state on a watch channel and forwards round/scenario events.
pub struct BridgeSession {
    config: BridgeConfig,
    activity_rx: watch::Receiver<AgentActivity>,
    inputs_rx: Mutex<Option<mpsc::Receiver<StageInput>>>,
    producers: Mutex<Option<Producers>>,
    audio_track: Arc<Mutex<Option<AudioTrack>>>,
    outbound: tokio::sync::Mutex<Option<mpsc::Sender<ClientMessage>>>,
}

impl BridgeSession {
    pub fn new(config: BridgeConfig) -> Self {
        let (activity_tx, activity_rx) = watch::channel(AgentActivity::Idle);
        let (inputs_tx, inputs_rx) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            config,
            activity_rx,
            inputs_rx: Mutex::new(Some(inputs_rx)),
            producers: Mutex::new(Some(Producers {
                activity_tx,
                inputs_tx,
            })),
            audio_track: Arc::new(Mutex::new(None)),
            outbound: tokio::sync::Mutex::new(None),
        }
    }

    /// Connects and runs the handshake. Frames that arrive before
    /// `session.started` are dispatched like any other.
    async fn open(
        &self,
        identity: &PlayerIdentity,
        producers: &Producers,
    ) -> Result<(WsWrite, WsRead)> {
        let request = build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .with_context(|| format!("Failed to connect to agent bridge at {}", self.config.url))?;
        let (mut write, mut read) = ws_stream.split();

        let hello = ClientMessage::SessionStart {
            identity: identity.to_string(),
            agent_name: self.config.agent_name.clone(),
        };
        write
            .send(Message::Text(serde_json::to_string(&hello)?))
            .await
            .context("Failed to send session.start")?;

        let track = await_session_started(&mut read, producers, &self.audio_track).await?;
        if let Ok(mut guard) = self.audio_track.lock() {
            *guard = track;
        }
        Ok((write, read))
    }
}

/// Routes one server message to the activity signal or the stage.
async fn dispatch(
    message: ServerMessage,
    producers: &Producers,
    audio_track: &Mutex<Option<AudioTrack>>,
) {
    match message {
        ServerMessage::AgentState { state } => {
            producers.activity_tx.send_replace(state);
        }
        ServerMessage::SessionStarted { audio_track: track } => {
            if let Ok(mut guard) = audio_track.lock() {
                *guard = track;
            }
        }
        ServerMessage::SessionError { message } => {
            tracing::error!("agent bridge reported an error: {}", message);
        }
        other => {
            if let Some(input) = other.stage_input() {
                if producers.inputs_tx.send(input).await.is_err() {
                    tracing::warn!("Stage input receiver dropped, discarding event");
                }
            }
        }
    }
}

/// Reads frames until the bridge accepts or refuses the session.
async fn await_session_started<S>(
    read: &mut S,
    producers: &Producers,
    audio_track: &Mutex<Option<AudioTrack>>,
) -> Result<Option<AudioTrack>>
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(message) = read.next().await {
        let text = match message.context("Failed to read from agent bridge")? {
            Message::Text(text) => text,
            Message::Close(reason) => {
                anyhow::bail!("agent bridge closed the connection: {:?}", reason)
            }
            _ => continue,
        };
        match ServerMessage::decode(&text) {
            Some(ServerMessage::SessionStarted { audio_track }) => return Ok(audio_track),
            Some(ServerMessage::SessionError { message }) => {
                anyhow::bail!("agent bridge refused session: {}", message)
            }
            Some(other) => dispatch(other, producers, audio_track).await,
            None => {}
        }
    }
    anyhow::bail!("agent bridge closed the connection before the session started")
}

#[async_trait]
impl RealtimeSession for BridgeSession {
    async fn start(&self, identity: &PlayerIdentity) -> Result<()> {
        let mut outbound = self.outbound.lock().await;
        // Ensure that we haven't already connected.
        if outbound.is_some() {
            return Err(anyhow::anyhow!("already connected"));
        }
        let producers = self
            .producers
            .lock()
            .map_err(|_| anyhow::anyhow!("producer lock poisoned"))?
            .take()
            .ok_or_else(|| anyhow::anyhow!("agent bridge session has already ended"))?;

        let opened = tokio::time::timeout(
            self.config.start_timeout,
            self.open(identity, &producers),
        )
        .await
        .context("Timed out waiting for the agent bridge to start the session")
        .and_then(|opened| opened);
        let (mut write, mut read) = match opened {
            Ok(halves) => halves,
            Err(e) => {
                // Hand the channels back so the start can be retried.
                if let Ok(mut slot) = self.producers.lock() {
                    *slot = Some(producers);
                }
                return Err(e);
            }
        };

        let (c_tx, mut c_rx) = mpsc::channel::<ClientMessage>(CHANNEL_CAPACITY);

        // This task writes outgoing messages; it closes the socket after `session.stop`.
        tokio::spawn(async move {
            while let Some(message) = c_rx.recv().await {
                let stop = message == ClientMessage::SessionStop;
                match serde_json::to_string(&message) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::warn!("failed to send message: {}", e);
                            break;
                        }
                    }
                    Err(e) => tracing::error!("failed to serialize message: {}", e),
                }
                if stop {
                    break;
                }
            }
            if let Err(e) = write.close().await {
                tracing::debug!("failed to close agent bridge socket: {}", e);
            }
        });

        let audio_track = self.audio_track.clone();
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => {
                        tracing::debug!("received frame: {}", text);
                        if let Some(server_message) = ServerMessage::decode(&text) {
                            dispatch(server_message, &producers, &audio_track).await;
                        }
                    }
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message of {} bytes", bin.len());
                    }
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        break;
                    }
                    _ => {}
                }
            }
            producers.activity_tx.send_replace(AgentActivity::Idle);
            // Dropping the producers here ends the stage's event sources.
        });

        *outbound = Some(c_tx);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let Some(tx) = self.outbound.lock().await.take() else {
            return Ok(());
        };
        // The reader publishes `Idle` once the socket is closed.
        tx.send(ClientMessage::SessionStop)
            .await
            .context("Agent bridge writer has already shut down")?;
        Ok(())
    }

    fn activity(&self) -> watch::Receiver<AgentActivity> {
        self.activity_rx.clone()
    }

    fn audio_track(&self) -> Option<AudioTrack> {
        self.audio_track.lock().ok().and_then(|guard| guard.clone())
    }

    fn stage_inputs(&self) -> Option<mpsc::Receiver<StageInput>> {
        self.inputs_rx.lock().ok().and_then(|mut guard| guard.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StageAdapter;
    use improv_core::presentation;
    use improv_core::session_state::StageSession;
    use tokio::net::TcpListener;

    async fn bridge_server(
        replies: Vec<&'static str>,
        hang_up: bool,
    ) -> Result<(String, tokio::task::JoinHandle<Result<Vec<ClientMessage>>>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("ws://{}", listener.local_addr()?);
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await?;
            let mut ws = tokio_tungstenite::accept_async(stream).await?;
            let mut received: Vec<ClientMessage> = Vec::new();

            let first = ws.next().await.context("no session.start")??;
            received.push(serde_json::from_str(&first.into_text()?)?);
            for reply in replies {
                ws.send(Message::Text(reply.to_string())).await?;
            }
            if hang_up {
                ws.close(None).await?;
            }
            while let Some(Ok(message)) = ws.next().await {
                if let Message::Text(text) = message {
                    received.push(serde_json::from_str(&text)?);
                }
            }
            Ok::<_, anyhow::Error>(received)
        });
        Ok((url, handle))
    }

    fn config(url: String) -> BridgeConfig {
        BridgeConfig {
            url,
            token: None,
            agent_name: Some("host".to_string()),
            start_timeout: DEFAULT_START_TIMEOUT,
        }
    }

    #[tokio::test]
    async fn test_start_relays_activity_and_stage_events() -> Result<()> {
        let (url, server) = bridge_server(
            vec![
                r#"{"type":"session.started","audio_track":{"track_sid":"TR_host"}}"#,
                r#"{"type":"agent.state","state":"listening"}"#,
                r#"{"type":"scenario.announced","text":"A pirate at a job interview"}"#,
                r#"{"type":"round.advanced"}"#,
            ],
            false,
        )
        .await?;

        let session = BridgeSession::new(config(url));
        let mut activity = session.activity();
        let mut inputs = session.stage_inputs().context("inputs already taken")?;
        assert!(session.stage_inputs().is_none());

        session.start(&PlayerIdentity::new("Alex")?).await?;
        assert_eq!(
            session.audio_track(),
            Some(AudioTrack {
                track_sid: "TR_host".to_string()
            })
        );

        activity
            .wait_for(|a| *a == AgentActivity::Listening)
            .await?;
        assert_eq!(
            inputs.recv().await,
            Some(StageInput::AnnounceScenario(
                "A pirate at a job interview".to_string()
            ))
        );
        assert_eq!(inputs.recv().await, Some(StageInput::AdvanceRound));

        session.stop().await?;
        let received = server.await??;
        assert_eq!(
            received,
            vec![
                ClientMessage::SessionStart {
                    identity: "Alex".to_string(),
                    agent_name: Some("host".to_string()),
                },
                ClientMessage::SessionStop,
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_events_sent_before_session_started_are_kept() -> Result<()> {
        let (url, _server) = bridge_server(
            vec![
                r#"{"type":"scenario.announced","text":"A knight ordering fast food"}"#,
                r#"{"type":"agent.state","state":"speaking"}"#,
                r#"{"type":"session.started"}"#,
            ],
            false,
        )
        .await?;

        let session = BridgeSession::new(config(url));
        let mut inputs = session.stage_inputs().context("inputs already taken")?;
        session.start(&PlayerIdentity::new("Alex")?).await?;

        assert_eq!(
            inputs.recv().await,
            Some(StageInput::AnnounceScenario(
                "A knight ordering fast food".to_string()
            ))
        );
        assert_eq!(*session.activity().borrow(), AgentActivity::Speaking);
        Ok(())
    }

    #[tokio::test]
    async fn test_bridge_hang_up_ends_the_stage() -> Result<()> {
        let (url, _server) = bridge_server(
            vec![
                r#"{"type":"session.started"}"#,
                r#"{"type":"agent.state","state":"speaking"}"#,
            ],
            true,
        )
        .await?;

        let session = BridgeSession::new(config(url));
        let inputs = session.stage_inputs();
        let activity = session.activity();
        session.start(&PlayerIdentity::new("Alex")?).await?;

        let stage = Arc::new(tokio::sync::Mutex::new(StageSession::new(
            PlayerIdentity::new("Alex")?,
        )));
        let (views_tx, mut views_rx) = mpsc::channel(16);
        let _adapter = StageAdapter::spawn(stage, activity, inputs, views_tx);

        let last = tokio::time::timeout(Duration::from_secs(3), async {
            let mut last = None;
            while let Some(view) = views_rx.recv().await {
                last = Some(view);
            }
            last
        })
        .await
        .context("view stream stayed open after the bridge hung up")?
        .context("no view was published")?;
        assert_eq!(last.presentation, presentation::IDLE);
        Ok(())
    }

    #[tokio::test]
    async fn test_refused_session_is_an_error() -> Result<()> {
        let (url, _server) = bridge_server(
            vec![r#"{"type":"session.error","message":"room is full"}"#],
            false,
        )
        .await?;

        let session = BridgeSession::new(config(url));
        let err = session
            .start(&PlayerIdentity::new("Alex")?)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("room is full"));
        // A refused start can be retried.
        assert!(session.outbound.lock().await.is_none());
        assert!(session.producers.lock().unwrap().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_silent_server_times_out() -> Result<()> {
        // Accepts the TCP connection but never answers the WebSocket upgrade.
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("ws://{}", listener.local_addr()?);
        let _server = tokio::spawn(async move {
            let held = listener.accept().await;
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(held);
        });

        let session = BridgeSession::new(BridgeConfig {
            start_timeout: Duration::from_millis(200),
            ..config(url)
        });
        let err = session
            .start(&PlayerIdentity::new("Alex")?)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Timed out"));
        assert!(session.producers.lock().unwrap().is_some());
        Ok(())
    }

    #[test]
    fn test_request_carries_bearer_token() -> Result<()> {
        let request = build_request(&BridgeConfig {
            url: "ws://127.0.0.1:7880/agent".to_string(),
            token: Some(SecretString::from("tok".to_string())),
            agent_name: None,
            start_timeout: DEFAULT_START_TIMEOUT,
        })?;
        assert_eq!(request.headers()[AUTHORIZATION_HEADER], "Bearer tok");
        Ok(())
    }
}

//! WebSocket Match Server
//!
//! Async WebSocket server for duel connections.
//! Decodes lobby and game commands, drives the match registry and delivers
//! replies and broadcasts to the connected players.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock, broadcast};
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{Sink, SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::game::error::MatchError;
use crate::game::participant::SessionId;
use crate::game::service::{LeaveOutcome, MatchConfig, MatchService};
use crate::game::state::MatchId;
use crate::network::protocol::{
    ClientMessage, ServerMessage, CreateMatchPayload, JoinMatchPayload, SetReadyPayload,
    StartMatchPayload, SubmitMovePayload, MatchCreatedPayload, PlayerJoinedPayload,
    ReadyUpdatedPayload, PlayerLeftPayload, ErrorSeverity,
};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Outbound queue depth per connection.
    pub outbound_buffer: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 1000,
            outbound_buffer: 64,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `CUBE_DUEL_BIND_ADDR`, `CUBE_DUEL_MAX_CONNECTIONS`
    /// and `CUBE_DUEL_OUTBOUND_BUFFER`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_or("CUBE_DUEL_BIND_ADDR", defaults.bind_addr),
            max_connections: env_or("CUBE_DUEL_MAX_CONNECTIONS", defaults.max_connections),
            outbound_buffer: env_or("CUBE_DUEL_OUTBOUND_BUFFER", defaults.outbound_buffer).max(1),
            version: defaults.version,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr>(key: &str, raw: &str, default: T) -> T {
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = raw, "Ignoring invalid setting");
            default
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Outbound message could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Connected client state.
struct ConnectedClient {
    /// Peer address.
    addr: SocketAddr,
    /// Message sender (for direct messaging to client).
    sender: mpsc::Sender<ServerMessage>,
}

type Clients = Arc<RwLock<BTreeMap<SessionId, ConnectedClient>>>;

/// The match server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Match registry.
    matches: Arc<MatchService>,
    /// Connected clients, keyed by the session assigned on accept.
    clients: Clients,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new server with a fresh registry.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_matches(config, Arc::new(MatchService::new(MatchConfig::default())))
    }

    /// Create a server around an existing registry.
    pub fn with_matches(config: ServerConfig, matches: Arc<MatchService>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            matches,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Bind and run the server until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!(
            addr = %listener.local_addr()?,
            version = %self.config.version,
            "Match server listening"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let matches = self.matches.clone();
        let buffer = self.config.outbound_buffer.max(1);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let session_id = SessionId::new();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(buffer);

            // Register client
            clients.write().await.insert(session_id, ConnectedClient {
                addr,
                sender: msg_tx.clone(),
            });
            debug!(session = %session_id, "Client {} registered", addr);

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    if let Err(e) = Self::write_message(&mut ws_sender, &msg).await {
                        debug!("Write to {} failed: {}", addr, e);
                        break;
                    }
                }
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                #[cfg(feature = "debug-tracing")]
                                debug!(session = %session_id, frame = %text, "Inbound frame");

                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        let _ = msg_tx.send(ServerMessage::error(
                                            "Invalid message format",
                                            ErrorSeverity::Warning,
                                        )).await;
                                        continue;
                                    }
                                };

                                Self::handle_client_message(
                                    session_id,
                                    client_msg,
                                    &matches,
                                    &clients,
                                    &msg_tx,
                                ).await;
                            }
                            Some(Ok(Message::Binary(_))) => {
                                debug!("Ignoring binary frame from {}", addr);
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                warn!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup
            clients.write().await.remove(&session_id);

            match matches.leave_by_session(session_id).await {
                Ok(outcome) => Self::announce_leave(outcome, &matches, &clients).await,
                Err(MatchError::NotInMatch) => {}
                Err(e) => debug!(session = %session_id, "Leave on disconnect failed: {}", e),
            }

            sender_task.abort();
            info!("Client {} cleaned up", addr);
        });
    }

    /// Encode and write one outbound message.
    async fn write_message<S>(ws_sender: &mut S, msg: &ServerMessage) -> Result<(), GameServerError>
    where
        S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
    {
        let text = msg.to_json()?;
        ws_sender.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Handle a client message. Rejections are reported to the sender only.
    async fn handle_client_message(
        session_id: SessionId,
        msg: ClientMessage,
        matches: &Arc<MatchService>,
        clients: &Clients,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        let command = msg.kind();

        let result = match msg {
            ClientMessage::LobbyCreateMatch(req) => {
                Self::handle_create_match(session_id, req, matches, clients, sender).await
            }
            ClientMessage::LobbyJoinMatch(req) => {
                Self::handle_join_match(session_id, req, matches, clients).await
            }
            ClientMessage::LobbySetReady(req) => {
                Self::handle_set_ready(req, matches, clients).await
            }
            ClientMessage::LobbyStartMatch(req) => {
                Self::handle_start_match(session_id, req, matches, clients).await
            }
            ClientMessage::LobbyLeaveMatch(_) => {
                Self::handle_leave_match(session_id, matches, clients, sender).await
            }
            ClientMessage::GameSubmitMove(req) => {
                Self::handle_submit_move(session_id, req, matches, clients, sender).await
            }
        };

        if let Err(err) = result {
            debug!(session = %session_id, ?command, "Command rejected: {}", err);
            let _ = sender.send(ServerMessage::rejected(command, &err)).await;
        }
    }

    /// Handle match creation: allocate a lobby and seat the creator.
    async fn handle_create_match(
        session_id: SessionId,
        req: CreateMatchPayload,
        matches: &Arc<MatchService>,
        clients: &Clients,
        sender: &mpsc::Sender<ServerMessage>,
    ) -> Result<(), MatchError> {
        if let Some(bound) = matches.match_of(session_id) {
            return Err(MatchError::SessionBusy(bound));
        }

        let match_id = matches.create_match();
        let snapshot = matches
            .join_match(&match_id, session_id, req.player_id.clone())
            .await?;

        let _ = sender.send(ServerMessage::LobbyMatchCreated(MatchCreatedPayload {
            match_id: match_id.clone(),
        })).await;

        Self::broadcast(&match_id, ServerMessage::LobbyPlayerJoined(PlayerJoinedPayload {
            match_id: match_id.clone(),
            player_id: req.player_id,
            players: snapshot.players,
        }), matches, clients).await;

        Ok(())
    }

    /// Handle join.
    async fn handle_join_match(
        session_id: SessionId,
        req: JoinMatchPayload,
        matches: &Arc<MatchService>,
        clients: &Clients,
    ) -> Result<(), MatchError> {
        let snapshot = matches
            .join_match(&req.match_id, session_id, req.player_id.clone())
            .await?;

        Self::broadcast(&req.match_id, ServerMessage::LobbyPlayerJoined(PlayerJoinedPayload {
            match_id: req.match_id.clone(),
            player_id: req.player_id,
            players: snapshot.players,
        }), matches, clients).await;

        Ok(())
    }

    /// Handle ready toggle.
    async fn handle_set_ready(
        req: SetReadyPayload,
        matches: &Arc<MatchService>,
        clients: &Clients,
    ) -> Result<(), MatchError> {
        let snapshot = matches
            .set_ready(&req.match_id, &req.player_id, req.ready)
            .await?;

        Self::broadcast(&req.match_id, ServerMessage::LobbyReadyUpdated(ReadyUpdatedPayload {
            match_id: req.match_id.clone(),
            player_id: req.player_id,
            ready: req.ready,
            players: snapshot.players,
        }), matches, clients).await;

        Ok(())
    }

    /// Handle start: announce the race, then hand every player their cube.
    async fn handle_start_match(
        session_id: SessionId,
        req: StartMatchPayload,
        matches: &Arc<MatchService>,
        clients: &Clients,
    ) -> Result<(), MatchError> {
        let start = matches.try_start_match(&req.match_id, session_id).await?;

        Self::broadcast(
            &req.match_id,
            ServerMessage::GameMatchStarted((&start.snapshot).into()),
            matches,
            clients,
        ).await;

        for (owner, view) in start.cubes {
            Self::send_to(clients, owner, ServerMessage::GameCubeState(view.into())).await;
        }

        Ok(())
    }

    /// Handle explicit leave.
    async fn handle_leave_match(
        session_id: SessionId,
        matches: &Arc<MatchService>,
        clients: &Clients,
        sender: &mpsc::Sender<ServerMessage>,
    ) -> Result<(), MatchError> {
        let outcome = matches.leave_by_session(session_id).await?;

        let players = outcome
            .remaining
            .as_ref()
            .map(|s| s.players.clone())
            .unwrap_or_default();
        let _ = sender.send(ServerMessage::LobbyLeftMatch(PlayerLeftPayload {
            match_id: outcome.match_id.clone(),
            player_id: outcome.player_id.clone(),
            players,
        })).await;

        Self::announce_leave(outcome, matches, clients).await;
        Ok(())
    }

    /// Handle a move: everyone sees the move, only the mover gets the cube.
    async fn handle_submit_move(
        session_id: SessionId,
        req: SubmitMovePayload,
        matches: &Arc<MatchService>,
        clients: &Clients,
        sender: &mpsc::Sender<ServerMessage>,
    ) -> Result<(), MatchError> {
        let outcome = matches
            .apply_move(&req.match_id, session_id, &req.notation)
            .await?;

        Self::broadcast(
            &req.match_id,
            ServerMessage::GameMoveApplied(outcome.event.into()),
            matches,
            clients,
        ).await;

        let _ = sender.send(ServerMessage::GameCubeState(outcome.cube.into())).await;
        Ok(())
    }

    /// Tell the players still seated that someone left.
    async fn announce_leave(outcome: LeaveOutcome, matches: &Arc<MatchService>, clients: &Clients) {
        let Some(remaining) = outcome.remaining else {
            return;
        };

        Self::broadcast(&outcome.match_id, ServerMessage::LobbyLeftMatch(PlayerLeftPayload {
            match_id: outcome.match_id.clone(),
            player_id: outcome.player_id,
            players: remaining.players,
        }), matches, clients).await;
    }

    /// Send to every session seated in the match right now.
    async fn broadcast(
        match_id: &MatchId,
        msg: ServerMessage,
        matches: &Arc<MatchService>,
        clients: &Clients,
    ) {
        for session_id in matches.sessions_of(match_id).await {
            Self::send_to(clients, session_id, msg.clone()).await;
        }
    }

    /// Send to one session without waiting on it. A connection whose queue
    /// is full or closed misses the message; the caller's own handling must
    /// never stall behind a peer that stopped reading.
    async fn send_to(clients: &Clients, session_id: SessionId, msg: ServerMessage) {
        let target = clients
            .read()
            .await
            .get(&session_id)
            .map(|c| (c.addr, c.sender.clone()));

        match target {
            Some((addr, sender)) => match sender.try_send(msg) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(session = %session_id, "Outbound queue full, dropping message for {}", addr);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Skipping closed connection {}", addr);
                }
            },
            None => debug!(session = %session_id, "Skipping unknown session"),
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Match registry backing this server.
    pub fn matches(&self) -> &Arc<MatchService> {
        &self.matches
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.outbound_buffer, 64);
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_parse_or_falls_back() {
        assert_eq!(parse_or("K", " 12 ", 5usize), 12);
        assert_eq!(parse_or("K", "lots", 5usize), 5);

        let addr: SocketAddr = parse_or("K", "127.0.0.1:9000", SocketAddr::from(([0, 0, 0, 0], 1)));
        assert_eq!(addr.port(), 9000);
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = GameServer::new(ServerConfig::default());

        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.matches().match_count(), 0);
        assert_eq!(server.matches().config().max_players, 2);
    }

    #[tokio::test]
    async fn test_send_to_skips_full_queue() {
        let clients: Clients = Arc::new(RwLock::new(BTreeMap::new()));
        let (tx, mut rx) = mpsc::channel(1);
        let session = SessionId::new();
        clients.write().await.insert(session, ConnectedClient {
            addr: SocketAddr::from(([127, 0, 0, 1], 1)),
            sender: tx,
        });

        GameServer::send_to(&clients, session, ServerMessage::error("first", ErrorSeverity::Info)).await;

        // Queue is full: the second message is dropped instead of waited on
        tokio::time::timeout(
            Duration::from_millis(500),
            GameServer::send_to(&clients, session, ServerMessage::error("second", ErrorSeverity::Info)),
        )
        .await
        .expect("send_to blocked on a full queue");

        match rx.recv().await {
            Some(ServerMessage::SysError(payload)) => assert_eq!(payload.message, "first"),
            other => panic!("Unexpected message: {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_to_skips_closed_connection() {
        let clients: Clients = Arc::new(RwLock::new(BTreeMap::new()));
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let session = SessionId::new();
        clients.write().await.insert(session, ConnectedClient {
            addr: SocketAddr::from(([127, 0, 0, 1], 1)),
            sender: tx,
        });

        GameServer::send_to(&clients, session, ServerMessage::error("gone", ErrorSeverity::Info)).await;
        GameServer::send_to(&clients, SessionId::new(), ServerMessage::error("nobody", ErrorSeverity::Info)).await;
    }

    #[tokio::test]
    async fn test_server_shutdown() {
        let server = Arc::new(GameServer::new(ServerConfig::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let running = server.clone();
        let handle = tokio::spawn(async move { running.serve(listener).await });

        // Let the accept loop subscribe before signalling
        tokio::time::sleep(Duration::from_millis(50)).await;
        server.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("serve did not stop")
            .unwrap();
        assert!(result.is_ok());
    }
}

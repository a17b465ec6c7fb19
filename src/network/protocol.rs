//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is a JSON envelope `{ "type": ..., "payload": ... }` with the
//! type in SCREAMING_SNAKE_CASE and payload fields in camelCase.

use serde::{Serialize, Deserialize};

use crate::cube::moves::to_notation;
use crate::game::error::MatchError;
use crate::game::participant::{PlayerId, PlayerInfo};
use crate::game::service::MoveAppliedEvent;
use crate::game::state::{CubeView, MatchId, MatchSnapshot};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Open a new match and take its first seat.
    LobbyCreateMatch(CreateMatchPayload),

    /// Take a seat in an existing match.
    LobbyJoinMatch(JoinMatchPayload),

    /// Toggle ready.
    LobbySetReady(SetReadyPayload),

    /// Host starts the race.
    LobbyStartMatch(StartMatchPayload),

    /// Leave the current match.
    LobbyLeaveMatch(LeaveMatchPayload),

    /// Turn a face.
    GameSubmitMove(SubmitMovePayload),
}

/// Create-match request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchPayload {
    /// Creator's player id.
    pub player_id: PlayerId,
}

/// Join-match request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinMatchPayload {
    /// Match to join.
    pub match_id: MatchId,
    /// Joining player's id.
    pub player_id: PlayerId,
}

/// Ready toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetReadyPayload {
    /// Match id.
    pub match_id: MatchId,
    /// Player whose flag changes.
    pub player_id: PlayerId,
    /// New flag value.
    pub ready: bool,
}

/// Start request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMatchPayload {
    /// Match to start.
    pub match_id: MatchId,
}

/// Leave request. The match is resolved from the connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveMatchPayload {}

/// Move submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMovePayload {
    /// Match id.
    pub match_id: MatchId,
    /// Move notation, e.g. `"R'"`.
    #[serde(rename = "move")]
    pub notation: String,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Reply to the creator.
    LobbyMatchCreated(MatchCreatedPayload),

    /// A player took a seat.
    LobbyPlayerJoined(PlayerJoinedPayload),

    /// A ready flag changed.
    LobbyReadyUpdated(ReadyUpdatedPayload),

    /// A player left.
    LobbyLeftMatch(PlayerLeftPayload),

    /// Race started.
    GameMatchStarted(MatchStartedPayload),

    /// A player's cube, sent to its owner.
    GameCubeState(CubeStatePayload),

    /// A move was accepted.
    GameMoveApplied(MoveAppliedPayload),

    /// A request was rejected.
    SysError(ErrorPayload),
}

/// Match created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCreatedPayload {
    /// New match id.
    pub match_id: MatchId,
}

/// Player joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoinedPayload {
    /// Match id.
    pub match_id: MatchId,
    /// Joining player.
    pub player_id: PlayerId,
    /// Seated players after the join.
    pub players: Vec<PlayerInfo>,
}

/// Ready flag changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyUpdatedPayload {
    /// Match id.
    pub match_id: MatchId,
    /// Player whose flag changed.
    pub player_id: PlayerId,
    /// New flag value.
    pub ready: bool,
    /// Seated players after the change.
    pub players: Vec<PlayerInfo>,
}

/// Player left.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeftPayload {
    /// Match id.
    pub match_id: MatchId,
    /// Departed player.
    pub player_id: PlayerId,
    /// Remaining players.
    pub players: Vec<PlayerInfo>,
}

/// Race started.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStartedPayload {
    /// Match id.
    pub match_id: MatchId,
    /// Start time (Unix millis).
    pub started_at: i64,
    /// Seed the scramble was generated from.
    pub scramble_seed: u64,
    /// Scramble in notation.
    pub scramble: Vec<String>,
    /// Seated players.
    pub players: Vec<PlayerInfo>,
}

impl From<&MatchSnapshot> for MatchStartedPayload {
    fn from(snapshot: &MatchSnapshot) -> Self {
        Self {
            match_id: snapshot.match_id.clone(),
            started_at: snapshot.started_at.map(|t| t.timestamp_millis()).unwrap_or_default(),
            scramble_seed: snapshot.scramble_seed.unwrap_or_default(),
            scramble: to_notation(&snapshot.scramble),
            players: snapshot.players.clone(),
        }
    }
}

/// Cube state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeStatePayload {
    /// Match id.
    pub match_id: MatchId,
    /// Cube owner.
    pub player_id: PlayerId,
    /// 54 symbols, faces U D L R F B, each row-major.
    pub facelets: String,
    /// Moves made since the start.
    pub move_count: u32,
    /// Every face monochrome.
    pub solved: bool,
}

impl From<CubeView> for CubeStatePayload {
    fn from(view: CubeView) -> Self {
        Self {
            match_id: view.match_id,
            player_id: view.player_id,
            facelets: view.facelets,
            move_count: view.move_count,
            solved: view.solved,
        }
    }
}

/// Move accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveAppliedPayload {
    /// Match id.
    pub match_id: MatchId,
    /// Mover.
    pub player_id: PlayerId,
    /// Canonical notation of the move.
    #[serde(rename = "move")]
    pub notation: String,
    /// Match-wide sequence number.
    pub sequence: u64,
    /// Server time (Unix millis).
    pub server_timestamp: i64,
}

impl From<MoveAppliedEvent> for MoveAppliedPayload {
    fn from(event: MoveAppliedEvent) -> Self {
        Self {
            match_id: event.match_id,
            player_id: event.player_id,
            notation: event.applied.notation().to_string(),
            sequence: event.sequence,
            server_timestamp: event.server_timestamp.timestamp_millis(),
        }
    }
}

/// Error report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable reason.
    pub message: String,
    /// How loudly the client should surface it.
    pub severity: ErrorSeverity,
}

/// Error severity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorSeverity {
    /// Harmless, e.g. joining a full match.
    Info,
    /// Request made at the wrong time or with bad input.
    Warning,
    /// Client and server disagree about membership.
    Critical,
}

/// Which command an error answers; severity depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Create match.
    CreateMatch,
    /// Join match.
    JoinMatch,
    /// Set ready.
    SetReady,
    /// Start match.
    StartMatch,
    /// Leave match.
    LeaveMatch,
    /// Submit move.
    SubmitMove,
}

impl ClientMessage {
    /// Command this message carries.
    pub fn kind(&self) -> CommandKind {
        match self {
            ClientMessage::LobbyCreateMatch(_) => CommandKind::CreateMatch,
            ClientMessage::LobbyJoinMatch(_) => CommandKind::JoinMatch,
            ClientMessage::LobbySetReady(_) => CommandKind::SetReady,
            ClientMessage::LobbyStartMatch(_) => CommandKind::StartMatch,
            ClientMessage::LobbyLeaveMatch(_) => CommandKind::LeaveMatch,
            ClientMessage::GameSubmitMove(_) => CommandKind::SubmitMove,
        }
    }
}

/// Severity to report a rejected command with.
pub fn error_severity(command: CommandKind, err: &MatchError) -> ErrorSeverity {
    match (command, err) {
        // The creator could not even sit in their own fresh match
        (CommandKind::CreateMatch, _) => ErrorSeverity::Critical,
        (CommandKind::JoinMatch, MatchError::MatchNotFound(_)) => ErrorSeverity::Warning,
        (CommandKind::JoinMatch, _) => ErrorSeverity::Info,
        (CommandKind::LeaveMatch, _) => ErrorSeverity::Info,
        (_, MatchError::MatchNotFound(_) | MatchError::NotInMatch) => ErrorSeverity::Critical,
        _ => ErrorSeverity::Warning,
    }
}

impl ServerMessage {
    /// Error message for a rejected command.
    pub fn rejected(command: CommandKind, err: &MatchError) -> Self {
        ServerMessage::SysError(ErrorPayload {
            message: err.to_string(),
            severity: error_severity(command, err),
        })
    }

    /// Error message with explicit text.
    pub fn error(message: impl Into<String>, severity: ErrorSeverity) -> Self {
        ServerMessage::SysError(ErrorPayload {
            message: message.into(),
            severity,
        })
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

//! Network Layer
//!
//! WebSocket server for duel lobbies and races.
//! This layer owns no match state - everything goes through `game::MatchService`.

pub mod protocol;
pub mod server;

pub use protocol::{ClientMessage, CommandKind, ErrorSeverity, ServerMessage, error_severity};
pub use server::{GameServer, GameServerError, ServerConfig};

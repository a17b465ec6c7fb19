//! Match Logic Module
//!
//! Match lifecycle, participants and the concurrent match registry.
//!
//! ## Module Structure
//!
//! - `participant`: player/session identities and seat records
//! - `state`: per-match record and `Lobby -> Running -> Finished` machine
//! - `service`: registry and per-match serialized operations
//! - `error`: rejected-operation taxonomy

pub mod error;
pub mod participant;
pub mod service;
pub mod state;

// Re-export key types
pub use error::{ErrorKind, MatchError};
pub use participant::{MatchParticipant, ParticipantRole, PlayerId, PlayerInfo, SessionId};
pub use service::{LeaveOutcome, MatchConfig, MatchService, MatchStart, MoveAppliedEvent, MoveOutcome, MAX_PLAYERS};
pub use state::{CubeView, Match, MatchId, MatchPhase, MatchSnapshot};

//! Match Errors
//!
//! Every rejected match operation reports one of these. None of them are
//! fatal: the match and the registry stay usable afterwards.

use thiserror::Error;

use crate::cube::moves::MoveParseError;

use super::participant::PlayerId;
use super::state::MatchId;

/// Why a match operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No match with this id.
    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    /// Operation only allowed while the match is in the lobby.
    #[error("match {0} has already started")]
    NotInLobby(MatchId),

    /// Operation only allowed while the match is running.
    #[error("match {0} is not running")]
    NotRunning(MatchId),

    /// Player is already seated in this match.
    #[error("player already in match: {0}")]
    AlreadyInMatch(PlayerId),

    /// Connection is already bound to another match.
    #[error("connection is already in match {0}")]
    SessionBusy(MatchId),

    /// Match has no free seat.
    #[error("match {0} is full")]
    MatchFull(MatchId),

    /// Caller is not a participant of the match.
    #[error("not part of this match")]
    NotInMatch,

    /// Caller is not the host.
    #[error("only the host can start match {0}")]
    NotHost(MatchId),

    /// Not every seat is filled by a ready player.
    #[error("not all players are ready in match {0}")]
    NotReady(MatchId),

    /// Move token could not be parsed.
    #[error(transparent)]
    InvalidMove(#[from] MoveParseError),
}

/// Coarse failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Match id unknown.
    NotFound,
    /// Operation not legal in the current match phase.
    InvalidState,
    /// Non-host attempting a host-only action.
    NotAuthorized,
    /// Caller not bound to the match.
    NotMember,
    /// Match full.
    Capacity,
    /// Player or connection already present.
    Duplicate,
    /// Unparseable move token.
    InvalidMove,
}

impl MatchError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::MatchNotFound(_) => ErrorKind::NotFound,
            MatchError::NotInLobby(_) | MatchError::NotRunning(_) | MatchError::NotReady(_) => {
                ErrorKind::InvalidState
            }
            MatchError::NotHost(_) => ErrorKind::NotAuthorized,
            MatchError::NotInMatch => ErrorKind::NotMember,
            MatchError::MatchFull(_) => ErrorKind::Capacity,
            MatchError::AlreadyInMatch(_) | MatchError::SessionBusy(_) => ErrorKind::Duplicate,
            MatchError::InvalidMove(_) => ErrorKind::InvalidMove,
        }
    }
}

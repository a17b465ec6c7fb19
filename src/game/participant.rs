//! Match Participants
//!
//! Identity types and the per-player lobby record.

use std::fmt;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable, client-chosen player identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wrap a raw player id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as str.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Opaque transport connection identity.
///
/// Assigned by the server per accepted connection; distinct from [`PlayerId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Fresh random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// PARTICIPANT
// =============================================================================

/// Authority a participant holds in its match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    /// May start the match.
    Host,
    /// Everyone else.
    Guest,
}

/// A player seated in a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchParticipant {
    /// Player identity.
    pub player_id: PlayerId,
    /// Connection the player joined from.
    pub session_id: SessionId,
    /// Lobby ready flag.
    pub ready: bool,
}

impl MatchParticipant {
    /// New participant, not ready.
    pub fn new(player_id: PlayerId, session_id: SessionId) -> Self {
        Self {
            player_id,
            session_id,
            ready: false,
        }
    }
}

/// Public view of a participant, as listed in lobby and start messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    /// Player identity.
    pub player_id: PlayerId,
    /// Lobby ready flag.
    pub ready: bool,
    /// Host or guest.
    pub role: ParticipantRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_participant_not_ready() {
        let p = MatchParticipant::new(PlayerId::new("alice"), SessionId::new());
        assert!(!p.ready);
        assert_eq!(p.player_id.as_str(), "alice");
    }

    #[test]
    fn test_session_ids_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_player_info_wire_shape() {
        let info = PlayerInfo {
            player_id: PlayerId::new("bob"),
            ready: true,
            role: ParticipantRole::Host,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json, serde_json::json!({ "playerId": "bob", "ready": true, "role": "HOST" }));
    }
}

//! Match State Definitions
//!
//! The per-match record and its phase machine. A `Match` is only ever
//! touched through [`MatchService`](super::service::MatchService), which holds
//! the match's lock for the whole of each operation; the mutators here
//! therefore assume exclusive access and do no locking of their own.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::cube::moves::Move;
use crate::cube::state::CubeState;

use super::participant::{MatchParticipant, ParticipantRole, PlayerId, PlayerInfo, SessionId};

// =============================================================================
// MATCH ID
// =============================================================================

/// Opaque match identity (UUID string).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow as str.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MatchId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// PHASE
// =============================================================================

/// Match lifecycle phase. Only ever advances `Lobby -> Running -> Finished`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchPhase {
    /// Players joining and readying up.
    Lobby,
    /// Race in progress.
    Running,
    /// Race over. Terminal.
    Finished,
}

impl MatchPhase {
    /// The phase directly after this one, if any.
    pub fn next(self) -> Option<MatchPhase> {
        match self {
            MatchPhase::Lobby => Some(MatchPhase::Running),
            MatchPhase::Running => Some(MatchPhase::Finished),
            MatchPhase::Finished => None,
        }
    }
}

// =============================================================================
// MATCH
// =============================================================================

/// A two-player race.
#[derive(Debug)]
pub struct Match {
    id: MatchId,
    phase: MatchPhase,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    /// Seated players in join order.
    participants: Vec<MatchParticipant>,
    host: Option<PlayerId>,
    scramble_seed: Option<u64>,
    scramble: Vec<Move>,
    cubes: BTreeMap<PlayerId, CubeState>,
    move_counts: BTreeMap<PlayerId, u32>,
    move_seq: u64,
    /// Set once the match has been dropped from the registry.
    closed: bool,
}

impl Match {
    /// Create an empty lobby.
    pub fn new(id: MatchId) -> Self {
        Self {
            id,
            phase: MatchPhase::Lobby,
            started_at: None,
            ended_at: None,
            participants: Vec::new(),
            host: None,
            scramble_seed: None,
            scramble: Vec::new(),
            cubes: BTreeMap::new(),
            move_counts: BTreeMap::new(),
            move_seq: 0,
            closed: false,
        }
    }

    /// Match id.
    pub fn id(&self) -> &MatchId {
        &self.id
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Host player, if anyone is seated.
    pub fn host(&self) -> Option<&PlayerId> {
        self.host.as_ref()
    }

    /// Seated players in join order.
    pub fn participants(&self) -> &[MatchParticipant] {
        &self.participants
    }

    /// Number of seated players.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Check if a player is seated.
    pub fn contains_player(&self, player_id: &PlayerId) -> bool {
        self.participants.iter().any(|p| &p.player_id == player_id)
    }

    /// Participant that joined from `session_id`.
    pub fn participant_by_session(&self, session_id: SessionId) -> Option<&MatchParticipant> {
        self.participants.iter().find(|p| p.session_id == session_id)
    }

    /// Role of a seated player.
    pub fn role_of(&self, player_id: &PlayerId) -> ParticipantRole {
        if self.host.as_ref() == Some(player_id) {
            ParticipantRole::Host
        } else {
            ParticipantRole::Guest
        }
    }

    /// Live cube of a player (present from `Running` on).
    pub fn cube_of(&self, player_id: &PlayerId) -> Option<&CubeState> {
        self.cubes.get(player_id)
    }

    /// Moves a player has made since the start.
    pub fn move_count_of(&self, player_id: &PlayerId) -> u32 {
        self.move_counts.get(player_id).copied().unwrap_or(0)
    }

    /// Scramble applied at start (empty in the lobby).
    pub fn scramble(&self) -> &[Move] {
        &self.scramble
    }

    /// Check if the match has been dropped from the registry.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Session ids of all seated players.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.participants.iter().map(|p| p.session_id).collect()
    }

    /// Public player list.
    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        self.participants
            .iter()
            .map(|p| PlayerInfo {
                player_id: p.player_id.clone(),
                ready: p.ready,
                role: self.role_of(&p.player_id),
            })
            .collect()
    }

    /// Point-in-time copy for outbound messages.
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            match_id: self.id.clone(),
            phase: self.phase,
            started_at: self.started_at,
            ended_at: self.ended_at,
            scramble_seed: self.scramble_seed,
            scramble: self.scramble.clone(),
            players: self.player_infos(),
        }
    }

    /// Cube view for one player, if the match has cubes.
    pub fn cube_view(&self, player_id: &PlayerId) -> Option<CubeView> {
        let cube = self.cubes.get(player_id)?;
        Some(CubeView {
            match_id: self.id.clone(),
            player_id: player_id.clone(),
            facelets: cube.facelets(),
            move_count: self.move_count_of(player_id),
            solved: cube.is_solved(),
        })
    }

    // -------------------------------------------------------------------------
    // Mutators (caller holds the match lock)
    // -------------------------------------------------------------------------

    /// Seat a player. The first player into an empty match becomes host.
    pub(crate) fn add_participant(&mut self, participant: MatchParticipant) {
        if self.host.is_none() && self.participants.is_empty() {
            self.host = Some(participant.player_id.clone());
        }
        self.participants.push(participant);
    }

    /// Unseat a player. Host passes to the earliest remaining participant.
    pub(crate) fn remove_participant(&mut self, player_id: &PlayerId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| &p.player_id != player_id);
        if self.participants.len() == before {
            return false;
        }

        if self.host.as_ref() == Some(player_id) {
            self.host = self.participants.first().map(|p| p.player_id.clone());
        }
        true
    }

    /// Set a player's ready flag.
    pub(crate) fn set_ready(&mut self, player_id: &PlayerId, ready: bool) -> bool {
        match self.participants.iter_mut().find(|p| &p.player_id == player_id) {
            Some(p) => {
                p.ready = ready;
                true
            }
            None => false,
        }
    }

    /// All `expected` seats are filled and every player is ready.
    pub(crate) fn all_ready(&self, expected: usize) -> bool {
        self.participants.len() >= expected && self.participants.iter().all(|p| p.ready)
    }

    /// Move from `Lobby` to `Running`: every player gets a fresh cube with
    /// `scramble` applied, counters reset, ready flags cleared.
    pub(crate) fn start(&mut self, seed: u64, scramble: Vec<Move>, now: DateTime<Utc>) -> bool {
        if !self.advance_to(MatchPhase::Running) {
            return false;
        }
        self.started_at = Some(now);

        let cube = CubeState::scrambled(&scramble);
        self.scramble_seed = Some(seed);
        self.scramble = scramble;

        for p in &mut self.participants {
            self.cubes.insert(p.player_id.clone(), cube.clone());
            self.move_counts.insert(p.player_id.clone(), 0);
            p.ready = false;
        }
        true
    }

    /// Apply a move to one player's cube and bump their counter.
    pub(crate) fn apply_move_for(&mut self, player_id: &PlayerId, m: Move) -> bool {
        let Some(cube) = self.cubes.get_mut(player_id) else {
            return false;
        };
        cube.apply(m);
        *self.move_counts.entry(player_id.clone()).or_insert(0) += 1;
        true
    }

    /// Next match-wide move sequence number, starting at 1.
    pub(crate) fn next_move_seq(&mut self) -> u64 {
        self.move_seq += 1;
        self.move_seq
    }

    /// Move from `Running` to `Finished`.
    pub(crate) fn finish(&mut self, now: DateTime<Utc>) -> bool {
        if !self.advance_to(MatchPhase::Finished) {
            return false;
        }
        self.ended_at = Some(now);
        true
    }

    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
    }

    fn advance_to(&mut self, target: MatchPhase) -> bool {
        if self.phase.next() == Some(target) {
            self.phase = target;
            true
        } else {
            false
        }
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// Copy of a match taken while its lock was held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSnapshot {
    /// Match id.
    pub match_id: MatchId,
    /// Phase at snapshot time.
    pub phase: MatchPhase,
    /// When the race started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the race finished.
    pub ended_at: Option<DateTime<Utc>>,
    /// Seed the scramble was drawn from.
    pub scramble_seed: Option<u64>,
    /// Scramble sequence.
    pub scramble: Vec<Move>,
    /// Seated players in join order.
    pub players: Vec<PlayerInfo>,
}

/// One player's cube after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeView {
    /// Match id.
    pub match_id: MatchId,
    /// Cube owner.
    pub player_id: PlayerId,
    /// 54 facelet symbols.
    pub facelets: String,
    /// Moves made since the start.
    pub move_count: u32,
    /// Every face monochrome.
    pub solved: bool,
}

//! Match Registry
//!
//! Process-wide table of matches and the session that occupies each seat.
//!
//! ## Locking
//!
//! - The two tables are `DashMap`s, so lookups, inserts and removals from
//!   many connections never contend on one global lock.
//! - Every match sits behind its own `tokio::sync::Mutex`. Each operation
//!   clones the match's `Arc` out of the table (releasing the shard lock),
//!   then holds the match lock for its whole read-modify-write. Operations on
//!   different matches run fully in parallel.
//! - Nothing here performs I/O. Callers get snapshots back and do their
//!   sending after the lock is gone.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::core::rng::derive_match_seed;
use crate::cube::moves::Move;
use crate::cube::scramble::{self, DEFAULT_SCRAMBLE_LENGTH};

use super::error::MatchError;
use super::participant::{MatchParticipant, PlayerId, SessionId};
use super::state::{CubeView, Match, MatchId, MatchPhase, MatchSnapshot};

/// Maximum participants per match.
pub const MAX_PLAYERS: usize = 2;

/// Match rules.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Seats per match (also the number of ready players needed to start).
    pub max_players: usize,
    /// Scramble length dealt at start.
    pub scramble_length: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYERS,
            scramble_length: DEFAULT_SCRAMBLE_LENGTH,
        }
    }
}

/// Result of a successful start.
#[derive(Debug, Clone)]
pub struct MatchStart {
    /// Match right after the transition to `Running`.
    pub snapshot: MatchSnapshot,
    /// Each player's freshly scrambled cube with the session to deliver it to.
    pub cubes: Vec<(SessionId, CubeView)>,
}

/// Broadcast-worthy record of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveAppliedEvent {
    /// Match id.
    pub match_id: MatchId,
    /// Player who moved.
    pub player_id: PlayerId,
    /// The move.
    pub applied: Move,
    /// Match-wide sequence number, starting at 1.
    pub sequence: u64,
    /// Server time the move was applied.
    pub server_timestamp: chrono::DateTime<Utc>,
}

/// Result of an accepted move.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    /// Mover's cube after the move.
    pub cube: CubeView,
    /// Event for every participant.
    pub event: MoveAppliedEvent,
}

/// Result of a departure.
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    /// Match that was left.
    pub match_id: MatchId,
    /// Player that left.
    pub player_id: PlayerId,
    /// Match after the departure; `None` if it was emptied and removed.
    pub remaining: Option<MatchSnapshot>,
}

/// Manages all live matches.
pub struct MatchService {
    config: MatchConfig,
    matches: DashMap<MatchId, Arc<Mutex<Match>>>,
    session_matches: DashMap<SessionId, MatchId>,
}

impl MatchService {
    /// Create an empty registry.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            matches: DashMap::new(),
            session_matches: DashMap::new(),
        }
    }

    /// Match rules in effect.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    fn get(&self, match_id: &MatchId) -> Option<Arc<Mutex<Match>>> {
        self.matches.get(match_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Allocate an empty lobby.
    pub fn create_match(&self) -> MatchId {
        let id = MatchId::generate();
        self.matches.insert(id.clone(), Arc::new(Mutex::new(Match::new(id.clone()))));
        info!(match_id = %id, "Match created");
        id
    }

    /// Seat `player_id` (connected as `session_id`) in a lobby.
    #[instrument(skip(self))]
    pub async fn join_match(
        &self,
        match_id: &MatchId,
        session_id: SessionId,
        player_id: PlayerId,
    ) -> Result<MatchSnapshot, MatchError> {
        let handle = self
            .get(match_id)
            .ok_or_else(|| MatchError::MatchNotFound(match_id.clone()))?;

        if let Some(bound) = self.session_matches.get(&session_id) {
            return Err(MatchError::SessionBusy(bound.value().clone()));
        }

        let mut game = handle.lock().await;
        if game.is_closed() {
            return Err(MatchError::MatchNotFound(match_id.clone()));
        }
        if game.phase() != MatchPhase::Lobby {
            return Err(MatchError::NotInLobby(match_id.clone()));
        }
        if game.contains_player(&player_id) {
            return Err(MatchError::AlreadyInMatch(player_id));
        }
        if game.participant_count() >= self.config.max_players {
            return Err(MatchError::MatchFull(match_id.clone()));
        }

        game.add_participant(MatchParticipant::new(player_id, session_id));
        self.session_matches.insert(session_id, match_id.clone());

        debug!(players = game.participant_count(), "Player joined");
        Ok(game.snapshot())
    }

    /// Set a player's ready flag while in the lobby.
    #[instrument(skip(self))]
    pub async fn set_ready(
        &self,
        match_id: &MatchId,
        player_id: &PlayerId,
        ready: bool,
    ) -> Result<MatchSnapshot, MatchError> {
        let handle = self
            .get(match_id)
            .ok_or_else(|| MatchError::MatchNotFound(match_id.clone()))?;

        let mut game = handle.lock().await;
        if game.phase() != MatchPhase::Lobby {
            return Err(MatchError::NotInLobby(match_id.clone()));
        }
        if !game.set_ready(player_id, ready) {
            return Err(MatchError::NotInMatch);
        }

        debug!(ready, "Ready updated");
        Ok(game.snapshot())
    }

    /// Start the race. Only the host may start, and only with every seat
    /// filled by a ready player.
    #[instrument(skip(self))]
    pub async fn try_start_match(
        &self,
        match_id: &MatchId,
        session_id: SessionId,
    ) -> Result<MatchStart, MatchError> {
        let handle = self
            .get(match_id)
            .ok_or_else(|| MatchError::MatchNotFound(match_id.clone()))?;

        let mut game = handle.lock().await;
        if game.phase() != MatchPhase::Lobby {
            return Err(MatchError::NotInLobby(match_id.clone()));
        }

        let caller = game
            .participant_by_session(session_id)
            .ok_or(MatchError::NotInMatch)?;
        if game.host() != Some(&caller.player_id) {
            return Err(MatchError::NotHost(match_id.clone()));
        }
        if !game.all_ready(self.config.max_players) {
            return Err(MatchError::NotReady(match_id.clone()));
        }

        let now = Utc::now();
        let entropy = now
            .timestamp_nanos_opt()
            .map(|n| n as u128)
            .unwrap_or_else(|| now.timestamp_millis() as u128);
        let seed = derive_match_seed(match_id.as_str(), entropy);
        let moves = scramble::generate(seed, self.config.scramble_length);

        game.start(seed, moves, now);

        let cubes = game
            .participants()
            .iter()
            .filter_map(|p| game.cube_view(&p.player_id).map(|view| (p.session_id, view)))
            .collect();

        info!(seed, "Match started");
        Ok(MatchStart {
            snapshot: game.snapshot(),
            cubes,
        })
    }

    /// Apply a move token for the player connected as `session_id`.
    #[instrument(skip(self))]
    pub async fn apply_move(
        &self,
        match_id: &MatchId,
        session_id: SessionId,
        token: &str,
    ) -> Result<MoveOutcome, MatchError> {
        let handle = self
            .get(match_id)
            .ok_or_else(|| MatchError::MatchNotFound(match_id.clone()))?;

        let mut game = handle.lock().await;
        if game.phase() != MatchPhase::Running {
            return Err(MatchError::NotRunning(match_id.clone()));
        }

        let player_id = game
            .participant_by_session(session_id)
            .map(|p| p.player_id.clone())
            .ok_or(MatchError::NotInMatch)?;

        let m = Move::parse(token)?;
        if !game.apply_move_for(&player_id, m) {
            return Err(MatchError::NotInMatch);
        }

        let sequence = game.next_move_seq();
        let cube = game.cube_view(&player_id).ok_or(MatchError::NotInMatch)?;

        if cube.solved {
            info!(player_id = %player_id, moves = cube.move_count, "Cube solved");
        }

        Ok(MoveOutcome {
            event: MoveAppliedEvent {
                match_id: match_id.clone(),
                player_id,
                applied: m,
                sequence,
                server_timestamp: Utc::now(),
            },
            cube,
        })
    }

    /// Remove whoever is connected as `session_id` from their match. The match
    /// is deleted once its last participant is gone.
    #[instrument(skip(self))]
    pub async fn leave_by_session(&self, session_id: SessionId) -> Result<LeaveOutcome, MatchError> {
        let (_, match_id) = self
            .session_matches
            .remove(&session_id)
            .ok_or(MatchError::NotInMatch)?;

        let handle = self
            .get(&match_id)
            .ok_or_else(|| MatchError::MatchNotFound(match_id.clone()))?;

        let mut game = handle.lock().await;
        let player_id = game
            .participant_by_session(session_id)
            .map(|p| p.player_id.clone())
            .ok_or(MatchError::NotInMatch)?;

        game.remove_participant(&player_id);

        let remaining = if game.participant_count() == 0 {
            game.mark_closed();
            self.matches.remove(&match_id);
            info!(match_id = %match_id, "Match emptied and removed");
            None
        } else {
            Some(game.snapshot())
        };

        debug!(match_id = %match_id, player_id = %player_id, "Player left");
        Ok(LeaveOutcome {
            match_id,
            player_id,
            remaining,
        })
    }

    /// Declare a running match over. Not triggered automatically by a solve.
    #[instrument(skip(self))]
    pub async fn finish_match(&self, match_id: &MatchId) -> Result<MatchSnapshot, MatchError> {
        let handle = self
            .get(match_id)
            .ok_or_else(|| MatchError::MatchNotFound(match_id.clone()))?;

        let mut game = handle.lock().await;
        if !game.finish(Utc::now()) {
            return Err(MatchError::NotRunning(match_id.clone()));
        }

        info!("Match finished");
        Ok(game.snapshot())
    }

    /// Current snapshot of a match.
    pub async fn snapshot(&self, match_id: &MatchId) -> Option<MatchSnapshot> {
        let handle = self.get(match_id)?;
        let game = handle.lock().await;
        Some(game.snapshot())
    }

    /// Sessions currently seated in a match.
    pub async fn sessions_of(&self, match_id: &MatchId) -> Vec<SessionId> {
        match self.get(match_id) {
            Some(handle) => handle.lock().await.session_ids(),
            None => Vec::new(),
        }
    }

    /// Match a session is seated in.
    pub fn match_of(&self, session_id: SessionId) -> Option<MatchId> {
        self.session_matches.get(&session_id).map(|e| e.value().clone())
    }

    /// Number of live matches.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}

impl Default for MatchService {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::state::CubeState;
    use crate::game::error::ErrorKind;
    use crate::game::participant::ParticipantRole;

    struct Seat {
        session: SessionId,
        player: PlayerId,
    }

    fn seat(name: &str) -> Seat {
        Seat {
            session: SessionId::new(),
            player: PlayerId::new(name),
        }
    }

    async fn lobby(service: &MatchService) -> (MatchId, Seat, Seat) {
        let id = service.create_match();
        let host = seat("alice");
        let guest = seat("bob");
        service.join_match(&id, host.session, host.player.clone()).await.unwrap();
        service.join_match(&id, guest.session, guest.player.clone()).await.unwrap();
        (id, host, guest)
    }

    async fn running(service: &MatchService) -> (MatchId, Seat, Seat) {
        let (id, host, guest) = lobby(service).await;
        service.set_ready(&id, &host.player, true).await.unwrap();
        service.set_ready(&id, &guest.player, true).await.unwrap();
        service.try_start_match(&id, host.session).await.unwrap();
        (id, host, guest)
    }

    #[tokio::test]
    async fn test_create_and_join() {
        let service = MatchService::default();
        let (id, host, _guest) = lobby(&service).await;

        let snap = service.snapshot(&id).await.unwrap();
        assert_eq!(snap.phase, MatchPhase::Lobby);
        assert_eq!(snap.players.len(), 2);
        assert_eq!(snap.players[0].role, ParticipantRole::Host);
        assert_eq!(snap.players[1].role, ParticipantRole::Guest);
        assert!(snap.players.iter().all(|p| !p.ready));
        assert_eq!(service.match_of(host.session), Some(id));
    }

    #[tokio::test]
    async fn test_join_unknown_match() {
        let service = MatchService::default();
        let s = seat("alice");
        let err = service
            .join_match(&MatchId::from("nope"), s.session, s.player)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_join_duplicate_player() {
        let service = MatchService::default();
        let id = service.create_match();
        let a = seat("alice");
        service.join_match(&id, a.session, a.player.clone()).await.unwrap();

        let err = service
            .join_match(&id, SessionId::new(), a.player.clone())
            .await
            .unwrap_err();
        assert_eq!(err, MatchError::AlreadyInMatch(a.player));
    }

    #[tokio::test]
    async fn test_third_join_is_rejected() {
        let service = MatchService::default();
        let (id, _, _) = lobby(&service).await;
        let before = service.snapshot(&id).await.unwrap().players;

        let third = seat("carol");
        let err = service.join_match(&id, third.session, third.player).await.unwrap_err();
        assert_eq!(err, MatchError::MatchFull(id.clone()));
        assert_eq!(service.snapshot(&id).await.unwrap().players, before);
        assert_eq!(service.match_of(third.session), None);
    }

    #[tokio::test]
    async fn test_session_bound_to_one_match() {
        let service = MatchService::default();
        let first = service.create_match();
        let second = service.create_match();
        let s = seat("alice");
        service.join_match(&first, s.session, s.player.clone()).await.unwrap();

        let err = service
            .join_match(&second, s.session, PlayerId::new("alice-2"))
            .await
            .unwrap_err();
        assert_eq!(err, MatchError::SessionBusy(first));
    }

    #[tokio::test]
    async fn test_join_after_start_rejected() {
        let service = MatchService::default();
        let (id, _, _) = running(&service).await;
        let late = seat("carol");
        let err = service.join_match(&id, late.session, late.player).await.unwrap_err();
        assert_eq!(err, MatchError::NotInLobby(id));
    }

    #[tokio::test]
    async fn test_set_ready() {
        let service = MatchService::default();
        let (id, host, _) = lobby(&service).await;

        let snap = service.set_ready(&id, &host.player, true).await.unwrap();
        assert!(snap.players[0].ready);
        let snap = service.set_ready(&id, &host.player, false).await.unwrap();
        assert!(!snap.players[0].ready);

        let err = service.set_ready(&id, &PlayerId::new("ghost"), true).await.unwrap_err();
        assert_eq!(err, MatchError::NotInMatch);
        let err = service
            .set_ready(&MatchId::from("nope"), &host.player, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_start_requires_both_ready() {
        let service = MatchService::default();
        let (id, host, _) = lobby(&service).await;
        service.set_ready(&id, &host.player, true).await.unwrap();

        let err = service.try_start_match(&id, host.session).await.unwrap_err();
        assert_eq!(err, MatchError::NotReady(id.clone()));
        assert_eq!(service.snapshot(&id).await.unwrap().phase, MatchPhase::Lobby);
    }

    #[tokio::test]
    async fn test_start_requires_full_match() {
        let service = MatchService::default();
        let id = service.create_match();
        let host = seat("alice");
        service.join_match(&id, host.session, host.player.clone()).await.unwrap();
        service.set_ready(&id, &host.player, true).await.unwrap();

        let err = service.try_start_match(&id, host.session).await.unwrap_err();
        assert_eq!(err, MatchError::NotReady(id));
    }

    #[tokio::test]
    async fn test_start_by_guest_rejected() {
        let service = MatchService::default();
        let (id, host, guest) = lobby(&service).await;
        service.set_ready(&id, &host.player, true).await.unwrap();
        service.set_ready(&id, &guest.player, true).await.unwrap();

        let err = service.try_start_match(&id, guest.session).await.unwrap_err();
        assert_eq!(err, MatchError::NotHost(id.clone()));
        let err = service.try_start_match(&id, SessionId::new()).await.unwrap_err();
        assert_eq!(err, MatchError::NotInMatch);
    }

    #[tokio::test]
    async fn test_start_deals_scramble() {
        let service = MatchService::default();
        let (id, host, guest) = lobby(&service).await;
        service.set_ready(&id, &host.player, true).await.unwrap();
        service.set_ready(&id, &guest.player, true).await.unwrap();

        let start = service.try_start_match(&id, host.session).await.unwrap();
        let snap = &start.snapshot;
        assert_eq!(snap.phase, MatchPhase::Running);
        assert!(snap.started_at.is_some());
        assert_eq!(snap.scramble.len(), DEFAULT_SCRAMBLE_LENGTH);
        assert!(snap.players.iter().all(|p| !p.ready));

        assert!(snap.scramble_seed.unwrap() <= crate::core::rng::MAX_SEED);

        let expected = CubeState::scrambled(&snap.scramble).facelets();
        assert_eq!(
            snap.scramble,
            scramble::generate(snap.scramble_seed.unwrap(), DEFAULT_SCRAMBLE_LENGTH)
        );
        assert_eq!(start.cubes.len(), 2);
        for (_, view) in &start.cubes {
            assert_eq!(view.facelets, expected);
            assert_eq!(view.move_count, 0);
        }

        let err = service.try_start_match(&id, host.session).await.unwrap_err();
        assert_eq!(err, MatchError::NotInLobby(id));
    }

    #[tokio::test]
    async fn test_move_before_start_rejected() {
        let service = MatchService::default();
        let (id, host, _) = lobby(&service).await;
        let err = service.apply_move(&id, host.session, "R").await.unwrap_err();
        assert_eq!(err, MatchError::NotRunning(id));
    }

    #[tokio::test]
    async fn test_apply_move() {
        let service = MatchService::default();
        let (id, host, guest) = running(&service).await;

        let first = service.apply_move(&id, host.session, "R").await.unwrap();
        assert_eq!(first.cube.move_count, 1);
        assert_eq!(first.event.sequence, 1);
        assert_eq!(first.event.player_id, host.player);
        assert_eq!(first.event.applied.notation(), "R");

        let second = service.apply_move(&id, guest.session, " U' ").await.unwrap();
        assert_eq!(second.cube.move_count, 1);
        assert_eq!(second.event.sequence, 2);
        assert_eq!(second.event.applied.notation(), "U'");

        // Undoing the only move leaves the host on the dealt scramble
        let back = service.apply_move(&id, host.session, "R'").await.unwrap();
        let dealt = service.snapshot(&id).await.unwrap().scramble;
        assert_eq!(back.cube.facelets, CubeState::scrambled(&dealt).facelets());
        assert_eq!(back.cube.move_count, 2);
    }

    #[tokio::test]
    async fn test_invalid_move_and_outsider() {
        let service = MatchService::default();
        let (id, host, _) = running(&service).await;

        let err = service.apply_move(&id, host.session, "R3").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMove);
        let err = service.apply_move(&id, SessionId::new(), "R").await.unwrap_err();
        assert_eq!(err, MatchError::NotInMatch);

        // Rejected moves do not count or consume sequence numbers
        let ok = service.apply_move(&id, host.session, "R").await.unwrap();
        assert_eq!(ok.cube.move_count, 1);
        assert_eq!(ok.event.sequence, 1);
    }

    #[tokio::test]
    async fn test_solving_reports_solved() {
        let service = MatchService::default();
        let (id, host, _) = running(&service).await;
        let dealt = service.snapshot(&id).await.unwrap().scramble;

        let mut last = None;
        for m in dealt.iter().rev() {
            last = Some(service.apply_move(&id, host.session, m.inverse().notation()).await.unwrap());
        }
        let last = last.unwrap();
        assert!(last.cube.solved);
        assert_eq!(last.cube.move_count as usize, dealt.len());

        // Solving does not end the match on its own
        assert_eq!(service.snapshot(&id).await.unwrap().phase, MatchPhase::Running);
    }

    #[tokio::test]
    async fn test_host_leave_transfers_host() {
        let service = MatchService::default();
        let (id, host, guest) = lobby(&service).await;

        let out = service.leave_by_session(host.session).await.unwrap();
        assert_eq!(out.player_id, host.player);
        let remaining = out.remaining.unwrap();
        assert_eq!(remaining.players.len(), 1);
        assert_eq!(remaining.players[0].player_id, guest.player);
        assert_eq!(remaining.players[0].role, ParticipantRole::Host);
        assert_eq!(service.match_count(), 1);
        assert_eq!(service.sessions_of(&id).await, vec![guest.session]);
    }

    #[tokio::test]
    async fn test_last_leave_removes_match() {
        let service = MatchService::default();
        let id = service.create_match();
        let host = seat("alice");
        service.join_match(&id, host.session, host.player.clone()).await.unwrap();

        let out = service.leave_by_session(host.session).await.unwrap();
        assert!(out.remaining.is_none());
        assert_eq!(service.match_count(), 0);
        assert!(service.snapshot(&id).await.is_none());

        let err = service.leave_by_session(host.session).await.unwrap_err();
        assert_eq!(err, MatchError::NotInMatch);

        let again = seat("bob");
        let err = service.join_match(&id, again.session, again.player).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_leave_while_running() {
        let service = MatchService::default();
        let (id, host, guest) = running(&service).await;

        let out = service.leave_by_session(guest.session).await.unwrap();
        assert_eq!(out.remaining.unwrap().phase, MatchPhase::Running);
        assert!(service.apply_move(&id, host.session, "F").await.is_ok());
        assert_eq!(
            service.apply_move(&id, guest.session, "F").await.unwrap_err(),
            MatchError::NotInMatch
        );
    }

    #[tokio::test]
    async fn test_finish_match() {
        let service = MatchService::default();
        let (lobby_id, _, _) = lobby(&service).await;
        assert_eq!(
            service.finish_match(&lobby_id).await.unwrap_err(),
            MatchError::NotRunning(lobby_id.clone())
        );

        let (id, host, _) = running(&service).await;
        let snap = service.finish_match(&id).await.unwrap();
        assert_eq!(snap.phase, MatchPhase::Finished);
        assert!(snap.ended_at.is_some());

        let err = service.apply_move(&id, host.session, "R").await.unwrap_err();
        assert_eq!(err, MatchError::NotRunning(id.clone()));
        assert!(service.finish_match(&id).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_moves_are_not_lost() {
        const PER_PLAYER: usize = 200;

        let service = Arc::new(MatchService::default());
        let (id, host, guest) = running(&service).await;

        let mut tasks = Vec::new();
        for session in [host.session, guest.session] {
            for i in 0..PER_PLAYER {
                let service = Arc::clone(&service);
                let id = id.clone();
                let token = ["R", "U", "F'", "D2"][i % 4];
                tasks.push(tokio::spawn(async move {
                    service.apply_move(&id, session, token).await
                }));
            }
        }

        let mut sequences = Vec::new();
        for task in tasks {
            sequences.push(task.await.unwrap().unwrap().event.sequence);
        }
        sequences.sort_unstable();
        let expected: Vec<u64> = (1..=(2 * PER_PLAYER) as u64).collect();
        assert_eq!(sequences, expected);

        // One more move each reveals the final counters
        let h = service.apply_move(&id, host.session, "B").await.unwrap();
        let g = service.apply_move(&id, guest.session, "B").await.unwrap();
        assert_eq!(h.cube.move_count as usize, PER_PLAYER + 1);
        assert_eq!(g.cube.move_count as usize, PER_PLAYER + 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_matches_do_not_block_each_other() {
        let service = Arc::new(MatchService::default());
        let (busy, _, _) = running(&service).await;
        let (other, other_host, _) = running(&service).await;

        // Hold one match's lock; the other must still make progress
        let handle = service.get(&busy).unwrap();
        let _guard = handle.lock().await;

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            service.apply_move(&other, other_host.session, "L"),
        )
        .await;
        assert!(result.expect("independent match was blocked").is_ok());
    }
}

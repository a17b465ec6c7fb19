//! # Cube Duel Server
//!
//! Authoritative match server for two-player speedcubing races.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CUBE DUEL SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  └── rng.rs      - Xorshift128+ PRNG and seed derivation     │
//! │                                                              │
//! │  cube/           - Cube engine (deterministic)               │
//! │  ├── moves.rs    - 18 face turns and notation                │
//! │  ├── state.rs    - 54-facelet cube model                     │
//! │  └── scramble.rs - Seeded scramble generator                 │
//! │                                                              │
//! │  game/           - Match logic                               │
//! │  ├── participant.rs - Player/session ids and seats           │
//! │  ├── state.rs    - Match record, Lobby -> Running -> Finished│
//! │  ├── service.rs  - Registry with per-match locking           │
//! │  └── error.rs    - Rejection taxonomy                        │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── server.rs   - WebSocket server                          │
//! │  └── protocol.rs - Message types                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same seed, `cube::generate_scramble` yields the same moves on
//! every platform, so both racers start from an identical cube.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod cube;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::rng::{DeterministicRng, derive_match_seed};
pub use cube::{CubeState, Move, MoveParseError};
pub use game::{MatchConfig, MatchError, MatchId, MatchService, PlayerId, SessionId};
pub use network::{GameServer, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Cube Engine
//!
//! Everything about a single virtual cube. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `moves`: the 18 face turns and their notation
//! - `state`: facelet model and turn algorithm
//! - `scramble`: seeded, axis-diversified scramble sequences

pub mod moves;
pub mod scramble;
pub mod state;

// Re-export key types
pub use moves::{Axis, Face, Move, MoveParseError, Turn, ALL_MOVES};
pub use scramble::{generate as generate_scramble, DEFAULT_SCRAMBLE_LENGTH};
pub use state::{Color, CubeState, FACELET_COUNT, FACELET_ORDER};

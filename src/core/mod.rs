//! Core deterministic primitives.
//!
//! Seeded randomness shared by the scramble generator. Everything here is
//! platform independent so a seed always expands to the same move sequence.

pub mod rng;

// Re-export core types
pub use rng::{DeterministicRng, derive_match_seed, MAX_SEED};

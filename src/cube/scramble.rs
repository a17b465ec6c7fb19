//! Scramble Generation
//!
//! Expands a seed into a move sequence. A candidate that turns the same axis
//! as the previously accepted move is re-drawn, so the sequence never
//! contains trivially cancelling pairs like `R R'` or `L R`.

use crate::core::rng::DeterministicRng;

use super::moves::{Axis, Move, ALL_MOVES};

/// Scramble length used for matches.
pub const DEFAULT_SCRAMBLE_LENGTH: usize = 20;

/// Generate `length` moves from `seed`.
///
/// Identical `(seed, length)` always yields the identical sequence.
pub fn generate(seed: u64, length: usize) -> Vec<Move> {
    let mut rng = DeterministicRng::new(seed);
    let mut out = Vec::with_capacity(length);
    let mut last_axis: Option<Axis> = None;

    while out.len() < length {
        let Some(&candidate) = rng.choose(&ALL_MOVES) else {
            break;
        };
        if last_axis == Some(candidate.axis()) {
            continue;
        }

        last_axis = Some(candidate.axis());
        out.push(candidate);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::state::CubeState;
    use proptest::prelude::*;

    #[test]
    fn test_scramble_determinism() {
        let a = generate(42, 20);
        let b = generate(42, 20);
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn test_independent_cubes_reach_same_state() {
        let moves = generate(42, DEFAULT_SCRAMBLE_LENGTH);
        let first = CubeState::scrambled(&moves);
        let second = CubeState::scrambled(&generate(42, DEFAULT_SCRAMBLE_LENGTH));
        assert_eq!(first.facelets(), second.facelets());
        assert!(!first.is_solved());
    }

    #[test]
    fn test_known_sequence_for_seed() {
        let notation: Vec<&str> = generate(42, 8).into_iter().map(Move::notation).collect();
        assert_eq!(notation, ["U2", "R2", "F", "L2", "B'", "U'", "F2", "R2"]);
    }

    #[test]
    fn test_different_seeds_differ() {
        assert_ne!(generate(1, 20), generate(2, 20));
    }

    #[test]
    fn test_zero_length() {
        assert!(generate(7, 0).is_empty());
    }

    #[test]
    fn test_prefix_stable_across_lengths() {
        // Longer scrambles extend shorter ones from the same seed
        let short = generate(99, 10);
        let long = generate(99, 30);
        assert_eq!(&long[..10], &short[..]);
    }

    proptest! {
        #[test]
        fn prop_exact_length_and_axis_diversity(seed in any::<u64>(), length in 0usize..64) {
            let moves = generate(seed, length);
            prop_assert_eq!(moves.len(), length);
            for pair in moves.windows(2) {
                prop_assert_ne!(pair[0].axis(), pair[1].axis());
            }
        }
    }
}

//! Move Grammar
//!
//! The 18 face turns of a 3x3x3 cube and their standard notation:
//! a face letter for a clockwise quarter turn, the letter plus `'` for a
//! counter-clockwise quarter turn, and the letter plus `2` for a half turn.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;

// =============================================================================
// FACES AND AXES
// =============================================================================

/// One of the six cube faces.
///
/// The discriminant is the face's slot in [`CubeState`](super::state::CubeState)
/// storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Face {
    /// Up (white)
    Up = 0,
    /// Right (red)
    Right = 1,
    /// Front (green)
    Front = 2,
    /// Down (yellow)
    Down = 3,
    /// Left (orange)
    Left = 4,
    /// Back (blue)
    Back = 5,
}

impl Face {
    /// All faces in storage order.
    pub const ALL: [Face; 6] = [
        Face::Up, Face::Right, Face::Front, Face::Down, Face::Left, Face::Back,
    ];

    /// Storage index (0-5).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Rotation axis shared with the opposite face.
    pub fn axis(self) -> Axis {
        match self {
            Face::Left | Face::Right => Axis::X,
            Face::Up | Face::Down => Axis::Y,
            Face::Front | Face::Back => Axis::Z,
        }
    }
}

/// Rotation axis through a pair of opposite faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left / Right
    X,
    /// Up / Down
    Y,
    /// Front / Back
    Z,
}

// =============================================================================
// TURNS
// =============================================================================

/// Turn amount applied to a face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Turn {
    /// 90 degrees clockwise.
    Clockwise = 0,
    /// 90 degrees counter-clockwise.
    CounterClockwise = 1,
    /// 180 degrees.
    Half = 2,
}

impl Turn {
    /// Number of primitive clockwise quarter turns this turn is made of.
    #[inline]
    pub fn quarter_turns(self) -> usize {
        match self {
            Turn::Clockwise => 1,
            Turn::Half => 2,
            Turn::CounterClockwise => 3,
        }
    }

    /// Turn that undoes this one.
    pub fn inverse(self) -> Turn {
        match self {
            Turn::Clockwise => Turn::CounterClockwise,
            Turn::CounterClockwise => Turn::Clockwise,
            Turn::Half => Turn::Half,
        }
    }
}

// =============================================================================
// MOVE
// =============================================================================

/// A single face turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Face being turned.
    pub face: Face,
    /// How far it turns.
    pub turn: Turn,
}

/// Notation lookup, indexed by `[face][turn]`.
const NOTATION: [[&str; 3]; 6] = [
    ["U", "U'", "U2"],
    ["R", "R'", "R2"],
    ["F", "F'", "F2"],
    ["D", "D'", "D2"],
    ["L", "L'", "L2"],
    ["B", "B'", "B2"],
];

const fn mv(face: Face, turn: Turn) -> Move {
    Move { face, turn }
}

/// Every legal move, grouped by face (U, D, L, R, F, B).
pub const ALL_MOVES: [Move; 18] = [
    mv(Face::Up, Turn::Clockwise), mv(Face::Up, Turn::CounterClockwise), mv(Face::Up, Turn::Half),
    mv(Face::Down, Turn::Clockwise), mv(Face::Down, Turn::CounterClockwise), mv(Face::Down, Turn::Half),
    mv(Face::Left, Turn::Clockwise), mv(Face::Left, Turn::CounterClockwise), mv(Face::Left, Turn::Half),
    mv(Face::Right, Turn::Clockwise), mv(Face::Right, Turn::CounterClockwise), mv(Face::Right, Turn::Half),
    mv(Face::Front, Turn::Clockwise), mv(Face::Front, Turn::CounterClockwise), mv(Face::Front, Turn::Half),
    mv(Face::Back, Turn::Clockwise), mv(Face::Back, Turn::CounterClockwise), mv(Face::Back, Turn::Half),
];

impl Move {
    /// Create a move.
    pub const fn new(face: Face, turn: Turn) -> Self {
        mv(face, turn)
    }

    /// Canonical notation token (`"R"`, `"U'"`, `"F2"`, ...).
    pub fn notation(self) -> &'static str {
        NOTATION[self.face.index()][self.turn as usize]
    }

    /// Parse a notation token. Surrounding whitespace is ignored; the token
    /// itself is case-sensitive.
    pub fn parse(s: &str) -> Result<Move, MoveParseError> {
        let token = s.trim();
        ALL_MOVES
            .iter()
            .copied()
            .find(|m| m.notation() == token)
            .ok_or_else(|| MoveParseError(token.to_string()))
    }

    /// Axis of the turned face.
    #[inline]
    pub fn axis(self) -> Axis {
        self.face.axis()
    }

    /// Move that undoes this one.
    pub fn inverse(self) -> Move {
        mv(self.face, self.turn.inverse())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.notation())
    }
}

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::parse(s)
    }
}

/// Token is not one of the 18 canonical move notations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid move: {0:?}")]
pub struct MoveParseError(pub String);

/// Render a move sequence as notation tokens.
pub fn to_notation(moves: &[Move]) -> Vec<String> {
    moves.iter().map(|m| m.notation().to_string()).collect()
}

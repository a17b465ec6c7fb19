//! Cube State
//!
//! Facelet model of a single 3x3x3 cube. Each face is a 3x3 grid of colors
//! stored row-major as seen when looking straight at that face.
//!
//! A move is one primitive clockwise quarter turn of its face, repeated
//! 1-3 times. The quarter turn rotates the face's own grid and cycles the
//! four edge strips on the neighbouring faces according to [`ADJACENT`].

use serde::{Serialize, Deserialize};

use super::moves::{Face, Move};

// =============================================================================
// COLORS
// =============================================================================

/// Sticker color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// Up
    White,
    /// Right
    Red,
    /// Front
    Green,
    /// Down
    Yellow,
    /// Left
    Orange,
    /// Back
    Blue,
}

impl Color {
    /// Wire symbol.
    pub fn symbol(self) -> char {
        match self {
            Color::White => 'W',
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Yellow => 'Y',
            Color::Orange => 'O',
            Color::Blue => 'B',
        }
    }

    /// Color of a face on a solved cube.
    pub fn home_of(face: Face) -> Color {
        match face {
            Face::Up => Color::White,
            Face::Right => Color::Red,
            Face::Front => Color::Green,
            Face::Down => Color::Yellow,
            Face::Left => Color::Orange,
            Face::Back => Color::Blue,
        }
    }
}

// =============================================================================
// ADJACENCY
// =============================================================================

/// (row, column) of a sticker within a face.
type Cell = (usize, usize);

/// Three stickers along one edge of a face, in transfer order.
#[derive(Clone, Copy, Debug)]
struct Strip {
    face: Face,
    cells: [Cell; 3],
}

const ROW_0: [Cell; 3] = [(0, 0), (0, 1), (0, 2)];
const ROW_0_REV: [Cell; 3] = [(0, 2), (0, 1), (0, 0)];
const ROW_2: [Cell; 3] = [(2, 0), (2, 1), (2, 2)];
const ROW_2_REV: [Cell; 3] = [(2, 2), (2, 1), (2, 0)];
const COL_0: [Cell; 3] = [(0, 0), (1, 0), (2, 0)];
const COL_0_REV: [Cell; 3] = [(2, 0), (1, 0), (0, 0)];
const COL_2: [Cell; 3] = [(0, 2), (1, 2), (2, 2)];
const COL_2_REV: [Cell; 3] = [(2, 2), (1, 2), (0, 2)];

const fn strip(face: Face, cells: [Cell; 3]) -> Strip {
    Strip { face, cells }
}

/// Edge strips touched by a clockwise quarter turn, indexed by face.
///
/// On each turn strip `i` receives the stickers of strip `i + 1`, and the
/// last strip receives the old stickers of the first.
const ADJACENT: [[Strip; 4]; 6] = [
    // Up
    [strip(Face::Front, ROW_0), strip(Face::Right, ROW_0), strip(Face::Back, ROW_0), strip(Face::Left, ROW_0)],
    // Right
    [strip(Face::Up, COL_2), strip(Face::Front, COL_2), strip(Face::Down, COL_2), strip(Face::Back, COL_0_REV)],
    // Front
    [strip(Face::Up, ROW_2), strip(Face::Left, COL_2_REV), strip(Face::Down, ROW_0_REV), strip(Face::Right, COL_0)],
    // Down
    [strip(Face::Front, ROW_2), strip(Face::Left, ROW_2), strip(Face::Back, ROW_2), strip(Face::Right, ROW_2)],
    // Left
    [strip(Face::Up, COL_0), strip(Face::Back, COL_2_REV), strip(Face::Down, COL_0), strip(Face::Front, COL_0)],
    // Back
    [strip(Face::Up, ROW_0), strip(Face::Right, COL_2), strip(Face::Down, ROW_2_REV), strip(Face::Left, COL_0_REV)],
];

/// Order in which faces appear in [`CubeState::facelets`].
pub const FACELET_ORDER: [Face; 6] = [
    Face::Up, Face::Down, Face::Left, Face::Right, Face::Front, Face::Back,
];

/// Number of stickers on a cube.
pub const FACELET_COUNT: usize = 54;

// =============================================================================
// CUBE STATE
// =============================================================================

type FaceGrid = [[Color; 3]; 3];

/// Facelet coloring of one cube.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeState {
    faces: [FaceGrid; 6],
}

impl Default for CubeState {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeState {
    /// Create a solved cube.
    pub fn new() -> Self {
        let mut cube = Self {
            faces: [[[Color::White; 3]; 3]; 6],
        };
        cube.reset();
        cube
    }

    /// Create a solved cube and apply `moves` to it.
    pub fn scrambled(moves: &[Move]) -> Self {
        let mut cube = Self::new();
        cube.apply_all(moves);
        cube
    }

    /// Paint every face its home color.
    pub fn reset(&mut self) {
        for face in Face::ALL {
            self.faces[face.index()] = [[Color::home_of(face); 3]; 3];
        }
    }

    /// Apply a single move.
    pub fn apply(&mut self, m: Move) {
        for _ in 0..m.turn.quarter_turns() {
            self.quarter_turn(m.face);
        }
    }

    /// Apply moves in order.
    pub fn apply_all(&mut self, moves: &[Move]) {
        for &m in moves {
            self.apply(m);
        }
    }

    /// Every face is a single color. Orientation is not checked.
    pub fn is_solved(&self) -> bool {
        self.faces.iter().all(|grid| {
            let first = grid[0][0];
            grid.iter().flatten().all(|&c| c == first)
        })
    }

    /// Sticker color at `(row, col)` of `face`.
    pub fn sticker(&self, face: Face, row: usize, col: usize) -> Color {
        self.faces[face.index()][row][col]
    }

    /// 54-symbol string, faces in [`FACELET_ORDER`], each face row-major.
    pub fn facelets(&self) -> String {
        let mut out = String::with_capacity(FACELET_COUNT);
        for face in FACELET_ORDER {
            for row in &self.faces[face.index()] {
                out.extend(row.iter().map(|c| c.symbol()));
            }
        }
        out
    }

    /// One clockwise quarter turn of `face`.
    fn quarter_turn(&mut self, face: Face) {
        self.rotate_grid_clockwise(face);

        let strips = &ADJACENT[face.index()];
        let first = self.read_strip(&strips[0]);
        for i in 0..3 {
            let next = self.read_strip(&strips[i + 1]);
            self.write_strip(&strips[i], next);
        }
        self.write_strip(&strips[3], first);
    }

    fn rotate_grid_clockwise(&mut self, face: Face) {
        let grid = self.faces[face.index()];
        let mut rotated = grid;
        for (r, row) in grid.iter().enumerate() {
            for (c, &color) in row.iter().enumerate() {
                rotated[c][2 - r] = color;
            }
        }
        self.faces[face.index()] = rotated;
    }

    fn read_strip(&self, strip: &Strip) -> [Color; 3] {
        let grid = &self.faces[strip.face.index()];
        strip.cells.map(|(r, c)| grid[r][c])
    }

    fn write_strip(&mut self, strip: &Strip, colors: [Color; 3]) {
        let grid = &mut self.faces[strip.face.index()];
        for (&(r, c), color) in strip.cells.iter().zip(colors) {
            grid[r][c] = color;
        }
    }
}

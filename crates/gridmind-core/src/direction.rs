//! Movement directions and the fixed field-of-vision fans attached to them.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of sight lines in a field of vision.
pub const SIGHT_LINES: usize = 5;
/// Number of cells along each sight line.
pub const SIGHT_DEPTH: usize = 6;

/// Cell offsets `(dx, dy)` along one sight line, nearest first.
pub type SightLine = [(i64, i64); SIGHT_DEPTH];

/// One of the four compass moves, or standing still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    StayStill,
}

impl Direction {
    /// Every direction in network output order.
    pub const ALL: [Self; 5] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::StayStill,
    ];
    /// Number of directions, and therefore of policy outputs.
    pub const COUNT: usize = Self::ALL.len();
    /// Directions that change position.
    pub const HEADINGS: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Position in [`Direction::ALL`]; also the policy output slot.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
            Self::StayStill => 4,
        }
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Column and row delta `(dx, dy)` of a single step.
    #[must_use]
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::StayStill => (0, 0),
        }
    }

    /// Sight lines visible while facing this way; empty for [`Direction::StayStill`].
    #[must_use]
    pub fn field_of_vision(self) -> &'static [SightLine] {
        match self {
            Self::Up => &UP_FOV,
            Self::Down => &DOWN_FOV,
            Self::Left => &LEFT_FOV,
            Self::Right => &RIGHT_FOV,
            Self::StayStill => &[],
        }
    }

    /// Uniform pick among all directions, standing still included.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::COUNT)]
    }

    /// Uniform pick among the four moving directions.
    pub fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::HEADINGS[rng.random_range(0..Self::HEADINGS.len())]
    }
}

/// Parallel sight lines running along `forward`, offset sideways along `lateral` by
/// `-2..=2` cells.
const fn fan(forward: (i64, i64), lateral: (i64, i64)) -> [SightLine; SIGHT_LINES] {
    let mut lines = [[(0, 0); SIGHT_DEPTH]; SIGHT_LINES];
    let mut line = 0;
    while line < SIGHT_LINES {
        let side = line as i64 - (SIGHT_LINES as i64 / 2);
        let mut step = 0;
        while step < SIGHT_DEPTH {
            let depth = step as i64 + 1;
            lines[line][step] = (
                forward.0 * depth + lateral.0 * side,
                forward.1 * depth + lateral.1 * side,
            );
            step += 1;
        }
        line += 1;
    }
    lines
}

static UP_FOV: [SightLine; SIGHT_LINES] = fan((0, -1), (1, 0));
static DOWN_FOV: [SightLine; SIGHT_LINES] = fan((0, 1), (1, 0));
static LEFT_FOV: [SightLine; SIGHT_LINES] = fan((-1, 0), (0, 1));
static RIGHT_FOV: [SightLine; SIGHT_LINES] = fan((1, 0), (0, 1));

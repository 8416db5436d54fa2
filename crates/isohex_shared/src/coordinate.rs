//! Discrete grid addresses on the staggered isometric grid.
//!
//! Rows alternate parity: odd rows sit half a cell further right than even
//! rows. Horizontal offsets of the diagonal neighbors therefore depend on
//! `y % 2`, computed with truncated remainder so negative odd rows stay odd.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the nine directions around a cell.
///
/// Numbered clockwise starting at the top, with 8 meaning the cell itself.
///
/// ```text
/// 7 \ 0 / 1
/// ---------
/// 6 | 8 | 2
/// ---------
/// 5 / 4 \ 3
/// ```
///
/// "Top" is the cell further back (y - 2); "Bottom" is further front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum NeighborSide {
    /// Two rows back.
    Top = 0,
    /// One row back, to the right.
    TopRight = 1,
    /// Same row, one to the right.
    Right = 2,
    /// One row front, to the right.
    BottomRight = 3,
    /// Two rows front.
    Bottom = 4,
    /// One row front, to the left.
    BottomLeft = 5,
    /// Same row, one to the left.
    Left = 6,
    /// One row back, to the left.
    TopLeft = 7,
    /// The cell itself.
    Center = 8,
}

impl NeighborSide {
    /// All nine sides in index order.
    pub const ALL: [Self; 9] = [
        Self::Top,
        Self::TopRight,
        Self::Right,
        Self::BottomRight,
        Self::Bottom,
        Self::BottomLeft,
        Self::Left,
        Self::TopLeft,
        Self::Center,
    ];

    /// Returns the numeric index in `[0, 8]`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Converts an index into a side, or `None` above 8.
    #[inline]
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Top),
            1 => Some(Self::TopRight),
            2 => Some(Self::Right),
            3 => Some(Self::BottomRight),
            4 => Some(Self::Bottom),
            5 => Some(Self::BottomLeft),
            6 => Some(Self::Left),
            7 => Some(Self::TopLeft),
            8 => Some(Self::Center),
            _ => None,
        }
    }

    /// The direction that undoes a step in this direction.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::TopRight => Self::BottomLeft,
            Self::Right => Self::Left,
            Self::BottomRight => Self::TopLeft,
            Self::Bottom => Self::Top,
            Self::BottomLeft => Self::TopRight,
            Self::Left => Self::Right,
            Self::TopLeft => Self::BottomRight,
            Self::Center => Self::Center,
        }
    }
}

/// A reference to a specific cell of the map.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Coordinate {
    /// Position from left to right.
    pub x: i32,
    /// Position from back to front (staggered rows).
    pub y: i32,
    /// Position from the ground up.
    pub z: i32,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// True if this cell lies on an odd (shifted) row.
    #[inline]
    #[must_use]
    pub const fn is_odd_row(self) -> bool {
        self.y % 2 != 0
    }

    /// Returns the neighboring coordinate in the given direction.
    #[must_use]
    pub const fn neighbor(self, side: NeighborSide) -> Self {
        let Self { x, y, z } = self;
        let odd = self.is_odd_row();
        match side {
            NeighborSide::Top => Self::new(x, y - 2, z),
            NeighborSide::TopRight => Self::new(x + if odd { 1 } else { 0 }, y - 1, z),
            NeighborSide::Right => Self::new(x + 1, y, z),
            NeighborSide::BottomRight => Self::new(x + if odd { 1 } else { 0 }, y + 1, z),
            NeighborSide::Bottom => Self::new(x, y + 2, z),
            NeighborSide::BottomLeft => Self::new(x - if odd { 0 } else { 1 }, y + 1, z),
            NeighborSide::Left => Self::new(x - 1, y, z),
            NeighborSide::TopLeft => Self::new(x - if odd { 0 } else { 1 }, y - 1, z),
            NeighborSide::Center => self,
        }
    }

    /// Returns a copy moved by a raw integer vector.
    #[inline]
    #[must_use]
    pub const fn add(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Returns the cell directly above.
    #[inline]
    #[must_use]
    pub const fn above(self) -> Self {
        self.add(0, 0, 1)
    }

    /// Returns the cell directly below.
    #[inline]
    #[must_use]
    pub const fn below(self) -> Self {
        self.add(0, 0, -1)
    }

    /// z clamped into `[0, blocks_z)`.
    #[must_use]
    pub fn z_clamped(self, blocks_z: i32) -> i32 {
        self.z.clamp(0, blocks_z - 1)
    }

    /// Checks whether the coordinate lies in the box spanned by `lo` and `hi` (inclusive).
    #[must_use]
    pub const fn is_in_cube(self, lo: Self, hi: Self) -> bool {
        self.x >= lo.x
            && self.y >= lo.y
            && self.z >= lo.z
            && self.x <= hi.x
            && self.y <= hi.y
            && self.z <= hi.z
    }

    /// Chunk column index along x.
    #[inline]
    #[must_use]
    pub const fn chunk_x(self, blocks_x: i32) -> i32 {
        self.x.div_euclid(blocks_x)
    }

    /// Chunk column index along y.
    #[inline]
    #[must_use]
    pub const fn chunk_y(self, blocks_y: i32) -> i32 {
        self.y.div_euclid(blocks_y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}, {}}}", self.x, self.y, self.z)
    }
}

/// A walking position scoped to one probing pass.
///
/// Probing code steps the cursor around a cell and reads the coordinate
/// under it. The origin is kept so the pass can check it walked back home.
#[derive(Clone, Copy, Debug)]
pub struct NeighborCursor {
    origin: Coordinate,
    current: Coordinate,
}

impl NeighborCursor {
    /// Starts a cursor at `origin`.
    #[must_use]
    pub const fn new(origin: Coordinate) -> Self {
        Self { origin, current: origin }
    }

    /// Where the cursor started.
    #[must_use]
    pub const fn origin(&self) -> Coordinate {
        self.origin
    }

    /// Where the cursor currently is.
    #[must_use]
    pub const fn current(&self) -> Coordinate {
        self.current
    }

    /// Steps to the neighbor in `side` and returns the new position.
    pub fn step(&mut self, side: NeighborSide) -> Coordinate {
        self.current = self.current.neighbor(side);
        self.current
    }

    /// Moves by a raw vector and returns the new position.
    pub fn shift(&mut self, dx: i32, dy: i32, dz: i32) -> Coordinate {
        self.current = self.current.add(dx, dy, dz);
        self.current
    }

    /// True once every step has been undone.
    #[must_use]
    pub fn is_at_origin(&self) -> bool {
        self.current == self.origin
    }
}

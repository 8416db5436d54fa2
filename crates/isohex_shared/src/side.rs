//! The three visible faces of a cell.

use serde::{Deserialize, Serialize};

/// A visible face of a block sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Left face.
    Left = 0,
    /// Top face.
    Top = 1,
    /// Right face.
    Right = 2,
}

impl Side {
    /// All sides in index order.
    pub const ALL: [Self; 3] = [Self::Left, Self::Top, Self::Right];

    /// Order in which a block's faces are drawn.
    pub const DRAW_ORDER: [Self; 3] = [Self::Top, Self::Left, Self::Right];

    /// Numeric code used in sprite keys and bit positions.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Index into per-side arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Converts a code back into a side.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Left),
            1 => Some(Self::Top),
            2 => Some(Self::Right),
            _ => None,
        }
    }
}

//! # ISOHEX Shared
//!
//! Pure grid geometry used by every ISOHEX component.
//!
//! The grid is isometric with a staggered ("hex-offset") row scheme: every
//! odd row is shifted half a cell to the right, so a cell has eight
//! neighbors arranged like a diamond plus itself.
//!
//! ```text
//! 7 \ 0 / 1
//! ---------
//! 6 | 8 | 2
//! ---------
//! 5 / 4 \ 3
//! ```
//!
//! ## CRITICAL RULE
//!
//! Nothing in this crate caches or mutates shared state. Conversions take
//! an [`IsoGrid`] by reference and return new values.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod coordinate;
pub mod grid;
pub mod point;
pub mod side;
pub mod view;

pub use config::{ConfigError, GridConfig};
pub use coordinate::{Coordinate, NeighborCursor, NeighborSide};
pub use grid::IsoGrid;
pub use point::Point;
pub use side::Side;
pub use view::{ViewPosition, Viewport, VisibleRegion};

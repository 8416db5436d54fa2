//! Projection between game-space points and grid coordinates.
//!
//! A cell's footprint is a diamond inscribed in a `diag x diag` square of
//! game space. Two rows share one square: the even row owns the corners,
//! the odd row owns the center.

use crate::config::{ConfigError, GridConfig};
use crate::coordinate::{Coordinate, NeighborSide};
use crate::point::Point;

/// Derived grid metrics for one [`GridConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsoGrid {
    config: GridConfig,
    diag: i32,
    diag2: i32,
    edge: i32,
    z_shortening: f32,
}

impl Default for IsoGrid {
    fn default() -> Self {
        Self::from_valid(GridConfig::default())
    }
}

impl IsoGrid {
    /// Builds grid metrics from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn new(config: GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: GridConfig) -> Self {
        let diag = config.view_width;
        // Edge length is the diagonal shortened by sqrt(2), truncated.
        let edge = (diag as f32 / std::f32::consts::SQRT_2) as i32;
        Self {
            config,
            diag,
            diag2: diag / 2,
            edge,
            z_shortening: config.view_height as f32 / edge as f32,
        }
    }

    /// The configuration these metrics were derived from.
    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Diagonal length of a cell footprint in game space.
    #[inline]
    #[must_use]
    pub const fn diag_length(&self) -> i32 {
        self.diag
    }

    /// Half the diagonal length.
    #[inline]
    #[must_use]
    pub const fn half_diag_length(&self) -> i32 {
        self.diag2
    }

    /// Game-space height of one cell. One game meter.
    #[inline]
    #[must_use]
    pub const fn edge_length(&self) -> i32 {
        self.edge
    }

    /// Factor by which the z axis is distorted by the projection angle.
    #[inline]
    #[must_use]
    pub const fn z_shortening(&self) -> f32 {
        self.z_shortening
    }

    /// Vertical extent of the map in cells.
    #[inline]
    #[must_use]
    pub const fn blocks_z(&self) -> i32 {
        self.config.chunk_blocks_z
    }

    /// Which of the nine regions of a footprint square a position falls into.
    ///
    /// `x` and `y` are offsets inside the square, as produced by the
    /// truncated remainder of a game-space position. Negative offsets are
    /// wrapped by adding the diagonal once. The four half-plane tests run
    /// in a fixed order and later tests refine earlier results, which is
    /// what decides ties on region borders.
    #[must_use]
    pub fn classify_neighbor_side(&self, x: f32, y: f32) -> NeighborSide {
        let diag = self.diag as f32;
        let half = self.diag2 as f32;
        let y = if y < 0.0 { y + diag } else { y };
        let x = if x < 0.0 { x + diag } else { x };

        let mut result = NeighborSide::Center;
        if x + y <= half {
            result = NeighborSide::TopLeft;
        }
        if x - y >= half {
            result = if result == NeighborSide::TopLeft {
                NeighborSide::Top
            } else {
                NeighborSide::TopRight
            };
        }
        if x + y >= 3.0 * half {
            result = if result == NeighborSide::TopRight {
                NeighborSide::Right
            } else {
                NeighborSide::BottomRight
            };
        }
        if -x + y >= half {
            result = match result {
                NeighborSide::BottomRight => NeighborSide::Bottom,
                NeighborSide::TopLeft => NeighborSide::Left,
                _ => NeighborSide::BottomLeft,
            };
        }
        result
    }

    /// The cell containing a game-space point.
    #[must_use]
    pub fn point_to_coordinate(&self, p: Point) -> Coordinate {
        let base = self.footprint_base(p);
        let diag = self.diag as f32;
        base.neighbor(self.classify_neighbor_side(p.x % diag, p.y % diag))
    }

    /// The center of a cell's footprint at its bottom face.
    #[must_use]
    pub fn coordinate_to_point(&self, c: Coordinate) -> Point {
        Point::new(
            (c.x * self.diag + if c.is_odd_row() { self.diag2 } else { 0 }) as f32,
            (c.y * self.diag2) as f32,
            (c.z * self.edge) as f32,
        )
    }

    /// Checks whether `point` lies inside `coord` without building a new coordinate first.
    #[must_use]
    pub fn contains(&self, coord: Coordinate, point: Point) -> bool {
        self.point_to_coordinate(point) == coord
    }

    /// The odd-row cell owning the center of the footprint square under `p`.
    fn footprint_base(&self, p: Point) -> Coordinate {
        Coordinate::new(
            (p.x as i32).div_euclid(self.diag),
            (p.y as i32).div_euclid(self.diag) * 2 + 1,
            (p.z as i32).div_euclid(self.edge),
        )
    }
}

//! View-space projection helpers.
//!
//! View space is the 2-D sprite plane: x grows to the right, y grows
//! upward. Projection space is view space relative to a camera's viewport,
//! with the origin at the viewport's lower-left corner.

use crate::coordinate::Coordinate;
use crate::grid::IsoGrid;
use crate::point::Point;

/// A 2-D position in view or projection space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewPosition {
    /// Horizontal offset
    pub x: i32,
    /// Vertical offset
    pub y: i32,
}

impl ViewPosition {
    /// Creates a new view position
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The camera's visible rectangle, in view space.
///
/// Supplied by the external camera every frame; the core only reads it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// View-space x of the viewport center.
    pub center_x: f32,
    /// View-space y of the viewport center.
    pub center_y: f32,
    /// Width in projection-space pixels.
    pub width: f32,
    /// Height in projection-space pixels.
    pub height: f32,
}

impl Viewport {
    /// Creates a new viewport
    #[must_use]
    pub const fn new(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self { center_x, center_y, width, height }
    }

    /// Leftmost visible view-space x.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.center_x - self.width / 2.0
    }

    /// Rightmost visible view-space x.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.center_x + self.width / 2.0
    }

    /// Lowest visible view-space y.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.center_y - self.height / 2.0
    }

    /// Highest visible view-space y.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.center_y + self.height / 2.0
    }

    /// Converts a view-space position into this viewport's projection space.
    #[must_use]
    pub fn to_projection(&self, view: ViewPosition) -> ViewPosition {
        ViewPosition::new(
            (view.x as f32 - self.center_x + self.width / 2.0) as i32,
            (view.y as f32 - self.center_y + self.height / 2.0) as i32,
        )
    }

    /// Whether a sprite anchored at `view` can overlap the viewport.
    ///
    /// A sprite extends half a cell width to each side and up to two cell
    /// heights above its anchor.
    #[must_use]
    pub fn in_view_frustum(&self, grid: &IsoGrid, view: ViewPosition) -> bool {
        let half_width = (grid.config().view_width / 2) as f32;
        let height = grid.config().view_height as f32;
        let (vx, vy) = (view.x as f32, view.y as f32);
        self.top() > vy - height * 2.0
            && self.left() < vx + half_width
            && self.right() > vx - half_width
            && self.bottom() < vy + height
    }
}

/// An inclusive block of coordinates covering everything a viewport can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibleRegion {
    /// Lowest x.
    pub x_min: i32,
    /// Highest x.
    pub x_max: i32,
    /// Backmost row.
    pub y_min: i32,
    /// Frontmost row.
    pub y_max: i32,
    /// Lowest layer.
    pub z_min: i32,
    /// Highest layer.
    pub z_max: i32,
}

impl VisibleRegion {
    /// Number of cells in the region.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let span = |lo: i32, hi: i32| if hi < lo { 0 } else { (hi - lo + 1) as usize };
        span(self.x_min, self.x_max) * span(self.y_min, self.y_max) * span(self.z_min, self.z_max)
    }

    /// Whether `coord` lies inside the region.
    #[must_use]
    pub const fn contains(&self, coord: Coordinate) -> bool {
        coord.is_in_cube(
            Coordinate::new(self.x_min, self.y_min, self.z_min),
            Coordinate::new(self.x_max, self.y_max, self.z_max),
        )
    }

    /// Every coordinate in the region, bottom layer first, back to front.
    pub fn coordinates(self) -> impl Iterator<Item = Coordinate> {
        let Self { x_min, x_max, y_min, y_max, z_min, z_max } = self;
        (z_min..=z_max).flat_map(move |z| {
            (y_min..=y_max).flat_map(move |y| (x_min..=x_max).map(move |x| Coordinate::new(x, y, z)))
        })
    }
}

impl IsoGrid {
    /// View-space position of a cell's anchor.
    #[must_use]
    pub fn coordinate_view_position(&self, c: Coordinate) -> ViewPosition {
        let cfg = self.config();
        ViewPosition::new(
            c.x * cfg.view_width + if c.is_odd_row() { cfg.view_width / 2 } else { 0 },
            -c.y * (cfg.view_depth / 2) + c.z * cfg.view_height,
        )
    }

    /// View-space position of a game-space point.
    #[must_use]
    pub fn point_view_position(&self, p: Point) -> ViewPosition {
        ViewPosition::new(p.x as i32, (-p.y / 2.0 + p.z * self.z_shortening()) as i32)
    }

    /// Projection-space position of a cell's anchor for a viewport.
    #[must_use]
    pub fn coordinate_projection(&self, c: Coordinate, viewport: &Viewport) -> ViewPosition {
        viewport.to_projection(self.coordinate_view_position(c))
    }

    /// Projection-space position of a point for a viewport.
    #[must_use]
    pub fn point_projection(&self, p: Point, viewport: &Viewport) -> ViewPosition {
        viewport.to_projection(self.point_view_position(p))
    }

    /// Coordinates whose sprites can reach into the viewport.
    #[must_use]
    pub fn visible_region(&self, viewport: &Viewport) -> VisibleRegion {
        let cfg = self.config();
        let width = cfg.view_width as f32;
        let half_depth = (cfg.view_depth / 2) as f32;
        let height = cfg.view_height as f32;
        let top_layer = self.blocks_z() - 1;

        // view_y = -y * half_depth + z * height, solved for y at the extremes.
        let y_min = (-(viewport.top() + 2.0 * height) / half_depth).floor() as i32;
        let y_max =
            ((top_layer as f32 * height - viewport.bottom() + 2.0 * height) / half_depth).ceil() as i32;

        VisibleRegion {
            x_min: (viewport.left() / width).floor() as i32 - 1,
            x_max: (viewport.right() / width).ceil() as i32 + 1,
            y_min,
            y_max,
            z_min: 0,
            z_max: top_layer,
        }
    }
}

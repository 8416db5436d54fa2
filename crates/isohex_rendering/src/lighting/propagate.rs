//! Additive light propagation into stored render cells.
//!
//! Light sources outside the core call these while walking their area of
//! effect. Every lit cell is remembered so the next frame can reset
//! exactly those cells.

use isohex_shared::{Coordinate, NeighborSide, Side};

use crate::storage::RenderStorage;

/// Adds `rgb` to one vertex of one side of the cell at `coord`.
///
/// Returns `false` when no cell is stored there or the cell is hidden.
pub fn add_light(
    storage: &mut RenderStorage,
    coord: Coordinate,
    side: Side,
    vertex: usize,
    rgb: [f32; 3],
) -> bool {
    let Some(cell) = storage.cell_mut(coord) else {
        return false;
    };
    if cell.is_hidden() {
        return false;
    }
    cell.light_mut().add_rgb(side, vertex, rgb);
    storage.mark_lit(coord);
    true
}

/// Adds light along the back edge of a side.
///
/// The top face shares its back edge with three cells behind it, so each
/// of them receives light on the vertex touching that edge. Left and right
/// faces only light their own four vertices. Returns how many vertices
/// were lit.
pub fn add_light_to_back_edge(
    storage: &mut RenderStorage,
    coord: Coordinate,
    side: Side,
    rgb: [f32; 3],
) -> usize {
    let targets: [(Coordinate, usize); 4] = if side == Side::Top {
        [
            (coord, 1),
            (coord.neighbor(NeighborSide::Top), 3),
            (coord.neighbor(NeighborSide::TopRight), 0),
            (coord.neighbor(NeighborSide::TopLeft), 2),
        ]
    } else {
        [(coord, 0), (coord, 1), (coord, 2), (coord, 3)]
    };

    targets
        .into_iter()
        .filter(|&(target, vertex)| add_light(storage, target, side, vertex, rgb))
        .count()
}

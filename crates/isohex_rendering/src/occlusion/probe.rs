//! The fixed neighbor walk that finds a cell's covered cells.
//!
//! Positions are probed in this order, relative to the cell:
//!
//! ```text
//! layer z-1:  below, back-right, back-left, back
//! layer z:    back, back-right, back-left
//! layer z+1:  back-left, back-right
//! ```
//!
//! The walk uses one [`NeighborCursor`] and returns to the origin. Lower
//! layers are skipped at the bottom of the map and upper ones at the top.

use isohex_shared::{Coordinate, NeighborCursor, NeighborSide};

/// Calls `probe` for every position that may be drawn before `origin`.
pub fn probe_covered(origin: Coordinate, blocks_z: i32, mut probe: impl FnMut(Coordinate)) {
    let mut cursor = NeighborCursor::new(origin);

    if origin.z > 0 {
        probe(cursor.shift(0, 0, -1));
        probe(cursor.step(NeighborSide::TopRight));
        probe(cursor.step(NeighborSide::Left));
        probe(cursor.step(NeighborSide::TopRight));
        cursor.shift(0, 2, 1);
    }

    probe(cursor.step(NeighborSide::Top));
    probe(cursor.step(NeighborSide::BottomRight));
    probe(cursor.step(NeighborSide::Left));

    if origin.z < blocks_z - 1 {
        probe(cursor.shift(0, 0, 1));
        probe(cursor.step(NeighborSide::Right));
        cursor.shift(-1, 0, -1);
    }

    cursor.step(NeighborSide::BottomRight);
    debug_assert!(cursor.is_at_origin(), "probe walk ended at {}", cursor.current());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(origin: Coordinate, blocks_z: i32) -> Vec<Coordinate> {
        let mut seen = Vec::new();
        probe_covered(origin, blocks_z, |c| seen.push(c));
        seen
    }

    fn expected(c: Coordinate, blocks_z: i32) -> Vec<Coordinate> {
        let mut out = Vec::new();
        if c.z > 0 {
            let below = c.below();
            out.extend([
                below,
                below.neighbor(NeighborSide::TopRight),
                below.neighbor(NeighborSide::TopLeft),
                below.neighbor(NeighborSide::Top),
            ]);
        }
        out.extend([
            c.neighbor(NeighborSide::Top),
            c.neighbor(NeighborSide::TopRight),
            c.neighbor(NeighborSide::TopLeft),
        ]);
        if c.z < blocks_z - 1 {
            let above = c.above();
            out.extend([above.neighbor(NeighborSide::TopLeft), above.neighbor(NeighborSide::TopRight)]);
        }
        out
    }

    #[test]
    fn test_walk_matches_neighbor_table() {
        for y in -3..5 {
            for z in 0..4 {
                let c = Coordinate::new(2, y, z);
                assert_eq!(walk(c, 4), expected(c, 4), "{c}");
            }
        }
    }

    #[test]
    fn test_layer_limits() {
        assert_eq!(walk(Coordinate::new(0, 0, 0), 10).len(), 5);
        assert_eq!(walk(Coordinate::new(0, 0, 9), 10).len(), 7);
        assert_eq!(walk(Coordinate::new(0, 1, 4), 10).len(), 9);
        assert_eq!(walk(Coordinate::new(0, 1, 0), 1).len(), 3);
    }

    #[test]
    fn test_even_row_positions() {
        let probes = walk(Coordinate::new(1, 0, 1), 3);
        assert_eq!(probes[0], Coordinate::new(1, 0, 0));
        assert_eq!(probes[1], Coordinate::new(1, -1, 0));
        assert_eq!(probes[2], Coordinate::new(0, -1, 0));
        assert_eq!(probes[3], Coordinate::new(1, -2, 0));
        assert_eq!(probes[7], Coordinate::new(0, -1, 2));
        assert_eq!(probes[8], Coordinate::new(1, -1, 2));
    }
}

//! # Covered List Tests
//!
//! Verifies lazy rebuilding against the shared clock and the exact
//! neighbor positions a rebuild looks at.

use std::sync::Arc;

use isohex_rendering::{
    BlockCatalog, Coordinate, EntityId, IsoGrid, NeighborSide, Occupant, RebuildClock, RenderCell,
    RenderStorage, Renderable,
};

fn filled_storage(clock: Arc<RebuildClock>) -> RenderStorage {
    let catalog = BlockCatalog::new();
    let mut storage = RenderStorage::with_clock(IsoGrid::default(), clock);
    for z in 0..3 {
        for y in -4..6 {
            for x in -2..4 {
                storage.insert(RenderCell::new(&catalog, Coordinate::new(x, y, z), 3, 0));
            }
        }
    }
    storage
}

/// Test: A marker bump costs exactly one rebuild on the next request.
#[test]
fn test_marker_bump_rebuilds_once() {
    let clock = Arc::new(RebuildClock::new());
    let mut storage = filled_storage(Arc::clone(&clock));
    let c = Coordinate::new(0, 1, 1);

    storage.covered(c).expect("stored");
    storage.reset_stats();

    assert!(clock.mark_dirty(clock.current() + 10));
    storage.covered(c).expect("stored");
    assert_eq!(storage.stats().rebuilds, 1);

    storage.covered(c).expect("stored");
    storage.covered(c).expect("stored");
    assert_eq!(storage.stats().rebuilds, 1);
    assert_eq!(storage.stats().cache_hits, 2);
}

/// Test: A warm cache answers without probing the neighborhood.
#[test]
fn test_cache_hit_issues_no_probes() {
    let mut storage = filled_storage(Arc::new(RebuildClock::new()));
    let c = Coordinate::new(0, 0, 0);

    let first = storage.covered(c).expect("stored");
    let probes = storage.stats().probes;
    let second = storage.covered(c).expect("stored");

    assert_eq!(first, second);
    assert_eq!(storage.stats().probes, probes);
}

/// Test: A regressed marker never makes a fresh list stale.
#[test]
fn test_marker_regression_ignored() {
    let clock = Arc::new(RebuildClock::new());
    let mut storage = filled_storage(Arc::clone(&clock));
    let c = Coordinate::new(1, 2, 2);
    storage.covered(c).expect("stored");
    storage.reset_stats();

    assert!(!clock.mark_dirty(0));
    storage.covered(c).expect("stored");
    assert_eq!(storage.stats().rebuilds, 0);
}

/// Test: Interior cells list their nine covered neighbors in walk order.
#[test]
fn test_probe_order_interior() {
    let mut storage = filled_storage(Arc::new(RebuildClock::new()));

    for c in [Coordinate::new(1, 1, 1), Coordinate::new(1, 2, 1)] {
        let below = c.below();
        let above = c.above();
        let expected: Vec<Renderable> = [
            below,
            below.neighbor(NeighborSide::TopRight),
            below.neighbor(NeighborSide::TopLeft),
            below.neighbor(NeighborSide::Top),
            c.neighbor(NeighborSide::Top),
            c.neighbor(NeighborSide::TopRight),
            c.neighbor(NeighborSide::TopLeft),
            above.neighbor(NeighborSide::TopLeft),
            above.neighbor(NeighborSide::TopRight),
        ]
        .into_iter()
        .map(Renderable::Cell)
        .collect();

        assert_eq!(storage.covered(c).expect("stored"), expected, "{c}");
    }
}

/// Test: Missing neighbors are left out, present ones keep their order.
#[test]
fn test_sparse_neighborhood() {
    let catalog = BlockCatalog::new();
    let mut storage = RenderStorage::new(IsoGrid::default());
    let c = Coordinate::new(0, 3, 0);
    let top_left = c.neighbor(NeighborSide::TopLeft);
    let upper_right = c.above().neighbor(NeighborSide::TopRight);
    for coord in [c, upper_right, top_left] {
        storage.insert(RenderCell::new(&catalog, coord, 1, 0));
    }

    assert_eq!(
        storage.covered(c).expect("stored"),
        vec![Renderable::Cell(top_left), Renderable::Cell(upper_right)]
    );
}

/// Test: Occupants lead the list by depth and never leak into the cache.
#[test]
fn test_occupants_are_per_frame() {
    let mut storage = filled_storage(Arc::new(RebuildClock::new()));
    let c = Coordinate::new(0, 0, 0);
    let static_len = storage.covered(c).expect("stored").len();

    storage.add_occupant(c, Occupant::new(EntityId(2), 5.0)).expect("stored");
    storage.add_occupant(c, Occupant::new(EntityId(1), 0.5)).expect("stored");

    let with_entities = storage.covered(c).expect("stored");
    assert_eq!(with_entities.len(), static_len + 2);
    assert_eq!(with_entities[0], Renderable::Entity(EntityId(1)));
    assert_eq!(with_entities[1], Renderable::Entity(EntityId(2)));

    let again = storage.covered(c).expect("stored");
    assert_eq!(again.len(), static_len + 2);

    storage.clear_occupants(c);
    assert_eq!(storage.covered(c).expect("stored").len(), static_len);
}

/// Test: Tearing down one storage leaves a shared clock usable for the others.
#[test]
fn test_teardown_keeps_shared_marker() {
    let clock = Arc::new(RebuildClock::new());
    let mut first = filled_storage(Arc::clone(&clock));
    let mut second = filled_storage(Arc::clone(&clock));
    let c = Coordinate::new(0, 1, 1);

    let marker = clock.current() + 50;
    assert!(clock.mark_dirty(marker));
    second.covered(c).expect("stored");
    first.teardown();
    assert!(first.is_empty());
    assert_eq!(clock.current(), marker);
    assert!(!clock.mark_dirty(1));

    second.reset_stats();
    assert!(clock.mark_dirty(marker + 1));
    second.covered(c).expect("stored");
    second.covered(c).expect("stored");
    assert_eq!(second.stats().rebuilds, 1);
    assert_eq!(second.stats().cache_hits, 1);
}

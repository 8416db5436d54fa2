//! Render cells of the loaded area and the per-frame draw order.
//!
//! [`RenderStorage`] owns every [`RenderCell`] around the camera. Covered
//! lists are cached per cell and rebuilt lazily against the shared
//! [`RebuildClock`]. Draw order is a depth-first walk of the covered
//! graph: a cell is emitted only after everything it covers.
//!
//! ## Frame lifecycle
//!
//! ```text
//! clear_all_occupants → add_occupant* → reset_lighting → add_light*
//!     → collect_frame(viewport)
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use isohex_shared::{Coordinate, GridConfig, IsoGrid, Viewport, VisibleRegion};

use crate::block::BlockCatalog;
use crate::cell::{DrawItem, Occupant, RenderCell, Renderable};
use crate::error::{RenderError, RenderResult};
use crate::map::{BlockStore, MapAccess};
use crate::occlusion::{probe_covered, OcclusionStats, RebuildClock};
use crate::sprite::{SpriteAtlas, SpriteRegistry};

/// Counters for one [`RenderStorage::collect_frame`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Cells visited by the draw-order walk.
    pub cells_considered: u32,
    /// Cells that produced draw items.
    pub cells_drawn: u32,
    /// Cells rejected by culling.
    pub cells_culled: u32,
    /// Cells skipped because their sprites were missing.
    pub cells_skipped: u32,
    /// Dynamic objects placed in the order.
    pub entities: u32,
}

/// Ordered draw items for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDrawList {
    /// Items in painter's order, back first.
    pub items: Vec<DrawItem>,
    /// Counters.
    pub stats: FrameStats,
}

/// All render cells of the loaded area.
pub struct RenderStorage {
    grid: IsoGrid,
    cells: HashMap<Coordinate, RenderCell>,
    clock: Arc<RebuildClock>,
    stats: OcclusionStats,
    lit: HashSet<Coordinate>,
    static_shade: bool,
}

impl RenderStorage {
    /// Empty storage with its own clock.
    #[must_use]
    pub fn new(grid: IsoGrid) -> Self {
        Self::with_clock(grid, Arc::new(RebuildClock::new()))
    }

    /// Empty storage over a grid built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Config`] if the configuration is invalid.
    pub fn from_config(config: GridConfig) -> RenderResult<Self> {
        Ok(Self::new(IsoGrid::new(config)?))
    }

    /// Empty storage sharing an existing clock.
    #[must_use]
    pub fn with_clock(grid: IsoGrid, clock: Arc<RebuildClock>) -> Self {
        Self {
            grid,
            cells: HashMap::new(),
            clock,
            stats: OcclusionStats::default(),
            lit: HashSet::new(),
            static_shade: false,
        }
    }

    /// Grid metrics.
    #[must_use]
    pub const fn grid(&self) -> &IsoGrid {
        &self.grid
    }

    /// The shared rebuild clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<RebuildClock> {
        &self.clock
    }

    /// Covered-list counters since creation or the last reset.
    #[must_use]
    pub const fn stats(&self) -> &OcclusionStats {
        &self.stats
    }

    /// Zeroes the covered-list counters.
    pub fn reset_stats(&mut self) {
        self.stats = OcclusionStats::default();
    }

    /// Brightens left faces and darkens right faces in emitted geometry.
    pub fn set_static_shade(&mut self, enabled: bool) {
        self.static_shade = enabled;
    }

    /// Number of stored cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cell at `coord`.
    #[must_use]
    pub fn cell(&self, coord: Coordinate) -> Option<&RenderCell> {
        self.cells.get(&coord)
    }

    /// The cell at `coord`, mutably.
    pub fn cell_mut(&mut self, coord: Coordinate) -> Option<&mut RenderCell> {
        self.cells.get_mut(&coord)
    }

    /// Stores a cell, replacing any previous one, and invalidates every
    /// covered list.
    pub fn insert(&mut self, cell: RenderCell) -> Option<RenderCell> {
        let previous = self.cells.insert(cell.coord(), cell);
        self.clock.invalidate();
        previous
    }

    /// Removes a cell and invalidates every covered list.
    pub fn remove(&mut self, coord: Coordinate) -> Option<RenderCell> {
        let removed = self.cells.remove(&coord);
        if removed.is_some() {
            self.lit.remove(&coord);
            self.clock.invalidate();
        }
        removed
    }

    /// Builds cells for every loaded position of `region` from the map
    /// and drops cells outside it.
    ///
    /// Returns the number of cells stored.
    pub fn populate<S: BlockStore>(
        &mut self,
        map: &MapAccess<'_, S>,
        catalog: &BlockCatalog,
        region: VisibleRegion,
    ) -> usize {
        let before = self.cells.len();
        self.cells.retain(|coord, _| region.contains(*coord));
        self.lit.retain(|coord| region.contains(*coord));
        let evicted = before - self.cells.len();

        let mut stored = 0;
        for coord in region.coordinates() {
            if !map.is_in_memory_area(coord) {
                continue;
            }
            let cell = RenderCell::new(catalog, coord, map.block_id(coord), map.block_value(coord))
                .with_health(map.health(coord));
            self.cells.insert(coord, cell);
            stored += 1;
        }
        self.clock.invalidate();
        tracing::debug!(stored, evicted, cells = self.cells.len(), "render storage populated");
        stored
    }

    /// Rebuilds the cell at `coord` from the map after an edit.
    pub fn refresh_cell<S: BlockStore>(
        &mut self,
        map: &MapAccess<'_, S>,
        catalog: &BlockCatalog,
        coord: Coordinate,
    ) {
        if map.is_in_memory_area(coord) {
            let cell = RenderCell::new(catalog, coord, map.block_id(coord), map.block_value(coord))
                .with_health(map.health(coord));
            self.insert(cell);
        } else {
            self.remove(coord);
        }
    }

    /// Covered list of a cell: occupants by ascending depth, then the
    /// cached static list.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::CellNotFound`] if no cell is stored at `coord`.
    pub fn covered(&mut self, coord: Coordinate) -> RenderResult<Vec<Renderable>> {
        let mut out = Vec::new();
        self.covered_into(coord, &mut out)?;
        Ok(out)
    }

    /// Like [`RenderStorage::covered`], but writes into a caller buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::CellNotFound`] if no cell is stored at `coord`.
    pub fn covered_into(&mut self, coord: Coordinate, out: &mut Vec<Renderable>) -> RenderResult<()> {
        out.clear();
        if !self.cells.contains_key(&coord) {
            return Err(RenderError::CellNotFound(coord));
        }
        self.stats.lists_requested += 1;

        let stale = self.cells.get(&coord).map_or(true, |cell| self.clock.is_stale(cell.last_rebuild));
        if stale {
            self.rebuild(coord);
        } else {
            self.stats.cache_hits += 1;
        }

        let Some(cell) = self.cells.get_mut(&coord) else {
            return Err(RenderError::CellNotFound(coord));
        };
        if !cell.occupants.is_empty() {
            cell.occupants.sort_by(|a, b| a.depth.total_cmp(&b.depth));
            self.stats.occupants_sorted += cell.occupants.len() as u64;
            out.extend(cell.occupants.iter().map(|o| Renderable::Entity(o.id)));
        }
        out.extend_from_slice(&cell.covered);
        Ok(())
    }

    /// Rebuilds a covered list now, regardless of the clock.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::CellNotFound`] if no cell is stored at `coord`.
    pub fn rebuild_covered(&mut self, coord: Coordinate) -> RenderResult<usize> {
        if !self.cells.contains_key(&coord) {
            return Err(RenderError::CellNotFound(coord));
        }
        Ok(self.rebuild(coord))
    }

    fn rebuild(&mut self, coord: Coordinate) -> usize {
        let mut covered = self
            .cells
            .get_mut(&coord)
            .map(|cell| std::mem::take(&mut cell.covered))
            .unwrap_or_default();
        covered.clear();

        let mut probes = 0u64;
        probe_covered(coord, self.grid.blocks_z(), |probe| {
            probes += 1;
            if self.cells.contains_key(&probe) {
                covered.push(Renderable::Cell(probe));
            }
        });

        let marker = self.clock.current();
        let found = covered.len();
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.covered = covered;
            cell.last_rebuild = Some(marker);
        }
        self.stats.rebuilds += 1;
        self.stats.probes += probes;
        tracing::trace!(%coord, found, marker, "covered list rebuilt");
        found
    }

    /// Registers a dynamic object with a cell until occupants are cleared.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::CellNotFound`] if no cell is stored at `coord`.
    pub fn add_occupant(&mut self, coord: Coordinate, occupant: Occupant) -> RenderResult<()> {
        let cell = self.cells.get_mut(&coord).ok_or(RenderError::CellNotFound(coord))?;
        cell.occupants.push(occupant);
        Ok(())
    }

    /// Removes every occupant of one cell.
    pub fn clear_occupants(&mut self, coord: Coordinate) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.occupants.clear();
        }
    }

    /// Removes every occupant of every cell.
    pub fn clear_all_occupants(&mut self) {
        for cell in self.cells.values_mut() {
            cell.occupants.clear();
        }
    }

    /// Remembers that a cell received light this frame.
    pub fn mark_lit(&mut self, coord: Coordinate) {
        self.lit.insert(coord);
    }

    /// Whether a cell received light since the last reset.
    #[must_use]
    pub fn is_lit(&self, coord: Coordinate) -> bool {
        self.lit.contains(&coord)
    }

    /// Returns every lit cell to neutral light. Returns how many were reset.
    pub fn reset_lighting(&mut self) -> usize {
        let mut reset = 0;
        for coord in self.lit.drain() {
            if let Some(cell) = self.cells.get_mut(&coord) {
                cell.light_mut().reset_light();
                reset += 1;
            }
        }
        reset
    }

    /// Drops built face sprites of every cell. Pair with
    /// [`SpriteRegistry::clear_cache`] when the atlas is reloaded.
    pub fn clear_side_sprites(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear_side_sprites();
        }
    }

    /// Drops every cell and lit mark.
    ///
    /// The clock is rewound to zero only when this storage is its sole
    /// owner. A shared clock keeps its marker so that cells of the other
    /// storages stay comparable against it.
    pub fn teardown(&mut self) {
        self.cells.clear();
        self.lit.clear();
        if Arc::strong_count(&self.clock) == 1 {
            self.clock.reset();
        }
        tracing::debug!("render storage torn down");
    }

    /// Painter's order of everything visible: each cell follows the cells
    /// and occupants it covers.
    pub fn draw_order(&mut self, viewport: &Viewport) -> Vec<Renderable> {
        self.walk_draw_order(viewport).0
    }

    /// Draw order plus the number of cells the walk visited.
    fn walk_draw_order(&mut self, viewport: &Viewport) -> (Vec<Renderable>, usize) {
        let region = self.grid.visible_region(viewport);
        let roots: Vec<Coordinate> =
            region.coordinates().filter(|c| self.cells.contains_key(c)).collect();

        let mut order = Vec::new();
        let mut visited: HashSet<Renderable> = HashSet::with_capacity(roots.len());
        let mut stack: Vec<(Renderable, bool)> = Vec::new();
        let mut covered = Vec::new();

        for root in roots {
            stack.push((Renderable::Cell(root), false));
            while let Some((node, expanded)) = stack.pop() {
                if expanded {
                    let visible = match node {
                        Renderable::Cell(c) => self
                            .cells
                            .get(&c)
                            .is_some_and(|cell| cell.should_be_rendered(&self.grid, viewport)),
                        Renderable::Entity(_) => true,
                    };
                    if visible {
                        order.push(node);
                    }
                    continue;
                }
                if !visited.insert(node) {
                    continue;
                }
                stack.push((node, true));
                if let Renderable::Cell(c) = node {
                    if self.covered_into(c, &mut covered).is_ok() {
                        stack.extend(
                            covered.iter().rev().filter(|m| !visited.contains(*m)).map(|&m| (m, false)),
                        );
                    }
                }
            }
        }
        let visited_cells = visited.iter().filter(|r| matches!(r, Renderable::Cell(_))).count();
        (order, visited_cells)
    }

    /// Builds the frame's draw list.
    ///
    /// Cells whose sprites cannot be resolved are skipped with a warning;
    /// the rest of the frame is still produced.
    pub fn collect_frame<A: SpriteAtlas>(
        &mut self,
        registry: &SpriteRegistry<A>,
        viewport: &Viewport,
    ) -> FrameDrawList {
        let (order, visited_cells) = self.walk_draw_order(viewport);
        let mut stats = FrameStats { cells_considered: visited_cells as u32, ..FrameStats::default() };
        let grid = self.grid;
        let static_shade = self.static_shade;
        let mut items = Vec::with_capacity(order.len() * 3);

        for node in order {
            match node {
                Renderable::Entity(id) => {
                    items.push(DrawItem::Entity(id));
                    stats.entities += 1;
                }
                Renderable::Cell(coord) => {
                    let Some(cell) = self.cells.get_mut(&coord) else {
                        continue;
                    };
                    match cell.emit(&grid, registry, static_shade, &mut items) {
                        Ok(_) => stats.cells_drawn += 1,
                        Err(err) => {
                            tracing::warn!(%coord, error = %err, "skipping cell");
                            stats.cells_skipped += 1;
                        }
                    }
                }
            }
        }
        // Drawn and skipped cells are a subset of the visited ones.
        stats.cells_culled = stats.cells_considered - stats.cells_drawn - stats.cells_skipped;
        FrameDrawList { items, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::EntityId;
    use crate::sprite::SpriteHandle;
    use isohex_shared::{ConfigError, NeighborSide};

    fn stone(storage: &mut RenderStorage, coords: &[Coordinate]) {
        let catalog = BlockCatalog::new();
        for &c in coords {
            storage.insert(RenderCell::new(&catalog, c, 3, 0));
        }
    }

    #[test]
    fn test_covered_collects_existing_neighbors() {
        let mut storage = RenderStorage::new(IsoGrid::default());
        let c = Coordinate::new(2, 4, 0);
        stone(&mut storage, &[c, c.neighbor(NeighborSide::Top), c.neighbor(NeighborSide::TopLeft)]);

        let covered = storage.covered(c).expect("cell stored");
        assert_eq!(
            covered,
            vec![
                Renderable::Cell(c.neighbor(NeighborSide::Top)),
                Renderable::Cell(c.neighbor(NeighborSide::TopLeft)),
            ]
        );
    }

    #[test]
    fn test_unknown_cell() {
        let mut storage = RenderStorage::new(IsoGrid::default());
        let c = Coordinate::new(0, 0, 0);
        assert!(matches!(storage.covered(c), Err(RenderError::CellNotFound(_))));
        assert!(storage.add_occupant(c, Occupant::new(EntityId(1), 0.0)).is_err());
    }

    #[test]
    fn test_occupants_sorted_before_static_list() {
        let mut storage = RenderStorage::new(IsoGrid::default());
        let c = Coordinate::new(0, 2, 0);
        let back = c.neighbor(NeighborSide::Top);
        stone(&mut storage, &[c, back]);

        storage.add_occupant(c, Occupant::new(EntityId(7), 3.0)).expect("cell stored");
        storage.add_occupant(c, Occupant::new(EntityId(8), -1.0)).expect("cell stored");
        storage.add_occupant(c, Occupant::new(EntityId(9), 3.0)).expect("cell stored");

        let covered = storage.covered(c).expect("cell stored");
        assert_eq!(
            covered,
            vec![
                Renderable::Entity(EntityId(8)),
                Renderable::Entity(EntityId(7)),
                Renderable::Entity(EntityId(9)),
                Renderable::Cell(back),
            ]
        );

        storage.clear_all_occupants();
        assert_eq!(storage.covered(c).expect("cell stored"), vec![Renderable::Cell(back)]);
    }

    #[test]
    fn test_draw_order_puts_covered_first() {
        let mut storage = RenderStorage::new(IsoGrid::default());
        let front = Coordinate::new(1, 4, 1);
        let back = front.neighbor(NeighborSide::Top);
        let below = front.below();
        stone(&mut storage, &[front, back, below]);

        let viewport = Viewport::new(200.0, -100.0, 1600.0, 1200.0);
        let order = storage.draw_order(&viewport);
        let pos = |c| order.iter().position(|r| *r == Renderable::Cell(c));
        assert!(pos(below) < pos(front));
        assert!(pos(back) < pos(front));
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn test_reset_lighting_only_touches_lit_cells() {
        let mut storage = RenderStorage::new(IsoGrid::default());
        let (a, b) = (Coordinate::new(0, 0, 0), Coordinate::new(1, 0, 0));
        stone(&mut storage, &[a, b]);
        for c in [a, b] {
            if let Some(cell) = storage.cell_mut(c) {
                cell.light_mut().set_uniform(0.1);
            }
        }
        storage.mark_lit(a);
        assert_eq!(storage.reset_lighting(), 1);
        assert_eq!(storage.cell(a).map(|c| *c.light()), Some(crate::lighting::CellLight::default()));
        assert_ne!(storage.cell(b).map(|c| *c.light()), Some(crate::lighting::CellLight::default()));
        assert!(!storage.is_lit(a));
    }

    #[test]
    fn test_insert_and_remove_invalidate() {
        let mut storage = RenderStorage::new(IsoGrid::default());
        let before = storage.clock().current();
        stone(&mut storage, &[Coordinate::new(0, 0, 0)]);
        assert!(storage.clock().current() > before);
        let mid = storage.clock().current();
        assert!(storage.remove(Coordinate::new(0, 0, 0)).is_some());
        assert!(storage.clock().current() > mid);
        assert!(storage.remove(Coordinate::new(0, 0, 0)).is_none());
        storage.teardown();
        assert!(storage.is_empty());
        assert_eq!(storage.clock().current(), 0);
    }

    #[test]
    fn test_rebuild_covered_ignores_clock() {
        let mut storage = RenderStorage::new(IsoGrid::default());
        let c = Coordinate::new(2, 4, 0);
        let (top, top_left) = (c.neighbor(NeighborSide::Top), c.neighbor(NeighborSide::TopLeft));
        stone(&mut storage, &[c, top]);
        assert_eq!(storage.covered(c).expect("cell stored"), vec![Renderable::Cell(top)]);

        // Stored behind the clock's back, so the cached list stays as it was.
        storage.cells.insert(top_left, RenderCell::new(&BlockCatalog::new(), top_left, 3, 0));
        assert_eq!(storage.covered(c).expect("cell stored"), vec![Renderable::Cell(top)]);

        storage.reset_stats();
        assert_eq!(storage.rebuild_covered(c).ok(), Some(2));
        assert_eq!(storage.stats().rebuilds, 1);
        assert_eq!(
            storage.covered(c).expect("cell stored"),
            vec![Renderable::Cell(top), Renderable::Cell(top_left)]
        );
        assert_eq!(storage.stats().rebuilds, 1);
        assert!(matches!(
            storage.rebuild_covered(Coordinate::new(40, 40, 0)),
            Err(RenderError::CellNotFound(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let storage = RenderStorage::from_config(GridConfig::default()).expect("default config");
        assert_eq!(*storage.grid().config(), GridConfig::default());

        let odd = GridConfig { view_width: 201, ..GridConfig::default() };
        assert!(matches!(
            RenderStorage::from_config(odd),
            Err(RenderError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_clear_side_sprites_on_every_cell() {
        let mut storage = RenderStorage::new(IsoGrid::default());
        let coords = [Coordinate::new(0, 0, 0), Coordinate::new(1, 0, 0)];
        stone(&mut storage, &coords);
        let registry: SpriteRegistry<HashMap<String, SpriteHandle>> =
            SpriteRegistry::new(HashMap::from([("error".to_string(), SpriteHandle(0))]));
        let grid = *storage.grid();
        let mut out = Vec::new();
        for c in coords {
            if let Some(cell) = storage.cell_mut(c) {
                assert_eq!(cell.emit(&grid, &registry, false, &mut out).ok(), Some(3));
            }
        }

        storage.clear_side_sprites();
        for c in coords {
            let cell = storage.cell(c).expect("cell stored");
            assert!(cell.side_sprite(isohex_shared::Side::Top).is_none());
        }
    }

    #[test]
    fn test_frame_counts_cells_outside_region() {
        let mut storage = RenderStorage::new(IsoGrid::default());
        let viewport = Viewport::new(400.0, -200.0, 800.0, 600.0);
        let region = storage.grid().visible_region(&viewport);
        let front = Coordinate::new(region.x_min + 2, region.y_min, 0);
        let back = front.neighbor(NeighborSide::Top);
        assert!(!region.contains(back));
        stone(&mut storage, &[front, back]);

        let registry: SpriteRegistry<HashMap<String, SpriteHandle>> =
            SpriteRegistry::new(HashMap::from([("error".to_string(), SpriteHandle(0))]));
        let stats = storage.collect_frame(&registry, &viewport).stats;
        assert_eq!(stats.cells_considered, 2);
        assert_eq!(
            stats.cells_considered,
            stats.cells_drawn + stats.cells_skipped + stats.cells_culled
        );
    }

    #[test]
    fn test_teardown_keeps_shared_clock() {
        let clock = Arc::new(RebuildClock::new());
        let mut a = RenderStorage::with_clock(IsoGrid::default(), Arc::clone(&clock));
        stone(&mut a, &[Coordinate::new(0, 0, 0)]);
        let marker = clock.current();
        a.teardown();
        assert!(a.is_empty());
        assert_eq!(clock.current(), marker);

        drop(clock);
        a.teardown();
        assert_eq!(a.clock().current(), 0);
    }
}

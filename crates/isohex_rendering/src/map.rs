//! Block storage seen by the renderer.
//!
//! [`BlockStore`] is the seam to whatever owns the map. [`MapAccess`]
//! wraps a store with the grid's vertical limits: below the map every
//! cell is ground, above it every cell is air, and neither ever errors.
//! [`ChunkedMap`] is an in-memory store for tools and tests.

use std::collections::HashMap;

use isohex_shared::{Coordinate, GridConfig, IsoGrid};
use parking_lot::RwLock;

use crate::block::{BlockCatalog, AIR_ID};
use crate::cell::MAX_HEALTH;

/// Horizontal index of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Chunk column.
    pub x: i32,
    /// Chunk row.
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing a cell.
    #[must_use]
    pub const fn containing(coord: Coordinate, config: &GridConfig) -> Self {
        Self::new(coord.chunk_x(config.chunk_blocks_x), coord.chunk_y(config.chunk_blocks_y))
    }
}

/// Raw cell storage. Positions are always inside the vertical range.
///
/// Writes take `&self`; stores synchronize internally.
pub trait BlockStore {
    /// Block id, air if the chunk is not loaded.
    fn block_id(&self, coord: Coordinate) -> u8;
    /// Block sub-value.
    fn block_value(&self, coord: Coordinate) -> u8;
    /// Health in `0..=100`.
    fn health(&self, coord: Coordinate) -> u8;
    /// Writes id and value. Ignored if the chunk is not loaded.
    fn set_block(&self, coord: Coordinate, id: u8, value: u8);
    /// Writes health. Ignored if the chunk is not loaded.
    fn set_health(&self, coord: Coordinate, health: u8);
    /// Whether the chunk holding `coord` is loaded.
    fn is_loaded(&self, coord: Coordinate) -> bool;
}

/// What a call to [`MapAccess::damage`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Nothing to damage, or zero damage.
    Unaffected,
    /// Health dropped; the block survives.
    Damaged {
        /// Health after the hit.
        health: u8,
    },
    /// The block reached zero health and was replaced by air.
    Destroyed,
}

/// Sentinel-aware view of a [`BlockStore`].
pub struct MapAccess<'a, S> {
    store: &'a S,
    grid: &'a IsoGrid,
}

impl<'a, S: BlockStore> MapAccess<'a, S> {
    /// Wraps a store.
    pub const fn new(store: &'a S, grid: &'a IsoGrid) -> Self {
        Self { store, grid }
    }

    /// The wrapped store.
    pub const fn store(&self) -> &'a S {
        self.store
    }

    fn in_range(&self, coord: Coordinate) -> bool {
        (0..self.grid.blocks_z()).contains(&coord.z)
    }

    /// Block id. Ground below the map, air above it.
    pub fn block_id(&self, coord: Coordinate) -> u8 {
        if coord.z < 0 {
            self.grid.config().ground_block_id
        } else if coord.z >= self.grid.blocks_z() {
            AIR_ID
        } else {
            self.store.block_id(coord)
        }
    }

    /// Block sub-value; zero outside the vertical range.
    pub fn block_value(&self, coord: Coordinate) -> u8 {
        if self.in_range(coord) {
            self.store.block_value(coord)
        } else {
            0
        }
    }

    /// Health; full outside the vertical range.
    pub fn health(&self, coord: Coordinate) -> u8 {
        if self.in_range(coord) {
            self.store.health(coord)
        } else {
            MAX_HEALTH
        }
    }

    /// Whether the cell is inside the vertical range and its chunk is loaded.
    pub fn is_in_memory_area(&self, coord: Coordinate) -> bool {
        self.in_range(coord) && self.store.is_loaded(coord)
    }

    /// Whether the cell's chunk is loaded, ignoring z.
    pub fn is_in_memory_area_horizontal(&self, coord: Coordinate) -> bool {
        self.store.is_loaded(Coordinate::new(coord.x, coord.y, 0))
    }

    /// Writes a block. Positions outside the vertical range are ignored.
    pub fn set_block(&self, coord: Coordinate, id: u8, value: u8) {
        if self.in_range(coord) {
            self.store.set_block(coord, id, value);
        }
    }

    /// Damages a block by `amount` health points.
    ///
    /// Health bottoms out at zero. A block at zero health becomes air
    /// unless the catalog marks it indestructible.
    pub fn damage(&self, catalog: &BlockCatalog, coord: Coordinate, amount: u8) -> DamageOutcome {
        if !self.is_in_memory_area(coord) {
            return DamageOutcome::Unaffected;
        }
        let id = self.store.block_id(coord);
        if id == AIR_ID || amount == 0 {
            return DamageOutcome::Unaffected;
        }
        let health = self.store.health(coord).saturating_sub(amount);
        self.store.set_health(coord, health);
        if health == 0 && !catalog.traits(id).indestructible {
            self.store.set_block(coord, AIR_ID, 0);
            tracing::debug!(%coord, id, "block destroyed");
            return DamageOutcome::Destroyed;
        }
        DamageOutcome::Damaged { health }
    }

    /// Destroys a block outright. Returns whether anything was destroyed.
    pub fn destroy(&self, coord: Coordinate) -> bool {
        if !self.is_in_memory_area(coord) {
            return false;
        }
        if self.store.block_id(coord) == AIR_ID || self.store.health(coord) == 0 {
            return false;
        }
        self.store.set_health(coord, 0);
        self.store.set_block(coord, AIR_ID, 0);
        true
    }
}

#[derive(Clone)]
struct Chunk {
    ids: Vec<u8>,
    values: Vec<u8>,
    health: Vec<u8>,
}

impl Chunk {
    fn new(volume: usize) -> Self {
        Self { ids: vec![AIR_ID; volume], values: vec![0; volume], health: vec![MAX_HEALTH; volume] }
    }
}

/// Chunked in-memory [`BlockStore`].
///
/// Safe to read from one thread while another writes.
pub struct ChunkedMap {
    config: GridConfig,
    chunks: RwLock<HashMap<ChunkCoord, Chunk>>,
}

impl ChunkedMap {
    /// Empty map with no loaded chunks.
    #[must_use]
    pub fn new(config: GridConfig) -> Self {
        Self { config, chunks: RwLock::new(HashMap::new()) }
    }

    fn volume(&self) -> usize {
        (self.config.chunk_blocks_x * self.config.chunk_blocks_y * self.config.chunk_blocks_z) as usize
    }

    fn index(&self, coord: Coordinate) -> Option<(ChunkCoord, usize)> {
        let cfg = &self.config;
        if !(0..cfg.chunk_blocks_z).contains(&coord.z) {
            return None;
        }
        let lx = coord.x.rem_euclid(cfg.chunk_blocks_x);
        let ly = coord.y.rem_euclid(cfg.chunk_blocks_y);
        let local = (coord.z * cfg.chunk_blocks_y + ly) * cfg.chunk_blocks_x + lx;
        Some((ChunkCoord::containing(coord, cfg), local as usize))
    }

    /// Loads an all-air chunk. Returns `false` if it was already loaded.
    pub fn load_chunk(&self, coord: ChunkCoord) -> bool {
        let mut chunks = self.chunks.write();
        if chunks.contains_key(&coord) {
            return false;
        }
        chunks.insert(coord, Chunk::new(self.volume()));
        true
    }

    /// Unloads a chunk. Returns whether it was loaded.
    pub fn unload_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunks.write().remove(&coord).is_some()
    }

    /// Number of loaded chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.read().len()
    }

    /// Fills the lowest `layers` layers of a loaded chunk with one block.
    pub fn fill_layers(&self, coord: ChunkCoord, layers: i32, id: u8) {
        let cfg = self.config;
        let per_layer = (cfg.chunk_blocks_x * cfg.chunk_blocks_y) as usize;
        let end = (layers.clamp(0, cfg.chunk_blocks_z) as usize) * per_layer;
        if let Some(chunk) = self.chunks.write().get_mut(&coord) {
            chunk.ids[..end].fill(id);
        }
    }

    fn read<R>(&self, coord: Coordinate, default: R, f: impl FnOnce(&Chunk, usize) -> R) -> R {
        match self.index(coord) {
            Some((chunk, local)) => self.chunks.read().get(&chunk).map_or(default, |c| f(c, local)),
            None => default,
        }
    }

    fn write(&self, coord: Coordinate, f: impl FnOnce(&mut Chunk, usize)) {
        let Some((chunk, local)) = self.index(coord) else {
            return;
        };
        match self.chunks.write().get_mut(&chunk) {
            Some(c) => f(c, local),
            None => tracing::debug!(%coord, "write to unloaded chunk ignored"),
        }
    }
}

impl BlockStore for ChunkedMap {
    fn block_id(&self, coord: Coordinate) -> u8 {
        self.read(coord, AIR_ID, |c, i| c.ids[i])
    }

    fn block_value(&self, coord: Coordinate) -> u8 {
        self.read(coord, 0, |c, i| c.values[i])
    }

    fn health(&self, coord: Coordinate) -> u8 {
        self.read(coord, MAX_HEALTH, |c, i| c.health[i])
    }

    fn set_block(&self, coord: Coordinate, id: u8, value: u8) {
        self.write(coord, |c, i| {
            c.ids[i] = id;
            c.values[i] = value;
            if id != AIR_ID {
                c.health[i] = MAX_HEALTH;
            }
        });
    }

    fn set_health(&self, coord: Coordinate, health: u8) {
        self.write(coord, |c, i| c.health[i] = health.min(MAX_HEALTH));
    }

    fn is_loaded(&self, coord: Coordinate) -> bool {
        self.chunks.read().contains_key(&ChunkCoord::containing(coord, &self.config))
    }
}

//! Render-side companion of one map cell.
//!
//! A [`RenderCell`] holds everything the frame builder needs about a cell:
//! block identity and capabilities, light, AO and clipping flags, the
//! cached covered list and the dynamic occupants standing in it.

use isohex_shared::{Coordinate, IsoGrid, Side, ViewPosition, Viewport};

use crate::block::{BlockCatalog, BlockKind, BlockTraits};
use crate::error::RenderResult;
use crate::lighting::{AoFlags, CellLight, ClipFlags, LightChannel};
use crate::sprite::{SideSprite, SpriteAtlas, SpriteKey, SpriteRegistry};

/// Full health of a block.
pub const MAX_HEALTH: u8 = 100;

/// Brightness offset applied to left and right faces when static shading is on.
pub const STATIC_SHADE: f32 = 0.25;

/// Id of a dynamic object, owned by whoever spawned it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// A dynamic object registered with a cell for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Occupant {
    /// The object.
    pub id: EntityId,
    /// Draw depth; smaller is drawn first.
    pub depth: f32,
}

impl Occupant {
    /// Creates an occupant.
    #[must_use]
    pub const fn new(id: EntityId, depth: f32) -> Self {
        Self { id, depth }
    }
}

/// Something that can appear in a covered list or draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Renderable {
    /// A stored render cell.
    Cell(Coordinate),
    /// A dynamic object.
    Entity(EntityId),
}

/// One face ready for the sprite batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SideGeometry {
    /// Owning cell.
    pub coord: Coordinate,
    /// Face.
    pub side: Side,
    /// Face sprite.
    pub sprite: crate::sprite::SpriteHandle,
    /// View-space lower-left of the sprite.
    pub position: ViewPosition,
    /// Decoded RGB per vertex.
    pub vertex_colors: [[f32; 3]; 4],
    /// AO flags for the shader.
    pub ao_flags: AoFlags,
    /// Damage overlay sprite value, if damaged.
    pub damage_overlay: Option<u8>,
    /// Whether the renderer should animate the face as liquid.
    pub liquid: bool,
}

/// An entry of a frame's draw list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawItem {
    /// A block face.
    Face(SideGeometry),
    /// A block drawn as one sprite.
    Billboard {
        /// Owning cell.
        coord: Coordinate,
        /// Sprite.
        sprite: crate::sprite::SpriteHandle,
        /// View-space anchor.
        position: ViewPosition,
        /// Averaged cell light.
        color: [f32; 3],
    },
    /// A dynamic object, drawn by its owner.
    Entity(EntityId),
}

/// Render state of one cell.
#[derive(Clone, Debug)]
pub struct RenderCell {
    coord: Coordinate,
    id: u8,
    value: u8,
    health: u8,
    traits: BlockTraits,
    hidden: bool,
    light: CellLight,
    ao_flags: AoFlags,
    clipping: ClipFlags,
    side_sprites: [Option<SideSprite>; 3],
    pub(crate) covered: Vec<Renderable>,
    pub(crate) last_rebuild: Option<u64>,
    pub(crate) occupants: Vec<Occupant>,
}

impl RenderCell {
    /// Builds the cell for a block with full health.
    #[must_use]
    pub fn new(catalog: &BlockCatalog, coord: Coordinate, id: u8, value: u8) -> Self {
        let traits = catalog.traits(id);
        Self {
            coord,
            id,
            value,
            health: MAX_HEALTH,
            traits,
            hidden: traits.hidden,
            light: CellLight::default(),
            ao_flags: AoFlags::NONE,
            clipping: ClipFlags::default(),
            side_sprites: [None; 3],
            covered: Vec::new(),
            last_rebuild: None,
            occupants: Vec::new(),
        }
    }

    /// Builds the cell with an explicit health value.
    #[must_use]
    pub fn with_health(mut self, health: u8) -> Self {
        self.health = health.min(MAX_HEALTH);
        self
    }

    /// Map position.
    #[must_use]
    pub const fn coord(&self) -> Coordinate {
        self.coord
    }

    /// Block id.
    #[must_use]
    pub const fn id(&self) -> u8 {
        self.id
    }

    /// Block sub-value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Block capabilities.
    #[must_use]
    pub const fn traits(&self) -> &BlockTraits {
        &self.traits
    }

    /// Drawing style.
    #[must_use]
    pub const fn kind(&self) -> BlockKind {
        if self.hidden {
            BlockKind::Hidden
        } else {
            self.traits.kind()
        }
    }

    /// Whether the cell is never drawn.
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Overrides visibility independently of the block id.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Whether the block blocks movement.
    #[must_use]
    pub const fn is_obstacle(&self) -> bool {
        self.traits.obstacle
    }

    /// Whether light and sight pass through.
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        self.traits.transparent
    }

    /// Whether the block is a liquid.
    #[must_use]
    pub const fn is_liquid(&self) -> bool {
        self.traits.liquid
    }

    /// Whether damage can never destroy the block.
    #[must_use]
    pub const fn is_indestructible(&self) -> bool {
        self.traits.indestructible
    }

    /// Display name from the catalog the cell was built with.
    #[must_use]
    pub fn name<'a>(&self, catalog: &'a BlockCatalog) -> &'a str {
        catalog.name(self.id)
    }

    /// Whether the block has three faces.
    #[must_use]
    pub const fn has_sides(&self) -> bool {
        self.traits.has_sides
    }

    /// Whether the block hides everything behind it.
    #[must_use]
    pub const fn hides_past_block(&self) -> bool {
        self.traits.hides_past_block()
    }

    /// Health in `0..=100`.
    #[must_use]
    pub const fn health(&self) -> u8 {
        self.health
    }

    /// Updates health, clamped to `0..=100`.
    pub fn set_health(&mut self, health: u8) {
        self.health = health.min(MAX_HEALTH);
    }

    /// Light words.
    #[must_use]
    pub const fn light(&self) -> &CellLight {
        &self.light
    }

    /// Mutable light words.
    pub fn light_mut(&mut self) -> &mut CellLight {
        &mut self.light
    }

    /// AO flags.
    #[must_use]
    pub const fn ao_flags(&self) -> AoFlags {
        self.ao_flags
    }

    /// Updates AO flags and pushes them into already built face sprites.
    pub fn set_ao_flags(&mut self, flags: AoFlags) {
        if flags == self.ao_flags {
            return;
        }
        self.ao_flags = flags;
        for sprite in self.side_sprites.iter_mut().flatten() {
            sprite.ao_flags = flags;
        }
    }

    /// Clipping flags.
    #[must_use]
    pub const fn clip_flags(&self) -> ClipFlags {
        self.clipping
    }

    /// Hides one face.
    pub fn set_clipped(&mut self, side: Side) {
        self.clipping.set_clipped(side);
    }

    /// Hides every face.
    pub fn set_fully_clipped(&mut self) {
        self.clipping.set_all();
    }

    /// Makes every face visible again.
    pub fn clear_clipping(&mut self) {
        self.clipping.clear_all();
    }

    /// Whether all three faces are hidden.
    #[must_use]
    pub const fn is_clipped(&self) -> bool {
        self.clipping.is_clipped()
    }

    /// Average light of one channel over the three faces.
    #[must_use]
    pub fn light_level(&self, channel: LightChannel) -> f32 {
        self.light.average_channel(channel)
    }

    /// The face sprite built so far, if any.
    #[must_use]
    pub fn side_sprite(&self, side: Side) -> Option<&SideSprite> {
        self.side_sprites[side.index()].as_ref()
    }

    /// Covered list as of the last rebuild, without occupants.
    #[must_use]
    pub fn static_covered(&self) -> &[Renderable] {
        &self.covered
    }

    /// Clock marker of the last rebuild; `None` until the first one.
    #[must_use]
    pub const fn last_rebuild(&self) -> Option<u64> {
        self.last_rebuild
    }

    /// Occupants registered this frame, in registration order until sorted.
    #[must_use]
    pub fn occupants(&self) -> &[Occupant] {
        &self.occupants
    }

    /// View-space anchor of the cell.
    #[must_use]
    pub fn view_position(&self, grid: &IsoGrid) -> ViewPosition {
        grid.coordinate_view_position(self.coord)
    }

    /// Whether the cell survives every cheap culling test.
    #[must_use]
    pub fn should_be_rendered(&self, grid: &IsoGrid, viewport: &Viewport) -> bool {
        self.id != 0
            && !self.is_clipped()
            && !self.hidden
            && viewport.in_view_frustum(grid, self.view_position(grid))
    }

    /// Appends this cell's draw items to `out`.
    ///
    /// Faces go in top, left, right order, skipping clipped ones. Face
    /// sprites are resolved once and then reused. On error nothing is
    /// appended.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RenderError::MissingAsset`] when a sprite and all
    /// its fallbacks are missing.
    pub fn emit<A: SpriteAtlas>(
        &mut self,
        grid: &IsoGrid,
        registry: &SpriteRegistry<A>,
        static_shade: bool,
        out: &mut Vec<DrawItem>,
    ) -> RenderResult<usize> {
        let start = out.len();
        let result = self.emit_inner(grid, registry, static_shade, out);
        if result.is_err() {
            out.truncate(start);
        }
        result.map(|()| out.len() - start)
    }

    fn emit_inner<A: SpriteAtlas>(
        &mut self,
        grid: &IsoGrid,
        registry: &SpriteRegistry<A>,
        static_shade: bool,
        out: &mut Vec<DrawItem>,
    ) -> RenderResult<()> {
        let anchor = self.view_position(grid);
        match self.kind() {
            BlockKind::Hidden => {}
            BlockKind::Billboard => {
                let sprite = registry.resolve(SpriteKey::block(self.id, self.value))?;
                out.push(DrawItem::Billboard {
                    coord: self.coord,
                    sprite,
                    position: anchor,
                    color: LightChannel::ALL.map(|c| self.light_level(c)),
                });
            }
            BlockKind::Sided | BlockKind::Liquid => {
                let cfg = grid.config();
                let (half_width, half_height) = (cfg.view_width / 2, cfg.view_height / 2);
                for side in Side::DRAW_ORDER {
                    if self.clipping.is_side_clipped(side) {
                        continue;
                    }
                    let sprite = self.side_sprite_or_build(registry, side)?;
                    let position = ViewPosition::new(
                        anchor.x - half_width + if side == Side::Right { half_width } else { 0 },
                        anchor.y - half_height + if side == Side::Top { cfg.view_height } else { 0 },
                    );
                    let shade = match side {
                        Side::Left if static_shade => STATIC_SHADE,
                        Side::Right if static_shade => -STATIC_SHADE,
                        _ => 0.0,
                    };
                    let vertex_colors = [0, 1, 2, 3]
                        .map(|v| self.light.vertex_rgb(side, v).map(|c| (c + shade).max(0.0)));
                    out.push(DrawItem::Face(SideGeometry {
                        coord: self.coord,
                        side,
                        sprite: sprite.handle,
                        position,
                        vertex_colors,
                        ao_flags: sprite.ao_flags,
                        damage_overlay: damage_overlay_value(self.health, side),
                        liquid: self.kind() == BlockKind::Liquid,
                    }));
                }
            }
        }
        Ok(())
    }

    fn side_sprite_or_build<A: SpriteAtlas>(
        &mut self,
        registry: &SpriteRegistry<A>,
        side: Side,
    ) -> RenderResult<SideSprite> {
        if let Some(sprite) = self.side_sprites[side.index()] {
            return Ok(sprite);
        }
        let handle = registry.block_sprite(self.id, self.value, side)?;
        let sprite = SideSprite { handle, side, ao_flags: self.ao_flags };
        self.side_sprites[side.index()] = Some(sprite);
        Ok(sprite)
    }

    /// Drops built face sprites so they are resolved again.
    pub fn clear_side_sprites(&mut self) {
        self.side_sprites = [None; 3];
    }
}

/// Damage overlay step for a health value: 0 below full, 1 at half, 2 at a quarter.
#[must_use]
pub const fn damage_overlay_step(health: u8) -> Option<u8> {
    if health >= MAX_HEALTH {
        None
    } else if health <= 25 {
        Some(2)
    } else if health <= 50 {
        Some(1)
    } else {
        Some(0)
    }
}

/// Overlay sprite value for one damaged face.
#[must_use]
pub const fn damage_overlay_value(health: u8, side: Side) -> Option<u8> {
    let offset = match side {
        Side::Left => 0,
        Side::Top => 1,
        Side::Right => 2,
    };
    match damage_overlay_step(health) {
        Some(step) => Some(3 * step + offset),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::SpriteHandle;
    use std::collections::HashMap;

    fn registry(names: &[&str]) -> SpriteRegistry<HashMap<String, SpriteHandle>> {
        SpriteRegistry::new(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| ((*n).to_string(), SpriteHandle(i as u32)))
                .collect(),
        )
    }

    #[test]
    fn test_builtin_cells() {
        let catalog = BlockCatalog::new();
        let c = Coordinate::new(0, 0, 0);
        assert!(RenderCell::new(&catalog, c, 0, 0).is_hidden());
        assert!(RenderCell::new(&catalog, c, 4, 0).is_obstacle());
        assert!(RenderCell::new(&catalog, c, 9, 0).is_liquid());
        assert!(RenderCell::new(&catalog, c, 2, 0).hides_past_block());
        assert_eq!(RenderCell::new(&catalog, c, 8, 0).name(&catalog), "sand");
        assert!(!RenderCell::new(&catalog, c, 8, 0).is_indestructible());
    }

    #[test]
    fn test_damage_steps() {
        assert_eq!(damage_overlay_step(100), None);
        assert_eq!(damage_overlay_step(99), Some(0));
        assert_eq!(damage_overlay_step(50), Some(1));
        assert_eq!(damage_overlay_step(26), Some(1));
        assert_eq!(damage_overlay_step(25), Some(2));
        assert_eq!(damage_overlay_step(0), Some(2));
        assert_eq!(damage_overlay_value(40, Side::Right), Some(5));
        assert_eq!(damage_overlay_value(10, Side::Top), Some(7));
    }

    #[test]
    fn test_set_ao_flags_updates_built_sprites() {
        let catalog = BlockCatalog::new();
        let grid = IsoGrid::default();
        let registry = registry(&["error"]);
        let mut cell = RenderCell::new(&catalog, Coordinate::new(0, 0, 0), 3, 0);
        let mut out = Vec::new();
        assert_eq!(cell.emit(&grid, &registry, false, &mut out).ok(), Some(3));

        let flags = AoFlags::from_bits(0b1_0000_0101);
        cell.set_ao_flags(flags);
        for side in Side::ALL {
            assert_eq!(cell.side_sprite(side).map(|s| s.ao_flags), Some(flags));
        }
    }

    #[test]
    fn test_emit_order_and_clipping() {
        let catalog = BlockCatalog::new();
        let grid = IsoGrid::default();
        let registry = registry(&["b3-0-0", "b3-0-1", "b3-0-2"]);
        let mut cell = RenderCell::new(&catalog, Coordinate::new(1, 0, 0), 3, 0);
        cell.set_clipped(Side::Left);

        let mut out = Vec::new();
        assert_eq!(cell.emit(&grid, &registry, false, &mut out).ok(), Some(2));
        let sides: Vec<Side> = out
            .iter()
            .filter_map(|item| match item {
                DrawItem::Face(face) => Some(face.side),
                _ => None,
            })
            .collect();
        assert_eq!(sides, vec![Side::Top, Side::Right]);

        if let DrawItem::Face(top) = out[0] {
            assert_eq!(top.position, ViewPosition::new(100, 61));
            assert_eq!(top.sprite, SpriteHandle(1));
            assert_eq!(top.damage_overlay, None);
        }
        if let DrawItem::Face(right) = out[1] {
            assert_eq!(right.position, ViewPosition::new(200, -61));
        }
    }

    #[test]
    fn test_emit_failure_appends_nothing() {
        let catalog = BlockCatalog::new();
        let grid = IsoGrid::default();
        let registry = registry(&["b3-0-1"]);
        let mut cell = RenderCell::new(&catalog, Coordinate::new(0, 0, 0), 3, 0);
        let mut out = Vec::new();
        assert!(cell.emit(&grid, &registry, false, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_hidden_and_clipped_are_not_rendered() {
        let catalog = BlockCatalog::new();
        let grid = IsoGrid::default();
        let viewport = Viewport::new(0.0, 0.0, 800.0, 600.0);
        let mut cell = RenderCell::new(&catalog, Coordinate::new(0, 0, 0), 3, 0);
        assert!(cell.should_be_rendered(&grid, &viewport));

        cell.set_clipped(Side::Left);
        cell.set_clipped(Side::Top);
        assert!(cell.should_be_rendered(&grid, &viewport));
        cell.set_clipped(Side::Right);
        assert!(!cell.should_be_rendered(&grid, &viewport));

        let air = RenderCell::new(&catalog, Coordinate::new(0, 0, 0), 0, 0);
        assert!(!air.should_be_rendered(&grid, &viewport));
    }

    #[test]
    fn test_static_shade() {
        let catalog = BlockCatalog::new();
        let grid = IsoGrid::default();
        let registry = registry(&["error"]);
        let mut cell = RenderCell::new(&catalog, Coordinate::new(0, 0, 0), 1, 0);
        cell.light_mut().set_uniform(0.5);
        let mut out = Vec::new();
        assert_eq!(cell.emit(&grid, &registry, true, &mut out).ok(), Some(3));
        let colors: HashMap<Side, f32> = out
            .iter()
            .filter_map(|item| match item {
                DrawItem::Face(f) => Some((f.side, f.vertex_colors[0][0])),
                _ => None,
            })
            .collect();
        let top = colors[&Side::Top];
        assert!((colors[&Side::Left] - (top + STATIC_SHADE)).abs() < 1e-6);
        assert!((colors[&Side::Right] - (top - STATIC_SHADE)).abs() < 1e-6);
    }

    #[test]
    fn test_set_hidden_overrides_block() {
        let catalog = BlockCatalog::new();
        let grid = IsoGrid::default();
        let viewport = Viewport::new(0.0, 0.0, 800.0, 600.0);
        let mut cell = RenderCell::new(&catalog, Coordinate::new(0, 0, 0), 3, 0);
        cell.set_hidden(true);
        assert!(cell.is_hidden());
        assert_eq!(cell.kind(), BlockKind::Hidden);
        assert!(!cell.should_be_rendered(&grid, &viewport));

        let mut out = Vec::new();
        assert_eq!(cell.emit(&grid, &registry(&[]), false, &mut out).ok(), Some(0));

        cell.set_hidden(false);
        assert!(cell.should_be_rendered(&grid, &viewport));
        assert_eq!(cell.kind(), BlockKind::Sided);
    }

    #[test]
    fn test_clear_side_sprites_resolves_again() {
        let catalog = BlockCatalog::new();
        let grid = IsoGrid::default();
        let mut cell = RenderCell::new(&catalog, Coordinate::new(0, 0, 0), 3, 0);
        let mut out = Vec::new();
        assert_eq!(cell.emit(&grid, &registry(&["error"]), false, &mut out).ok(), Some(3));
        assert_eq!(cell.side_sprite(Side::Top).map(|s| s.handle), Some(SpriteHandle(0)));

        // Built sprites survive a change of registry until cleared.
        let reloaded = registry(&["b3-0-0", "b3-0-1", "b3-0-2"]);
        out.clear();
        assert_eq!(cell.emit(&grid, &reloaded, false, &mut out).ok(), Some(3));
        assert_eq!(cell.side_sprite(Side::Top).map(|s| s.handle), Some(SpriteHandle(0)));

        cell.clear_side_sprites();
        assert!(Side::ALL.iter().all(|&side| cell.side_sprite(side).is_none()));
        out.clear();
        assert_eq!(cell.emit(&grid, &reloaded, false, &mut out).ok(), Some(3));
        assert_eq!(cell.side_sprite(Side::Top).map(|s| s.handle), Some(SpriteHandle(1)));
    }
}

//! Block identity and capability table.
//!
//! Ids `0..=9` are built in. Ids above 9 are looked up in the catalog's
//! custom entries, which are usually loaded from TOML:
//!
//! ```toml
//! [[blocks]]
//! id = 11
//! name = "lava"
//! liquid = true
//! transparent = true
//! obstacle = false
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Id of the empty cell.
pub const AIR_ID: u8 = 0;

/// Id of the blocking but hidden cell.
pub const INVISIBLE_OBSTACLE_ID: u8 = 4;

/// Id of the built-in liquid.
pub const WATER_ID: u8 = 9;

/// Highest built-in id.
pub const LAST_BUILTIN_ID: u8 = 9;

/// How a block is drawn. Resolved once when a render cell is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Never drawn.
    Hidden,
    /// Three faces, animated as a liquid by the renderer.
    Liquid,
    /// Three faces.
    Sided,
    /// One sprite without faces.
    Billboard,
}

/// Capabilities of a block id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockTraits {
    /// Blocks movement.
    pub obstacle: bool,
    /// Lets light and sight pass.
    pub transparent: bool,
    /// Drawn as a liquid.
    pub liquid: bool,
    /// Drawn as three faces rather than a single sprite.
    pub has_sides: bool,
    /// Survives any damage.
    pub indestructible: bool,
    /// Never drawn.
    pub hidden: bool,
}

impl Default for BlockTraits {
    fn default() -> Self {
        Self::SOLID
    }
}

impl BlockTraits {
    /// Opaque, blocking, three faces.
    pub const SOLID: Self = Self {
        obstacle: true,
        transparent: false,
        liquid: false,
        has_sides: true,
        indestructible: false,
        hidden: false,
    };

    /// Empty space.
    pub const AIR: Self = Self {
        obstacle: false,
        transparent: true,
        liquid: false,
        has_sides: false,
        indestructible: false,
        hidden: true,
    };

    /// Blocks movement but is never drawn.
    pub const INVISIBLE_OBSTACLE: Self = Self { obstacle: true, ..Self::AIR };

    /// See-through liquid that does not block movement.
    pub const WATER: Self = Self {
        obstacle: false,
        transparent: true,
        liquid: true,
        has_sides: true,
        indestructible: false,
        hidden: false,
    };

    /// Drawing style implied by these traits.
    #[must_use]
    pub const fn kind(&self) -> BlockKind {
        if self.hidden {
            BlockKind::Hidden
        } else if self.liquid {
            BlockKind::Liquid
        } else if self.has_sides {
            BlockKind::Sided
        } else {
            BlockKind::Billboard
        }
    }

    /// Whether the block fully hides whatever lies behind it.
    #[must_use]
    pub const fn hides_past_block(&self) -> bool {
        self.has_sides && !self.transparent
    }
}

/// A custom block entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDef {
    /// Block id, above [`LAST_BUILTIN_ID`].
    pub id: u8,
    /// Display name.
    pub name: String,
    /// Capabilities.
    #[serde(flatten)]
    pub traits: BlockTraits,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    blocks: Vec<BlockDef>,
}

/// Lookup from block id to name and capabilities.
#[derive(Clone, Debug, Default)]
pub struct BlockCatalog {
    custom: HashMap<u8, BlockDef>,
}

impl BlockCatalog {
    /// Catalog with only the built-in ids.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses custom entries from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::CatalogParse`] on malformed TOML and
    /// [`RenderError::Catalog`] for reserved or duplicated ids.
    pub fn from_toml_str(source: &str) -> RenderResult<Self> {
        let file: CatalogFile = toml::from_str(source)?;
        let mut catalog = Self::new();
        for def in file.blocks {
            let id = def.id;
            if catalog.custom.contains_key(&id) {
                return Err(RenderError::Catalog(format!("block id {id} defined twice")));
            }
            catalog.register(def)?;
        }
        tracing::debug!(custom_blocks = catalog.custom.len(), "block catalog loaded");
        Ok(catalog)
    }

    /// Adds or replaces a custom entry.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Catalog`] if the id is a built-in one.
    pub fn register(&mut self, def: BlockDef) -> RenderResult<()> {
        if def.id <= LAST_BUILTIN_ID {
            return Err(RenderError::Catalog(format!(
                "block id {} is reserved for built-in blocks",
                def.id
            )));
        }
        self.custom.insert(def.id, def);
        Ok(())
    }

    /// Number of custom entries.
    #[must_use]
    pub fn custom_len(&self) -> usize {
        self.custom.len()
    }

    /// Capabilities of an id. Unknown ids behave as solid blocks.
    #[must_use]
    pub fn traits(&self, id: u8) -> BlockTraits {
        match id {
            AIR_ID => BlockTraits::AIR,
            INVISIBLE_OBSTACLE_ID => BlockTraits::INVISIBLE_OBSTACLE,
            WATER_ID => BlockTraits::WATER,
            1..=LAST_BUILTIN_ID => BlockTraits::SOLID,
            _ => self.custom.get(&id).map_or(BlockTraits::SOLID, |def| def.traits),
        }
    }

    /// Display name of an id.
    #[must_use]
    pub fn name(&self, id: u8) -> &str {
        match id {
            0 => "air",
            1 => "grass",
            2 => "dirt",
            3 => "stone",
            4 => "invisible obstacle",
            8 => "sand",
            9 => "water",
            _ if id > LAST_BUILTIN_ID => {
                self.custom.get(&id).map_or("undefined", |def| def.name.as_str())
            }
            _ => "undefined",
        }
    }

    /// Drawing style of an id.
    #[must_use]
    pub fn kind(&self, id: u8) -> BlockKind {
        self.traits(id).kind()
    }
}

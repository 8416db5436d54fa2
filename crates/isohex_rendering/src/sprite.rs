//! Sprite lookup with per-key fallback.
//!
//! Sprites are named `"{category}{id}-{value}-{side}"`, or
//! `"{category}{id}-{value}"` for sprites without faces. A missing name
//! falls back to id 0 value 0 of the same category and then to the global
//! `"error"` sprite. Only when all three are absent does lookup fail, and
//! the frame builder then skips that one cell.

use std::collections::HashMap;
use std::fmt;

use isohex_shared::Side;
use parking_lot::RwLock;

use crate::error::{RenderError, RenderResult};
use crate::lighting::AoFlags;

/// Name of the sprite drawn when nothing better exists.
pub const ERROR_SPRITE: &str = "error";

/// Category prefix of block sprites.
pub const BLOCK_CATEGORY: char = 'b';

/// Opaque handle into an atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteHandle(pub u32);

/// Source of sprite regions, implemented by the asset layer.
pub trait SpriteAtlas {
    /// Looks up a region by name.
    fn find_region(&self, name: &str) -> Option<SpriteHandle>;
}

impl SpriteAtlas for HashMap<String, SpriteHandle> {
    fn find_region(&self, name: &str) -> Option<SpriteHandle> {
        self.get(name).copied()
    }
}

/// Structured sprite name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteKey {
    /// Category prefix, `'b'` for blocks.
    pub category: char,
    /// Object id.
    pub id: u8,
    /// Object sub-value.
    pub value: u8,
    /// Face, if the sprite is one.
    pub side: Option<Side>,
}

impl SpriteKey {
    /// Key of a block face.
    #[must_use]
    pub const fn block_side(id: u8, value: u8, side: Side) -> Self {
        Self { category: BLOCK_CATEGORY, id, value, side: Some(side) }
    }

    /// Key of a block drawn without faces.
    #[must_use]
    pub const fn block(id: u8, value: u8) -> Self {
        Self { category: BLOCK_CATEGORY, id, value, side: None }
    }

    /// Same category and side with id and value zeroed.
    #[must_use]
    pub const fn category_fallback(self) -> Self {
        Self { id: 0, value: 0, ..self }
    }
}

impl fmt::Display for SpriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}-{}", self.category, self.id, self.value)?;
        if let Some(side) = self.side {
            write!(f, "-{}", side.code())?;
        }
        Ok(())
    }
}

/// Caching resolver in front of a [`SpriteAtlas`].
pub struct SpriteRegistry<A> {
    atlas: A,
    cache: RwLock<HashMap<SpriteKey, SpriteHandle>>,
}

impl<A: SpriteAtlas> SpriteRegistry<A> {
    /// Wraps an atlas.
    pub fn new(atlas: A) -> Self {
        Self { atlas, cache: RwLock::new(HashMap::new()) }
    }

    /// The wrapped atlas.
    pub fn atlas(&self) -> &A {
        &self.atlas
    }

    /// Resolves a key through the fallback chain.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingAsset`] if the key, its category
    /// fallback and the error sprite are all undefined.
    pub fn resolve(&self, key: SpriteKey) -> RenderResult<SpriteHandle> {
        if let Some(handle) = self.cache.read().get(&key).copied() {
            return Ok(handle);
        }
        let handle = self.lookup(key)?;
        self.cache.write().insert(key, handle);
        Ok(handle)
    }

    /// Resolves the sprite of one block face.
    ///
    /// # Errors
    ///
    /// See [`SpriteRegistry::resolve`].
    pub fn block_sprite(&self, id: u8, value: u8, side: Side) -> RenderResult<SpriteHandle> {
        self.resolve(SpriteKey::block_side(id, value, side))
    }

    /// Whether a block has its own sprite, without any fallback.
    pub fn is_sprite_defined(&self, id: u8, value: u8, has_sides: bool) -> bool {
        if id == 0 {
            return false;
        }
        let key = if has_sides {
            SpriteKey::block_side(id, value, Side::Left)
        } else {
            SpriteKey::block(id, value)
        };
        self.atlas.find_region(&key.to_string()).is_some()
    }

    /// Forgets every resolved key, for when the atlas is reloaded.
    ///
    /// Cells keep the face sprites they already built; call
    /// [`crate::RenderStorage::clear_side_sprites`] as well.
    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    /// Number of resolved keys in the cache.
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    fn lookup(&self, key: SpriteKey) -> RenderResult<SpriteHandle> {
        let name = key.to_string();
        if let Some(handle) = self.atlas.find_region(&name) {
            return Ok(handle);
        }
        let fallback = key.category_fallback().to_string();
        if let Some(handle) = self.atlas.find_region(&fallback) {
            tracing::debug!(sprite = %name, fallback = %fallback, "sprite not defined, using category fallback");
            return Ok(handle);
        }
        if let Some(handle) = self.atlas.find_region(ERROR_SPRITE) {
            tracing::debug!(sprite = %name, "sprite not defined, using error sprite");
            return Ok(handle);
        }
        Err(RenderError::MissingAsset { key: name })
    }
}

/// A face sprite built for one render cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SideSprite {
    /// Resolved sprite.
    pub handle: SpriteHandle,
    /// Face it draws.
    pub side: Side,
    /// AO flags the sprite shades with.
    pub ao_flags: AoFlags,
}

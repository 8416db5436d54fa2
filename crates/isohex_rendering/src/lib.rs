//! # ISOHEX Rendering Core
//!
//! Occlusion and lighting core of the isometric renderer:
//! - Per-cell covered lists that drive painter's-algorithm draw order
//! - Bit-packed per-side, per-vertex RGB light with AO and clipping flags
//! - A sprite registry that degrades per cell instead of aborting a frame
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FRAME                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Viewport → IsoGrid::visible_region → RenderStorage         │
//! │       ↓                                   ↓                 │
//! │  covered lists (lazy, RebuildClock)  → draw order           │
//! │       ↓                                   ↓                 │
//! │  CellLight + AoFlags → SideGeometry  → FrameDrawList        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Threading
//!
//! Single-threaded and frame-driven. The only state meant to be shared is
//! the [`RebuildClock`], which map-editing code bumps through an `Arc`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod block;
pub mod cell;
pub mod error;
pub mod lighting;
pub mod map;
pub mod occlusion;
pub mod sprite;
pub mod storage;

pub use block::{BlockCatalog, BlockDef, BlockKind, BlockTraits};
pub use cell::{DrawItem, EntityId, Occupant, RenderCell, Renderable, SideGeometry};
pub use error::{RenderError, RenderResult};
pub use lighting::{AoFlags, CellLight, ClipFlags, LightChannel, PackedLight};
pub use map::{BlockStore, ChunkCoord, ChunkedMap, DamageOutcome, MapAccess};
pub use occlusion::{OcclusionStats, RebuildClock};
pub use sprite::{SideSprite, SpriteAtlas, SpriteHandle, SpriteKey, SpriteRegistry};
pub use storage::{FrameDrawList, FrameStats, RenderStorage};

pub use isohex_shared::{Coordinate, IsoGrid, NeighborSide, Point, Side, Viewport, VisibleRegion};

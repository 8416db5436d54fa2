//! # Cell Lighting
//!
//! Light is stored per side (left, top, right) and per vertex (four
//! corners) as one packed RGB word:
//!
//! ```text
//! bit  31..30   29..20   19..10   9..0
//!      unused   red      green    blue
//! ```
//!
//! Each channel holds `round(factor * 512)` clamped to `0..=1023`, so
//! `1.0` is neutral and the ceiling is roughly `2.0`. Decoding divides by
//! 511, not 512. Repeated read-modify-write therefore drifts upward by
//! about `factor / 511` per round; renderers depend on those exact values,
//! so the asymmetry is kept.
//!
//! AO and clipping flags live next to the light words because the same
//! per-cell pass computes all three.

pub mod propagate;

use bytemuck::{Pod, Zeroable};
use isohex_shared::{NeighborSide, Side};

/// Bits per color channel.
pub const CHANNEL_BITS: u32 = 10;

/// Largest raw channel value.
pub const CHANNEL_MAX: u32 = (1 << CHANNEL_BITS) - 1;

/// Factor-to-raw multiplier used when encoding.
pub const ENCODE_SCALE: f32 = 512.0;

/// Raw-to-factor divisor used when decoding.
pub const DECODE_SCALE: f32 = 511.0;

/// Vertices per side.
pub const VERTICES_PER_SIDE: usize = 4;

/// One color channel of a packed light word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LightChannel {
    /// Bits 29..20.
    Red = 0,
    /// Bits 19..10.
    Green = 1,
    /// Bits 9..0.
    Blue = 2,
}

impl LightChannel {
    /// All channels, red first.
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];

    /// Bit offset of the channel inside a packed word.
    #[inline]
    #[must_use]
    pub const fn shift(self) -> u32 {
        20 - CHANNEL_BITS * self as u32
    }
}

/// Three 10-bit channels packed into one word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct PackedLight(pub u32);

impl Default for PackedLight {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl PackedLight {
    /// All channels at `1.0`.
    pub const NEUTRAL: Self = Self(512 << 20 | 512 << 10 | 512);

    /// All channels at zero.
    pub const DARK: Self = Self(0);

    /// Encodes a light factor into a raw channel value.
    ///
    /// Non-positive and NaN factors encode to zero.
    #[must_use]
    pub fn quantize(factor: f32) -> u32 {
        if factor > 0.0 {
            ((factor * ENCODE_SCALE).round() as u32).min(CHANNEL_MAX)
        } else {
            0
        }
    }

    /// A word with the same factor on every channel.
    #[must_use]
    pub fn uniform(factor: f32) -> Self {
        let raw = Self::quantize(factor);
        Self(raw << 20 | raw << 10 | raw)
    }

    /// Raw value of one channel.
    #[inline]
    #[must_use]
    pub const fn channel_raw(self, channel: LightChannel) -> u32 {
        (self.0 >> channel.shift()) & CHANNEL_MAX
    }

    /// Decoded factor of one channel.
    #[inline]
    #[must_use]
    pub fn channel(self, channel: LightChannel) -> f32 {
        self.channel_raw(channel) as f32 / DECODE_SCALE
    }

    /// Replaces one channel's raw value, leaving the others untouched.
    #[must_use]
    pub const fn with_channel_raw(self, channel: LightChannel, raw: u32) -> Self {
        let shift = channel.shift();
        let raw = if raw > CHANNEL_MAX { CHANNEL_MAX } else { raw };
        Self((self.0 & !(CHANNEL_MAX << shift)) | (raw << shift))
    }

    /// Replaces one channel with an encoded factor.
    #[must_use]
    pub fn with_channel(self, channel: LightChannel, factor: f32) -> Self {
        self.with_channel_raw(channel, Self::quantize(factor))
    }

    /// Adds to one channel, saturating at the channel ceiling.
    ///
    /// Negative increments count as zero.
    #[must_use]
    pub fn brightened(self, channel: LightChannel, factor: f32) -> Self {
        self.with_channel(channel, self.channel(channel) + factor.max(0.0))
    }

    /// All three channels decoded, red first.
    #[must_use]
    pub fn rgb(self) -> [f32; 3] {
        LightChannel::ALL.map(|c| self.channel(c))
    }
}

/// Light words for every side and vertex of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct CellLight {
    sides: [[PackedLight; VERTICES_PER_SIDE]; 3],
}

impl Default for CellLight {
    fn default() -> Self {
        Self { sides: [[PackedLight::NEUTRAL; VERTICES_PER_SIDE]; 3] }
    }
}

impl CellLight {
    /// Neutral light on every side.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Packed word of one vertex.
    ///
    /// # Panics
    ///
    /// Panics if `vertex >= 4`.
    #[inline]
    #[must_use]
    pub fn packed(&self, side: Side, vertex: usize) -> PackedLight {
        self.sides[side.index()][vertex]
    }

    /// Decoded channel of one vertex.
    ///
    /// # Panics
    ///
    /// Panics if `vertex >= 4`.
    #[inline]
    #[must_use]
    pub fn level(&self, side: Side, vertex: usize, channel: LightChannel) -> f32 {
        self.packed(side, vertex).channel(channel)
    }

    /// Decoded RGB of one vertex.
    #[must_use]
    pub fn vertex_rgb(&self, side: Side, vertex: usize) -> [f32; 3] {
        self.packed(side, vertex).rgb()
    }

    /// Sets all three channels of one vertex to the same factor.
    pub fn set_level(&mut self, factor: f32, side: Side, vertex: usize) {
        debug_assert!(vertex < VERTICES_PER_SIDE, "vertex {vertex} out of range");
        self.sides[side.index()][vertex] = PackedLight::uniform(factor);
    }

    /// Sets one channel of one vertex.
    pub fn set_channel(&mut self, factor: f32, side: Side, channel: LightChannel, vertex: usize) {
        debug_assert!(vertex < VERTICES_PER_SIDE, "vertex {vertex} out of range");
        let word = &mut self.sides[side.index()][vertex];
        *word = word.with_channel(channel, factor);
    }

    /// Adds to one channel of one vertex, saturating.
    pub fn add_level(&mut self, factor: f32, side: Side, channel: LightChannel, vertex: usize) {
        debug_assert!(vertex < VERTICES_PER_SIDE, "vertex {vertex} out of range");
        let word = &mut self.sides[side.index()][vertex];
        *word = word.brightened(channel, factor);
    }

    /// Adds an RGB triple to one vertex.
    pub fn add_rgb(&mut self, side: Side, vertex: usize, rgb: [f32; 3]) {
        for (channel, factor) in LightChannel::ALL.into_iter().zip(rgb) {
            self.add_level(factor, side, channel, vertex);
        }
    }

    /// Sets every side and vertex to one factor.
    pub fn set_uniform(&mut self, factor: f32) {
        self.sides = [[PackedLight::uniform(factor); VERTICES_PER_SIDE]; 3];
    }

    /// Returns every vertex to neutral light.
    pub fn reset_light(&mut self) {
        *self = Self::default();
    }

    /// Average of one channel over the three sides, sampled at vertex 0.
    #[must_use]
    pub fn average_channel(&self, channel: LightChannel) -> f32 {
        Side::ALL.iter().map(|&s| self.level(s, 0, channel)).sum::<f32>() / 3.0
    }

    /// Raw bytes for upload to a light buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Ambient-occlusion flags: one bit per [`NeighborSide`], nine bits total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct AoFlags(u16);

impl AoFlags {
    /// Valid bits.
    pub const MASK: u16 = 0x1FF;

    /// No neighbor occludes.
    pub const NONE: Self = Self(0);

    /// Builds flags from raw bits, dropping bits above the ninth.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & Self::MASK)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether the neighbor in `side` occludes.
    #[inline]
    #[must_use]
    pub const fn contains(self, side: NeighborSide) -> bool {
        self.0 & (1 << side.index()) != 0
    }

    /// Marks the neighbor in `side` as occluding.
    #[must_use]
    pub const fn with(self, side: NeighborSide) -> Self {
        Self(self.0 | 1 << side.index())
    }

    /// Clears the neighbor in `side`.
    #[must_use]
    pub const fn without(self, side: NeighborSide) -> Self {
        Self(self.0 & !(1 << side.index()))
    }

    /// Whether no neighbor occludes.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Per-side clipping flags. Bit 0 left, bit 1 top, bit 2 right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct ClipFlags(u8);

impl ClipFlags {
    /// All three sides hidden.
    pub const ALL: u8 = 0b111;

    /// Builds flags from raw bits, dropping unused bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Hides one side.
    pub fn set_clipped(&mut self, side: Side) {
        self.0 |= 1 << side.code();
    }

    /// Hides every side.
    pub fn set_all(&mut self) {
        self.0 = Self::ALL;
    }

    /// Makes every side visible again.
    pub fn clear_all(&mut self) {
        self.0 = 0;
    }

    /// Whether one side is hidden.
    #[inline]
    #[must_use]
    pub const fn is_side_clipped(self, side: Side) -> bool {
        self.0 & (1 << side.code()) != 0
    }

    /// Whether all three sides are hidden.
    #[inline]
    #[must_use]
    pub const fn is_clipped(self) -> bool {
        self.0 == Self::ALL
    }
}

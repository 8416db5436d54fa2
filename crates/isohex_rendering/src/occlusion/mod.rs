//! Covered-list invalidation and occlusion bookkeeping.
//!
//! Every covered list remembers the [`RebuildClock`] marker it was built
//! at. Bumping the clock makes every list stale at once; each one is then
//! rebuilt the next time it is asked for, never earlier.

pub mod probe;

use std::sync::atomic::{AtomicU64, Ordering};

pub use probe::probe_covered;

/// Global marker after which covered lists must be rebuilt.
///
/// Shared through an `Arc` between map-editing code and the render
/// storage. The marker only moves forward.
#[derive(Debug, Default)]
pub struct RebuildClock {
    marker: AtomicU64,
}

impl RebuildClock {
    /// A clock at marker zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { marker: AtomicU64::new(0) }
    }

    /// Current marker.
    #[inline]
    #[must_use]
    pub fn current(&self) -> u64 {
        self.marker.load(Ordering::Acquire)
    }

    /// Raises the marker to `marker`, typically the current frame number.
    ///
    /// Returns `false` and leaves the clock untouched if `marker` is not
    /// ahead of the current value.
    pub fn mark_dirty(&self, marker: u64) -> bool {
        let previous = self.marker.fetch_max(marker, Ordering::AcqRel);
        if marker < previous {
            tracing::warn!(marker, current = previous, "ignoring rebuild marker behind the clock");
        }
        marker > previous
    }

    /// Advances the marker by one and returns the new value.
    pub fn invalidate(&self) -> u64 {
        self.marker.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Rewinds the marker to zero. Only valid when no cell built against
    /// the old marker survives anywhere, so never on a clock other
    /// storages still share.
    pub fn reset(&self) {
        self.marker.store(0, Ordering::Release);
    }

    /// Whether a list built at `built_at` must be rebuilt.
    #[inline]
    #[must_use]
    pub fn is_stale(&self, built_at: Option<u64>) -> bool {
        built_at.map_or(true, |t| t < self.current())
    }
}

/// Counters for covered-list maintenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OcclusionStats {
    /// Covered lists requested.
    pub lists_requested: u64,
    /// Requests served from the cache.
    pub cache_hits: u64,
    /// Lists rebuilt.
    pub rebuilds: u64,
    /// Neighbor positions probed during rebuilds.
    pub probes: u64,
    /// Occupants sorted into lists.
    pub occupants_sorted: u64,
}

impl OcclusionStats {
    /// Share of requests served from the cache.
    #[must_use]
    pub fn hit_rate(&self) -> f32 {
        if self.lists_requested == 0 {
            0.0
        } else {
            self.cache_hits as f32 / self.lists_requested as f32
        }
    }
}

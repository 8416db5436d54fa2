//! # Rendering Error Types
//!
//! Out-of-range z never errors (the map layer answers with sentinels) and
//! a stale covered list is repaired silently, so the only failures left are
//! missing assets, unknown cells and bad configuration.

use isohex_shared::{ConfigError, Coordinate};
use thiserror::Error;

/// Errors that can occur in the rendering core.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Neither the sprite, its category fallback nor the global error sprite exist.
    #[error("missing asset: {key} (category fallback and error sprite also absent)")]
    MissingAsset {
        /// The sprite key that was requested first.
        key: String,
    },

    /// No render cell is stored at the coordinate.
    #[error("no render cell at {0}")]
    CellNotFound(Coordinate),

    /// Grid configuration failed to load.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Block catalog source is not valid TOML.
    #[error("failed to parse block catalog: {0}")]
    CatalogParse(#[from] toml::de::Error),

    /// Block catalog parsed but holds unusable entries.
    #[error("invalid block catalog: {0}")]
    Catalog(String),
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

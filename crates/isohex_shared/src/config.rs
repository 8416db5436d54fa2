//! # Grid Configuration
//!
//! Sprite and chunk dimensions, loaded once at startup from TOML.
//!
//! ```toml
//! view_width = 200
//! view_depth = 100
//! view_height = 122
//! chunk_blocks_x = 10
//! chunk_blocks_y = 40
//! chunk_blocks_z = 10
//! ground_block_id = 2
//! ```
//!
//! Every field is optional; missing fields take the defaults above.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but holds unusable values.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Dimensions of the isometric grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Sprite width in pixels. Also the diagonal length of a cell in game space.
    pub view_width: i32,
    /// Sprite depth in pixels (top border to middle border of a block).
    pub view_depth: i32,
    /// Sprite height in pixels.
    pub view_height: i32,
    /// Cells per chunk along x.
    pub chunk_blocks_x: i32,
    /// Cells per chunk along y.
    pub chunk_blocks_y: i32,
    /// Cells per chunk along z. This is the full vertical extent of the map.
    pub chunk_blocks_z: i32,
    /// Block id reported for every cell below z = 0.
    pub ground_block_id: u8,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            view_width: 200,
            view_depth: 100,
            view_height: 122,
            chunk_blocks_x: 10,
            chunk_blocks_y: 40,
            chunk_blocks_z: 10,
            ground_block_id: 2,
        }
    }
}

impl GridConfig {
    /// Parses and validates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`GridConfig::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!("loaded grid config from {}", path.display());
        Ok(config)
    }

    /// Checks that every dimension is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("view_width", self.view_width),
            ("view_depth", self.view_depth),
            ("view_height", self.view_height),
            ("chunk_blocks_x", self.chunk_blocks_x),
            ("chunk_blocks_y", self.chunk_blocks_y),
            ("chunk_blocks_z", self.chunk_blocks_z),
        ];
        for (name, value) in sizes {
            if value <= 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        // Half-cell offsets of odd rows must land on whole pixels.
        if self.view_width % 2 != 0 {
            return Err(ConfigError::Invalid(format!(
                "view_width must be even, got {}",
                self.view_width
            )));
        }
        if self.view_depth % 2 != 0 {
            return Err(ConfigError::Invalid(format!(
                "view_depth must be even, got {}",
                self.view_depth
            )));
        }
        Ok(())
    }
}

//! Core types for the tile cache.

use std::fmt;
use thiserror::Error;

/// Key uniquely identifying a rendered map tile.
///
/// Includes everything needed to place the tile: the world and dimension it
/// belongs to, the render layer (terrain, heightmap, ...), the zoom level,
/// and the tile coordinates at that level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    /// World (server) name
    pub world: String,
    /// Dimension name within the world
    pub dimension: String,
    /// Render layer name (e.g. "terrain", "heightmap")
    pub layer: String,
    /// Zoom level; level 0 is a single chunk, each level doubles the span
    pub level: u8,
    /// Tile X coordinate at `level`
    pub x: i32,
    /// Tile Z coordinate at `level`
    pub z: i32,
}

impl TileKey {
    /// Create a new tile key.
    pub fn new(
        world: impl Into<String>,
        dimension: impl Into<String>,
        layer: impl Into<String>,
        level: u8,
        x: i32,
        z: i32,
    ) -> Self {
        Self {
            world: world.into(),
            dimension: dimension.into(),
            layer: layer.into(),
            level,
            x,
            z,
        }
    }

    /// The key of a different cell on the same world/dimension/layer.
    pub fn with_cell(&self, level: u8, x: i32, z: i32) -> Self {
        Self {
            world: self.world.clone(),
            dimension: self.dimension.clone(),
            layer: self.layer.clone(),
            level,
            x,
            z,
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}:{}:{} at {}s {}x {}z}}",
            self.world, self.dimension, self.layer, self.level, self.x, self.z
        )
    }
}

/// Tile cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No file exists for the tile
    #[error("tile not present")]
    NotPresent,

    /// Filesystem error while reading or writing a tile
    #[error("tile i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Tile file exists but does not decode to a usable raster
    #[error("tile file corrupt: {0}")]
    Corrupt(String),

    /// Raster could not be encoded for storage
    #[error("tile encode failed: {0}")]
    Encode(String),
}

impl CacheError {
    /// True for the benign "nothing rendered here yet" case.
    pub fn is_not_present(&self) -> bool {
        matches!(self, CacheError::NotPresent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_key_equality_is_component_wise() {
        let a = TileKey::new("w", "overworld", "terrain", 5, 3, -4);
        let b = TileKey::new("w", "overworld", "terrain", 5, 3, -4);
        let c = TileKey::new("w", "overworld", "terrain", 5, 3, 4);
        let d = TileKey::new("w", "nether", "terrain", 5, 3, -4);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_tile_key_display() {
        let key = TileKey::new("hub", "overworld", "terrain", 5, -2, 7);
        assert_eq!(key.to_string(), "{hub:overworld:terrain at 5s -2x 7z}");
    }

    #[test]
    fn test_with_cell_keeps_identity_components() {
        let key = TileKey::new("hub", "overworld", "terrain", 0, 100, 64);
        let cell = key.with_cell(5, 3, 2);

        assert_eq!(cell.world, "hub");
        assert_eq!(cell.dimension, "overworld");
        assert_eq!(cell.layer, "terrain");
        assert_eq!(cell.level, 5);
        assert_eq!((cell.x, cell.z), (3, 2));
    }

    #[test]
    fn test_not_present_detection() {
        assert!(CacheError::NotPresent.is_not_present());
        assert!(!CacheError::Corrupt("bad".into()).is_not_present());
    }
}

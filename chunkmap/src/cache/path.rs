//! On-disk path construction for cached tiles.

use crate::cache::types::TileKey;
use std::path::{Path, PathBuf};

/// Construct the full path of a cached tile file.
///
/// The layout is hierarchical:
/// ```text
/// <prefix>/<world>/<dimension>/<layer>/<level>/<x>x<z>.png
/// ```
/// Coordinates are plain decimal, negatives keep their sign.
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use chunkmap::cache::{tile_path, TileKey};
///
/// let key = TileKey::new("hub", "overworld", "terrain", 5, -2, 13);
/// let path = tile_path(Path::new("imageCache"), &key);
///
/// assert_eq!(
///     path,
///     PathBuf::from("imageCache/hub/overworld/terrain/5/-2x13.png")
/// );
/// ```
pub fn tile_path(prefix: &Path, key: &TileKey) -> PathBuf {
    prefix
        .join(&key.world)
        .join(&key.dimension)
        .join(&key.layer)
        .join(key.level.to_string())
        .join(format!("{}x{}.png", key.x, key.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_path_components() {
        let key = TileKey::new("hub", "overworld", "terrain", 5, 0, 0);
        let path = tile_path(Path::new("imageCache"), &key);

        assert_eq!(
            path,
            PathBuf::from("imageCache/hub/overworld/terrain/5/0x0.png")
        );
    }

    #[test]
    fn test_tile_path_negative_coordinates() {
        let key = TileKey::new("hub", "the_nether", "heightmap", 5, -12, -1);
        let path = tile_path(Path::new("/var/cache/tiles"), &key);

        assert_eq!(
            path,
            PathBuf::from("/var/cache/tiles/hub/the_nether/heightmap/5/-12x-1.png")
        );
    }

    #[test]
    fn test_tile_path_distinct_layers() {
        let terrain = TileKey::new("hub", "overworld", "terrain", 5, 1, 1);
        let heat = TileKey::new("hub", "overworld", "counttilesheat", 5, 1, 1);
        let prefix = Path::new("imageCache");

        assert_ne!(tile_path(prefix, &terrain), tile_path(prefix, &heat));
    }

    #[test]
    fn test_tile_path_level_is_a_directory() {
        let key = TileKey::new("hub", "overworld", "terrain", 7, 3, 4);
        let path = tile_path(Path::new("imageCache"), &key);

        assert!(path.to_string_lossy().contains("/7/"));
        assert_eq!(path.file_name().unwrap().to_string_lossy(), "3x4.png");
    }
}

//! Disk codec for tile rasters.
//!
//! Tiles are stored as standard 8-bit RGBA PNG files under the hierarchical
//! layout produced by [`tile_path`](crate::cache::path::tile_path). Reads
//! accept any PNG variant and normalise to RGBA; a file that fails to decode
//! (or decodes to the wrong dimensions) is removed so the tile can be
//! regenerated, and is reported as unreadable rather than missing.

use crate::cache::path::tile_path;
use crate::cache::types::{CacheError, TileKey};
use crate::raster::Raster;
use image::{ImageFormat, ImageReader};
use std::fs;
use std::io::{BufReader, Cursor, ErrorKind};
use std::path::Path;
use tracing::{debug, warn};

/// Encode a raster as PNG and store it at the tile's canonical path.
///
/// Parent directories are created as needed. The file contents are fully
/// encoded in memory first, so a failed encode never truncates an existing
/// tile on disk.
pub fn save_tile(prefix: &Path, key: &TileKey, raster: &Raster) -> Result<(), CacheError> {
    let path = tile_path(prefix, key);
    if let Some(parent) = path.parent() {
        create_cache_dirs(parent)?;
    }

    let mut encoded = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
        .map_err(|e| CacheError::Encode(e.to_string()))?;

    fs::write(&path, encoded)?;
    Ok(())
}

/// Load a tile raster from its canonical path.
///
/// Returns [`CacheError::NotPresent`] when no file exists. A file that does
/// not decode, or decodes to anything other than an
/// `expected_side x expected_side` image, is deleted and reported as
/// [`CacheError::Corrupt`].
pub fn load_tile(prefix: &Path, key: &TileKey, expected_side: u32) -> Result<Raster, CacheError> {
    let path = tile_path(prefix, key);
    debug!(key = %key, "loading tile from disk");

    let file = match fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(CacheError::NotPresent),
        Err(e) => return Err(CacheError::Io(e)),
    };

    let decoded = ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(CacheError::Io)?
        .decode();

    let raster = match decoded {
        Ok(img) => img.into_rgba8(),
        Err(e) => {
            remove_broken_file(&path);
            return Err(CacheError::Corrupt(e.to_string()));
        }
    };

    if raster.dimensions() != (expected_side, expected_side) {
        let (w, h) = raster.dimensions();
        remove_broken_file(&path);
        return Err(CacheError::Corrupt(format!(
            "unexpected dimensions {}x{}, want {}x{}",
            w, h, expected_side, expected_side
        )));
    }

    Ok(raster)
}

fn remove_broken_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove broken tile file");
    }
}

/// Create cache directories, owner-writable.
fn create_cache_dirs(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(0o764).create(path)
    }
    #[cfg(not(unix))]
    {
        fs::create_dir_all(path)
    }
}

/// File count and byte size of the cache subtree for one dimension.
///
/// A missing directory counts as an empty cache.
pub fn usage(prefix: &Path, world: &str, dimension: &str) -> std::io::Result<(u64, u64)> {
    let root = prefix.join(world).join(dimension);
    let mut files = 0;
    let mut bytes = 0;
    count_dir(&root, &mut files, &mut bytes)?;
    Ok((files, bytes))
}

/// Result of clearing the on-disk cache.
#[derive(Debug, Clone, Copy)]
pub struct ClearResult {
    /// Number of tile files removed
    pub files_deleted: u64,
    /// Bytes reclaimed
    pub bytes_freed: u64,
}

/// Delete the entire on-disk cache under `prefix`.
pub fn clear(prefix: &Path) -> std::io::Result<ClearResult> {
    let mut files = 0;
    let mut bytes = 0;
    count_dir(prefix, &mut files, &mut bytes)?;

    if prefix.exists() {
        fs::remove_dir_all(prefix)?;
    }

    Ok(ClearResult {
        files_deleted: files,
        bytes_freed: bytes,
    })
}

fn count_dir(dir: &Path, files: &mut u64, bytes: &mut u64) -> std::io::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            count_dir(&path, files, bytes)?;
        } else {
            *files += 1;
            *bytes += entry.metadata()?.len();
        }
    }
    Ok(())
}

//! Tile cache configuration.

use crate::coord;
use std::path::PathBuf;
use std::time::Duration;

/// Tile cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Number of disk I/O workers (default: 4)
    pub workers: usize,
    /// Soft cap on resident storage tiles before LRU eviction (default: 512)
    pub capacity: usize,
    /// Period of the dirty-tile flush tick (default: 15 s)
    pub flush_interval: Duration,
    /// Zoom level at which tiles are persisted and held resident (default: 5)
    pub storage_level: u8,
    /// Highest zoom level served; reads above it fail fast (default: 9)
    pub max_zoom_out: u8,
    /// Root directory of the on-disk cache (default: "imageCache")
    pub prefix: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            capacity: 512,
            flush_interval: Duration::from_secs(15),
            storage_level: 5,
            max_zoom_out: 9,
            prefix: PathBuf::from("imageCache"),
        }
    }
}

impl CacheConfig {
    /// Pixel side length of a storage tile.
    pub fn storage_side(&self) -> u32 {
        coord::side_px(self.storage_level)
    }

    /// Set the number of I/O workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the resident-tile soft cap.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the flush tick period.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Set the cache root directory.
    pub fn with_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the highest served zoom level.
    pub fn with_max_zoom_out(mut self, level: u8) -> Self {
        self.max_zoom_out = level;
        self
    }

    /// Set the storage zoom level.
    pub fn with_storage_level(mut self, level: u8) -> Self {
        self.storage_level = level;
        self
    }
}

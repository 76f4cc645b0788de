//! Default configuration values.

/// Default number of disk I/O workers.
pub const DEFAULT_CACHE_WORKERS: usize = 4;

/// Default soft cap on resident storage tiles.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Default seconds between dirty-tile flush ticks.
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 15;

/// Default storage zoom level (512x512 pixel tiles).
pub const DEFAULT_STORAGE_LEVEL: u8 = 5;

/// Default highest served zoom level.
pub const DEFAULT_MAX_ZOOM_OUT: u8 = 9;

/// Default on-disk cache root directory.
pub const DEFAULT_CACHE_PREFIX: &str = "imageCache";

/// Default HTTP listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "localhost:3002";

/// Default log directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "chunkmap.log";

/// Highest storage level the cache will run at. A level-8 tile is already
/// 4096x4096 pixels (64 MiB raw); anything above that is a configuration
/// mistake.
pub const MAX_STORAGE_LEVEL: u8 = 8;

/// Widest zoom-out span (`max_zoom_out - storage_level`) the cache will
/// serve. A span of 4 already tiles a 16x16 mosaic of storage tiles per
/// request; wider spans multiply that per request and the composition
/// arithmetic is not sized for them.
pub const MAX_ZOOM_SPAN: u8 = 4;

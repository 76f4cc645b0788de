//! Hierarchical tile cache and its I/O scheduler.
//!
//! A single-writer actor owns an in-memory map of storage-level raster
//! tiles, dispatches disk reads and writes to a worker pool, coalesces
//! concurrent misses for the same tile, composes requested zoom levels from
//! the single canonical storage level, and evicts the least recently used
//! resident tile when a soft capacity is exceeded.

mod actor;
mod client;
mod config;
mod disk;
mod path;
mod resident;
mod service;
mod stats;
mod types;
mod worker;

pub use client::CacheClient;
pub use config::CacheConfig;
pub use disk::{clear, load_tile, save_tile, usage, ClearResult};
pub use path::tile_path;
pub use service::CacheService;
pub use stats::CacheStats;
pub use types::{CacheError, TileKey};

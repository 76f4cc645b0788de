//! Chunkmap - rendered map imagery for block-game worlds
//!
//! This library provides the core functionality for caching and serving
//! rendered map tiles of a block-based voxel world. Chunks of world data
//! arrive from an upstream capture path, are stamped into storage-level
//! raster tiles, and are served to HTTP clients at arbitrary zoom levels.
//!
//! # High-Level API
//!
//! Most callers go through the [`cache`] module's service and client:
//!
//! ```ignore
//! use chunkmap::cache::{CacheConfig, CacheService, TileKey};
//!
//! let service = CacheService::start(CacheConfig::default());
//! let client = service.client();
//!
//! let key = TileKey::new("world", "overworld", "terrain", 5, 0, 0);
//! let tile = client.get(key).await; // None when nothing is rendered there
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod logging;
pub mod raster;
pub mod server;

/// Version of the chunkmap library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

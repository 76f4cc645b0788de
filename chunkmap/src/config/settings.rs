//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file. These are
//! pure data types; parsing lives in [`super::parser`] and serialization in
//! [`super::writer`].

use crate::cache::CacheConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Tile cache settings
    pub cache: CacheSettings,
    /// HTTP server settings
    pub server: ServerSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Tile cache configuration.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Number of disk I/O workers
    pub workers: usize,
    /// Soft cap on resident storage tiles before LRU eviction
    pub capacity: usize,
    /// Seconds between dirty-tile flush ticks
    pub flush_interval_secs: u64,
    /// Zoom level at which tiles are persisted and held resident
    pub storage_level: u8,
    /// Highest zoom level served
    pub max_zoom_out: u8,
    /// Root directory of the on-disk cache
    pub prefix: PathBuf,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            workers: super::defaults::DEFAULT_CACHE_WORKERS,
            capacity: super::defaults::DEFAULT_CACHE_CAPACITY,
            flush_interval_secs: super::defaults::DEFAULT_FLUSH_INTERVAL_SECS,
            storage_level: super::defaults::DEFAULT_STORAGE_LEVEL,
            max_zoom_out: super::defaults::DEFAULT_MAX_ZOOM_OUT,
            prefix: PathBuf::from(super::defaults::DEFAULT_CACHE_PREFIX),
        }
    }
}

impl CacheSettings {
    /// Convert into the cache service configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::default()
            .with_workers(self.workers)
            .with_capacity(self.capacity)
            .with_flush_interval(Duration::from_secs(self.flush_interval_secs))
            .with_storage_level(self.storage_level)
            .with_max_zoom_out(self.max_zoom_out)
            .with_prefix(self.prefix.clone())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Address the tile server listens on
    pub listen_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: super::defaults::DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Directory for log files
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(super::defaults::DEFAULT_LOG_DIR),
            file: super::defaults::DEFAULT_LOG_FILE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_cache_defaults() {
        let settings = CacheSettings::default();
        let config = settings.cache_config();

        assert_eq!(config.workers, 4);
        assert_eq!(config.capacity, 512);
        assert_eq!(config.flush_interval, Duration::from_secs(15));
        assert_eq!(config.max_zoom_out, 9);
        assert_eq!(config.prefix, PathBuf::from("imageCache"));
    }

    #[test]
    fn test_default_listen_addr() {
        assert_eq!(ServerSettings::default().listen_addr, "localhost:3002");
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.directory, PathBuf::from("logs"));
        assert_eq!(logging.file, "chunkmap.log");
    }
}

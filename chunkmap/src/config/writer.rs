//! Serialization of a `ConfigFile` back to INI text.

use super::settings::ConfigFile;

/// Render the configuration as an annotated INI document.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        "# chunkmap configuration\n\
         \n\
         [cache]\n\
         # Number of disk I/O workers\n\
         workers = {workers}\n\
         # Soft cap on resident storage tiles before LRU eviction\n\
         capacity = {capacity}\n\
         # Seconds between dirty-tile flush ticks\n\
         flush_interval = {flush}\n\
         # Zoom level at which tiles are persisted (5 = 512x512 pixels)\n\
         storage_level = {storage}\n\
         # Highest zoom level served\n\
         max_zoom_out = {zoom_out}\n\
         # Root directory of the on-disk cache\n\
         prefix = {prefix}\n\
         \n\
         [server]\n\
         # Address the tile server listens on; empty disables the server\n\
         listen_addr = {listen}\n\
         \n\
         [logging]\n\
         directory = {log_dir}\n\
         file = {log_file}\n",
        workers = config.cache.workers,
        capacity = config.cache.capacity,
        flush = config.cache.flush_interval_secs,
        storage = config.cache.storage_level,
        zoom_out = config.cache.max_zoom_out,
        prefix = config.cache.prefix.display(),
        listen = config.server.listen_addr,
        log_dir = config.logging.directory.display(),
        log_file = config.logging.file,
    )
}

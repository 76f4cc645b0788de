//! INI parsing logic for converting `Ini` into a `ConfigFile`.
//!
//! Starts from defaults and overlays any values found in the INI. This is
//! the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::defaults::{MAX_STORAGE_LEVEL, MAX_ZOOM_SPAN};
use super::file::ConfigFileError;
use super::settings::ConfigFile;

pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("workers") {
            config.cache.workers = parse_positive(v, "cache", "workers")?;
        }
        if let Some(v) = section.get("capacity") {
            config.cache.capacity = parse_positive(v, "cache", "capacity")?;
        }
        if let Some(v) = section.get("flush_interval") {
            config.cache.flush_interval_secs =
                parse_positive(v, "cache", "flush_interval")? as u64;
        }
        if let Some(v) = section.get("storage_level") {
            let level: u8 = v.parse().map_err(|_| invalid("cache", "storage_level", v,
                "must be a small non-negative integer"))?;
            if level > MAX_STORAGE_LEVEL {
                return Err(invalid(
                    "cache",
                    "storage_level",
                    v,
                    "storage tiles above level 8 are unreasonably large",
                ));
            }
            config.cache.storage_level = level;
        }
        if let Some(v) = section.get("max_zoom_out") {
            config.cache.max_zoom_out = v
                .parse()
                .map_err(|_| invalid("cache", "max_zoom_out", v, "must be a small non-negative integer"))?;
        }
        if let Some(v) = section.get("prefix") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.prefix = PathBuf::from(v);
            }
        }
    }

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("listen_addr") {
            config.server.listen_addr = v.trim().to_string();
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = PathBuf::from(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    if config.cache.max_zoom_out < config.cache.storage_level {
        return Err(invalid(
            "cache",
            "max_zoom_out",
            &config.cache.max_zoom_out.to_string(),
            "must not be below storage_level",
        ));
    }
    if config.cache.max_zoom_out - config.cache.storage_level > MAX_ZOOM_SPAN {
        return Err(invalid(
            "cache",
            "max_zoom_out",
            &config.cache.max_zoom_out.to_string(),
            &format!(
                "must not be more than {} levels above storage_level",
                MAX_ZOOM_SPAN
            ),
        ));
    }

    Ok(config)
}

fn parse_positive(value: &str, section: &str, key: &str) -> Result<usize, ConfigFileError> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(section, key, value, "must be a positive integer")),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(contents: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(contents).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_yields_defaults() {
        let config = load("").unwrap();
        assert_eq!(config.cache.workers, 4);
        assert_eq!(config.cache.capacity, 512);
        assert_eq!(config.server.listen_addr, "localhost:3002");
    }

    #[test]
    fn test_cache_section_overrides() {
        let config = load(
            "[cache]\nworkers = 8\ncapacity = 64\nflush_interval = 5\nstorage_level = 4\nmax_zoom_out = 8\nprefix = /srv/tiles\n",
        )
        .unwrap();

        assert_eq!(config.cache.workers, 8);
        assert_eq!(config.cache.capacity, 64);
        assert_eq!(config.cache.flush_interval_secs, 5);
        assert_eq!(config.cache.storage_level, 4);
        assert_eq!(config.cache.max_zoom_out, 8);
        assert_eq!(config.cache.prefix, PathBuf::from("/srv/tiles"));
    }

    #[test]
    fn test_server_and_logging_sections() {
        let config = load("[server]\nlisten_addr = 0.0.0.0:8080\n[logging]\nfile = maps.log\n")
            .unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.logging.file, "maps.log");
        assert_eq!(config.logging.directory, PathBuf::from("logs"));
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let err = load("[cache]\nworkers = 0\n").unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_garbage_capacity_is_rejected() {
        assert!(load("[cache]\ncapacity = many\n").is_err());
    }

    #[test]
    fn test_oversized_storage_level_is_rejected() {
        assert!(load("[cache]\nstorage_level = 12\n").is_err());
    }

    #[test]
    fn test_zoom_cap_below_storage_level_is_rejected() {
        assert!(load("[cache]\nstorage_level = 6\nmax_zoom_out = 5\n").is_err());
    }

    #[test]
    fn test_zoom_cap_too_far_above_storage_level_is_rejected() {
        assert!(load("[cache]\nstorage_level = 0\nmax_zoom_out = 50\n").is_err());
        assert!(load("[cache]\nstorage_level = 5\nmax_zoom_out = 10\n").is_err());
    }

    #[test]
    fn test_widest_allowed_zoom_span_is_accepted() {
        let config = load("[cache]\nstorage_level = 5\nmax_zoom_out = 9\n").unwrap();
        assert_eq!(config.cache.max_zoom_out, 9);
    }
}

//! Resident tile map with LRU eviction.
//!
//! Owned exclusively by the cache actor; no interior locking. Only
//! storage-level tiles are ever resident. The capacity is a soft cap: an
//! insertion may momentarily push the map one entry over, and the eviction
//! step that follows brings it back down by dropping the least recently
//! used tile.

use crate::cache::types::TileKey;
use crate::raster::Raster;
use std::collections::HashMap;
use std::time::Instant;

/// A resident storage tile.
#[derive(Debug)]
pub(crate) struct ResidentEntry {
    /// Tile pixels, authoritative while resident
    pub raster: Raster,
    /// True when the raster has diverged from its on-disk copy
    pub dirty: bool,
    /// Updated on every read or write touching the entry
    pub last_use: Instant,
}

impl ResidentEntry {
    pub fn new(raster: Raster, dirty: bool) -> Self {
        Self {
            raster,
            dirty,
            last_use: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_use = Instant::now();
    }
}

/// Mapping from storage-level tile key to resident entry.
#[derive(Debug)]
pub(crate) struct ResidentMap {
    entries: HashMap<TileKey, ResidentEntry>,
    capacity: usize,
}

impl ResidentMap {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &TileKey) -> Option<&ResidentEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &TileKey) -> Option<&mut ResidentEntry> {
        self.entries.get_mut(key)
    }

    /// Insert an entry. If the map is now over capacity, the least recently
    /// used entry is removed and returned so the caller can flush it when it
    /// is dirty.
    pub fn insert(&mut self, key: TileKey, entry: ResidentEntry) -> Option<(TileKey, ResidentEntry)> {
        self.entries.insert(key, entry);
        if self.entries.len() > self.capacity {
            self.evict_oldest()
        } else {
            None
        }
    }

    /// Remove and return the entry with the oldest `last_use`.
    ///
    /// Ties keep the first minimum found during the scan.
    fn evict_oldest(&mut self) -> Option<(TileKey, ResidentEntry)> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_use)
            .map(|(key, _)| key.clone())?;
        let entry = self.entries.remove(&oldest)?;
        Some((oldest, entry))
    }

    /// Keys of all dirty entries, for the flush tick.
    pub fn dirty_keys(&self) -> Vec<TileKey> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.dirty)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Consume the map, returning the rasters of all dirty entries for the
    /// shutdown drain.
    pub fn into_dirty(self) -> Vec<(TileKey, Raster)> {
        self.entries
            .into_iter()
            .filter(|(_, entry)| entry.dirty)
            .map(|(key, entry)| (key, entry.raster))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster;
    use std::thread;
    use std::time::Duration;

    fn key(x: i32) -> TileKey {
        TileKey::new("hub", "overworld", "terrain", 5, x, 0)
    }

    fn entry(dirty: bool) -> ResidentEntry {
        ResidentEntry::new(raster::blank(4), dirty)
    }

    #[test]
    fn test_insert_under_capacity_evicts_nothing() {
        let mut map = ResidentMap::new(2);
        assert!(map.insert(key(1), entry(false)).is_none());
        assert!(map.insert(key(2), entry(false)).is_none());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_insert_over_capacity_evicts_oldest() {
        let mut map = ResidentMap::new(2);
        map.insert(key(1), entry(false));
        thread::sleep(Duration::from_millis(2));
        map.insert(key(2), entry(false));
        thread::sleep(Duration::from_millis(2));

        let evicted = map.insert(key(3), entry(false)).expect("one entry evicted");

        assert_eq!(evicted.0, key(1));
        assert_eq!(map.len(), 2);
        assert!(!map.contains(&key(1)));
        assert!(map.contains(&key(2)));
        assert!(map.contains(&key(3)));
    }

    #[test]
    fn test_touch_protects_from_eviction() {
        let mut map = ResidentMap::new(2);
        map.insert(key(1), entry(false));
        thread::sleep(Duration::from_millis(2));
        map.insert(key(2), entry(false));
        thread::sleep(Duration::from_millis(2));

        map.get_mut(&key(1)).unwrap().touch();
        let evicted = map.insert(key(3), entry(false)).unwrap();

        assert_eq!(evicted.0, key(2), "the untouched entry goes first");
        assert!(map.contains(&key(1)));
    }

    #[test]
    fn test_evicted_entry_carries_dirty_flag() {
        let mut map = ResidentMap::new(1);
        map.insert(key(1), entry(true));
        thread::sleep(Duration::from_millis(2));

        let (evicted_key, evicted_entry) = map.insert(key(2), entry(false)).unwrap();

        assert_eq!(evicted_key, key(1));
        assert!(evicted_entry.dirty);
    }

    #[test]
    fn test_replacing_a_key_does_not_grow_the_map() {
        let mut map = ResidentMap::new(1);
        map.insert(key(1), entry(false));
        assert!(map.insert(key(1), entry(true)).is_none());
        assert_eq!(map.len(), 1);
        assert!(map.get(&key(1)).unwrap().dirty);
    }

    #[test]
    fn test_dirty_keys_lists_only_dirty() {
        let mut map = ResidentMap::new(8);
        map.insert(key(1), entry(true));
        map.insert(key(2), entry(false));
        map.insert(key(3), entry(true));

        let mut dirty = map.dirty_keys();
        dirty.sort_by_key(|k| k.x);
        assert_eq!(dirty, vec![key(1), key(3)]);
    }

    #[test]
    fn test_into_dirty_drains_dirty_rasters() {
        let mut map = ResidentMap::new(8);
        map.insert(key(1), entry(true));
        map.insert(key(2), entry(false));

        let dirty = map.into_dirty();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].0, key(1));
    }
}

//! The tile cache actor.
//!
//! One long-lived task owns the resident map and the waiters table and
//! processes one message at a time: client commands, I/O completions from
//! the worker pool, and flush ticks. All cache state is mutated here, so no
//! locks guard any of it.
//!
//! Storage-level reads are answered from the resident map or dispatched to
//! the pool, with concurrent misses for the same tile coalesced onto a
//! single disk read. Other zoom levels are composed on the spot from
//! storage tiles: below the storage level a sub-rectangle of one tile is
//! cropped, above it a mosaic is assembled from up to `2^(s-L) x 2^(s-L)`
//! tiles. The composition paths load missing storage tiles synchronously
//! rather than through the pool; a zoom-out request can touch hundreds of
//! tiles and folding those through the waiters table would buy nothing.

use crate::cache::config::CacheConfig;
use crate::cache::disk;
use crate::cache::resident::{ResidentEntry, ResidentMap};
use crate::cache::stats::CacheStats;
use crate::cache::types::{CacheError, TileKey};
use crate::cache::worker::{IoCompletion, IoRequest};
use crate::coord;
use crate::raster::{self, Raster};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Messages accepted by the cache actor.
pub(crate) enum CacheCommand {
    /// Read a tile at any zoom level. The reply channel is closed without a
    /// value when nothing is rendered there.
    Get {
        key: TileKey,
        reply: oneshot::Sender<Raster>,
    },
    /// Write a tile: a 16x16 chunk stamp at level 0, or a whole raster at
    /// the storage level.
    Put { key: TileKey, raster: Raster },
    /// Snapshot the cache statistics.
    Stats { reply: oneshot::Sender<CacheStats> },
}

pub(crate) struct CacheActor {
    config: CacheConfig,
    resident: ResidentMap,
    /// Reply channels waiting on an in-flight disk read, by tile key
    waiters: HashMap<TileKey, Vec<oneshot::Sender<Raster>>>,
    commands: mpsc::Receiver<CacheCommand>,
    io_tx: mpsc::Sender<IoRequest>,
    io_return: mpsc::Receiver<IoCompletion>,
    workers: Vec<JoinHandle<()>>,
    stats: CacheStats,
}

impl CacheActor {
    pub fn new(
        config: CacheConfig,
        commands: mpsc::Receiver<CacheCommand>,
        io_tx: mpsc::Sender<IoRequest>,
        io_return: mpsc::Receiver<IoCompletion>,
        workers: Vec<JoinHandle<()>>,
    ) -> Self {
        let resident = ResidentMap::new(config.capacity);
        Self {
            config,
            resident,
            waiters: HashMap::new(),
            commands,
            io_tx,
            io_return,
            workers,
            stats: CacheStats::default(),
        }
    }

    /// Run until the token is cancelled or every client handle is dropped,
    /// then drain dirty tiles through the pool and wait for the workers.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut flush = tokio::time::interval_at(
            tokio::time::Instant::now() + self.config.flush_interval,
            self.config.flush_interval,
        );

        info!(
            workers = self.config.workers,
            capacity = self.config.capacity,
            storage_level = self.config.storage_level,
            prefix = %self.config.prefix.display(),
            "tile cache started"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                Some(completion) = self.io_return.recv() => {
                    self.handle_completion(completion).await;
                }

                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },

                _ = flush.tick() => self.flush_dirty().await,
            }
        }

        self.drain().await;
    }

    async fn handle_command(&mut self, command: CacheCommand) {
        match command {
            CacheCommand::Get { key, reply } => self.handle_get(key, reply).await,
            CacheCommand::Put { key, raster } => self.handle_put(key, raster).await,
            CacheCommand::Stats { reply } => {
                let _ = reply.send(self.stats.snapshot(self.resident.len()));
            }
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    async fn handle_get(&mut self, key: TileKey, reply: oneshot::Sender<Raster>) {
        if key.level == self.config.storage_level {
            self.read_storage(key, reply).await;
        } else if key.level < self.config.storage_level {
            self.read_zoom_in(key, reply).await;
        } else {
            self.read_zoom_out(key, reply).await;
        }
    }

    /// Exact storage-level read: resident map, else coalesce onto an
    /// in-flight disk read, else dispatch a new one.
    async fn read_storage(&mut self, key: TileKey, reply: oneshot::Sender<Raster>) {
        if let Some(entry) = self.resident.get_mut(&key) {
            entry.touch();
            self.stats.record_hit();
            let copy = entry.raster.clone();
            let _ = reply.send(copy);
            return;
        }

        if let Some(waiting) = self.waiters.get_mut(&key) {
            waiting.push(reply);
            self.stats.record_coalesced();
            return;
        }

        self.waiters.insert(key.clone(), vec![reply]);
        self.stats.record_miss();
        self.stats.record_pool_read();
        if self.io_tx.send(IoRequest::read(key.clone())).await.is_err() {
            warn!(key = %key, "i/o pool unavailable, failing read");
            self.waiters.remove(&key);
        }
    }

    /// Zoom-in read: the requested tile is a sub-rectangle of one storage
    /// tile.
    async fn read_zoom_in(&mut self, key: TileKey, reply: oneshot::Sender<Raster>) {
        let ax = key.x * coord::chunks_per_side(key.level);
        let az = key.z * coord::chunks_per_side(key.level);
        let (cx, cz) = coord::storage_cell(ax, az, self.config.storage_level);
        let (ox, oz) = coord::cell_offset(ax, az, self.config.storage_level);
        let storage_key = key.with_cell(self.config.storage_level, cx, cz);

        self.stats.record_composed();
        if !self.ensure_storage_resident(&storage_key).await {
            // Dropping the reply signals "absent".
            return;
        }

        if let Some(entry) = self.resident.get(&storage_key) {
            let crop = raster::crop_square(
                &entry.raster,
                ox * coord::CHUNK_PX,
                oz * coord::CHUNK_PX,
                coord::side_px(key.level),
            );
            let _ = reply.send(crop);
        }
    }

    /// Zoom-out read: tile a mosaic from the storage tiles covering the
    /// requested region. Missing tiles stay transparent.
    async fn read_zoom_out(&mut self, key: TileKey, reply: oneshot::Sender<Raster>) {
        if key.level > self.config.max_zoom_out {
            debug!(key = %key, "zoom level above cap, refusing");
            return;
        }

        let ax = key.x * coord::chunks_per_side(key.level);
        let az = key.z * coord::chunks_per_side(key.level);
        let (bx, bz) = coord::storage_cell(ax, az, self.config.storage_level);
        let cells = 1i32 << (key.level - self.config.storage_level);
        let cell_px = self.config.storage_side();

        self.stats.record_composed();
        let mut out = raster::blank(cells as u32 * cell_px);
        for dx in 0..cells {
            for dz in 0..cells {
                let storage_key = key.with_cell(self.config.storage_level, bx + dx, bz + dz);
                if !self.ensure_storage_resident(&storage_key).await {
                    continue;
                }
                if let Some(entry) = self.resident.get(&storage_key) {
                    raster::blit(
                        &mut out,
                        &entry.raster,
                        dx as u32 * cell_px,
                        dz as u32 * cell_px,
                    );
                }
            }
        }
        let _ = reply.send(out);
    }

    /// Make a storage tile resident, loading it synchronously from disk if
    /// needed. Returns false when no tile exists (or the file was
    /// unreadable).
    async fn ensure_storage_resident(&mut self, key: &TileKey) -> bool {
        if let Some(entry) = self.resident.get_mut(key) {
            entry.touch();
            self.stats.record_hit();
            return true;
        }

        match disk::load_tile(&self.config.prefix, key, self.config.storage_side()) {
            Ok(tile) => {
                self.install_clean(key.clone(), tile).await;
                true
            }
            Err(CacheError::NotPresent) => false,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to load storage tile");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    async fn handle_put(&mut self, key: TileKey, tile: Raster) {
        if key.level == self.config.storage_level {
            self.put_storage(key, tile).await;
        } else if key.level == 0 {
            self.put_stamp(key, tile).await;
        } else {
            error!(key = %key, "unsupported write level, tile dropped");
        }
    }

    /// Whole-tile write at the storage level: alpha-composited over the
    /// resident raster, or installed as a new dirty entry.
    async fn put_storage(&mut self, key: TileKey, tile: Raster) {
        let side = self.config.storage_side();
        if tile.dimensions() != (side, side) {
            error!(
                key = %key,
                width = tile.width(),
                height = tile.height(),
                "storage-level write with wrong dimensions, tile dropped"
            );
            return;
        }

        if let Some(entry) = self.resident.get_mut(&key) {
            raster::compose_over(&mut entry.raster, &tile);
            entry.dirty = true;
            entry.touch();
        } else {
            let evicted = self.resident.insert(key, ResidentEntry::new(tile, true));
            self.handle_eviction(evicted).await;
        }
    }

    /// Level-0 write: stamp a 16x16 chunk raster into its enclosing storage
    /// tile, loading or creating that tile first.
    async fn put_stamp(&mut self, key: TileKey, stamp: Raster) {
        let (cx, cz) = coord::storage_cell(key.x, key.z, self.config.storage_level);
        let (ox, oz) = coord::cell_offset(key.x, key.z, self.config.storage_level);
        let storage_key = key.with_cell(self.config.storage_level, cx, cz);

        if !self.resident.contains(&storage_key) {
            let tile = match disk::load_tile(
                &self.config.prefix,
                &storage_key,
                self.config.storage_side(),
            ) {
                Ok(tile) => tile,
                Err(CacheError::NotPresent) => raster::blank(self.config.storage_side()),
                Err(e) => {
                    warn!(key = %storage_key, error = %e, "failed to load storage tile, dropping stamp");
                    return;
                }
            };
            let evicted = self
                .resident
                .insert(storage_key.clone(), ResidentEntry::new(tile, false));
            self.handle_eviction(evicted).await;
        }

        let stamp = clip_stamp(&key, stamp);
        if let Some(entry) = self.resident.get_mut(&storage_key) {
            raster::blit(
                &mut entry.raster,
                &stamp,
                ox * coord::CHUNK_PX,
                oz * coord::CHUNK_PX,
            );
            entry.dirty = true;
            entry.touch();
        }
    }

    // ------------------------------------------------------------------
    // Completions, flushing, eviction, shutdown
    // ------------------------------------------------------------------

    /// A pool read finished: answer every coalesced waiter, then keep the
    /// tile resident (clean) for the next reader.
    async fn handle_completion(&mut self, completion: IoCompletion) {
        let Some(waiting) = self.waiters.remove(&completion.key) else {
            debug!(key = %completion.key, "read completion with no waiters");
            return;
        };

        match completion.raster {
            Some(tile) => {
                for waiter in waiting {
                    // A waiter that gave up and dropped its receiver is fine.
                    let _ = waiter.send(tile.clone());
                }
                self.install_clean(completion.key, tile).await;
            }
            None => {
                // Closing the reply channels signals "absent".
                drop(waiting);
            }
        }
    }

    async fn install_clean(&mut self, key: TileKey, tile: Raster) {
        let evicted = self.resident.insert(key, ResidentEntry::new(tile, false));
        self.handle_eviction(evicted).await;
    }

    /// Queue a pool write for an evicted dirty tile so eviction never loses
    /// pixels that have not reached disk.
    async fn handle_eviction(&mut self, evicted: Option<(TileKey, ResidentEntry)>) {
        let Some((key, entry)) = evicted else { return };
        self.stats.record_eviction();
        debug!(key = %key, dirty = entry.dirty, "evicted least recently used tile");
        if entry.dirty {
            self.stats.record_pool_write();
            if self
                .io_tx
                .send(IoRequest::write(key, entry.raster))
                .await
                .is_err()
            {
                error!("i/o pool unavailable, evicted dirty tile lost");
            }
        }
    }

    /// Flush tick: queue a write for every dirty tile and clear the flag
    /// optimistically. A failed write is logged by the worker; the raster
    /// stays authoritative in memory and is rewritten on the next change.
    async fn flush_dirty(&mut self) {
        let dirty = self.resident.dirty_keys();
        if dirty.is_empty() {
            return;
        }

        let mut count = 0;
        for key in dirty {
            let Some(entry) = self.resident.get_mut(&key) else {
                continue;
            };
            entry.dirty = false;
            let tile = entry.raster.clone();
            self.stats.record_pool_write();
            self.stats.record_flush();
            if self.io_tx.send(IoRequest::write(key, tile)).await.is_err() {
                error!("i/o pool unavailable, flush aborted");
                return;
            }
            count += 1;
        }
        info!(count, "flushed dirty tiles to disk");
    }

    /// Shutdown: queue a final write per dirty tile, close the pool input
    /// and wait for every worker to finish its drain.
    async fn drain(self) {
        let CacheActor {
            resident,
            waiters,
            io_tx,
            workers,
            ..
        } = self;

        // Outstanding readers see their reply channels close.
        drop(waiters);

        let dirty = resident.into_dirty();
        info!(count = dirty.len(), "tile cache shutting down, saving dirty tiles");
        for (key, tile) in dirty {
            if io_tx.send(IoRequest::write(key, tile)).await.is_err() {
                error!("i/o pool unavailable during shutdown drain");
                break;
            }
        }

        drop(io_tx);
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "i/o worker panicked");
            }
        }
        info!("tile cache stopped");
    }
}

/// Chunk stamps are 16x16; anything larger is clipped to the chunk cell so
/// a stray oversized stamp cannot bleed into neighbouring chunks.
fn clip_stamp(key: &TileKey, stamp: Raster) -> Raster {
    let (w, h) = stamp.dimensions();
    if w <= coord::CHUNK_PX && h <= coord::CHUNK_PX {
        return stamp;
    }
    warn!(key = %key, width = w, height = h, "oversized chunk stamp clipped");
    raster::crop_square(&stamp, 0, 0, coord::CHUNK_PX)
}

//! Client handle for the tile cache actor.

use crate::cache::actor::CacheCommand;
use crate::cache::stats::CacheStats;
use crate::cache::types::TileKey;
use crate::raster::Raster;
use tokio::sync::{mpsc, oneshot};

/// Cheap-to-clone handle that talks to the cache actor over its command
/// channel. Messages from one handle are processed in send order, so a
/// `put` followed by a `get` of the same storage tile always observes the
/// write.
#[derive(Clone)]
pub struct CacheClient {
    commands: mpsc::Sender<CacheCommand>,
}

impl CacheClient {
    pub(crate) fn new(commands: mpsc::Sender<CacheCommand>) -> Self {
        Self { commands }
    }

    /// Fetch the tile for `key`, waiting for disk if necessary.
    ///
    /// Returns `None` when nothing is rendered there, when the zoom level is
    /// above the configured cap, or when the cache is shutting down; the
    /// caller can render a placeholder.
    pub async fn get(&self, key: TileKey) -> Option<Raster> {
        let (reply, receive) = oneshot::channel();
        self.commands
            .send(CacheCommand::Get { key, reply })
            .await
            .ok()?;
        receive.await.ok()
    }

    /// Hand a freshly rendered tile to the cache. Fire-and-forget: the write
    /// is durable after the next flush tick (or shutdown drain) at the
    /// latest.
    ///
    /// `key.level` must be 0 (a single 16x16 chunk stamp) or the storage
    /// level (a whole tile); anything else is rejected with an error log.
    pub async fn put(&self, key: TileKey, raster: Raster) {
        let _ = self.commands.send(CacheCommand::Put { key, raster }).await;
    }

    /// Snapshot of the cache counters. `None` once the cache has shut down.
    pub async fn stats(&self) -> Option<CacheStats> {
        let (reply, receive) = oneshot::channel();
        self.commands
            .send(CacheCommand::Stats { reply })
            .await
            .ok()?;
        receive.await.ok()
    }
}

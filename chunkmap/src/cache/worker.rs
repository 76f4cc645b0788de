//! Disk I/O worker pool.
//!
//! A fixed set of workers drains one bounded request queue. A request with a
//! raster is a write, a request without one is a read. Read completions go
//! back to the actor's return channel; writes post nothing and log their
//! failures. The pool exits once the request channel is closed, after
//! draining whatever is still queued, which is how the shutdown path gets
//! its final writes onto disk.

use crate::cache::disk;
use crate::cache::types::{CacheError, TileKey};
use crate::raster::Raster;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Bound of the pool's request queue; producers block when it is full.
pub(crate) const IO_QUEUE_CAPACITY: usize = 32;

/// One unit of disk work.
#[derive(Debug)]
pub(crate) struct IoRequest {
    pub key: TileKey,
    /// Present for writes, absent for reads
    pub raster: Option<Raster>,
}

impl IoRequest {
    pub fn read(key: TileKey) -> Self {
        Self { key, raster: None }
    }

    pub fn write(key: TileKey, raster: Raster) -> Self {
        Self {
            key,
            raster: Some(raster),
        }
    }
}

/// Outcome of a read request. `raster` is `None` when no tile exists (or
/// the file was unreadable and has been removed).
#[derive(Debug)]
pub(crate) struct IoCompletion {
    pub key: TileKey,
    pub raster: Option<Raster>,
}

/// Spawn `workers` I/O tasks draining `requests`.
///
/// Read completions are posted to `completions`; its capacity must cover the
/// request queue plus one in-flight read per worker so a worker can never
/// block on it during shutdown.
pub(crate) fn spawn_pool(
    workers: usize,
    prefix: PathBuf,
    storage_side: u32,
    requests: mpsc::Receiver<IoRequest>,
    completions: mpsc::Sender<IoCompletion>,
) -> Vec<JoinHandle<()>> {
    let queue = Arc::new(Mutex::new(requests));
    (0..workers)
        .map(|id| {
            let queue = Arc::clone(&queue);
            let completions = completions.clone();
            let prefix = prefix.clone();
            tokio::spawn(async move {
                worker_loop(id, queue, prefix, storage_side, completions).await;
            })
        })
        .collect()
}

async fn worker_loop(
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<IoRequest>>>,
    prefix: PathBuf,
    storage_side: u32,
    completions: mpsc::Sender<IoCompletion>,
) {
    loop {
        // Hold the queue lock only while dequeueing so the other workers can
        // run their disk operations in parallel.
        let request = { queue.lock().await.recv().await };
        let Some(request) = request else {
            debug!(worker = id, "i/o worker exiting");
            break;
        };

        match request.raster {
            Some(raster) => {
                if let Err(e) = disk::save_tile(&prefix, &request.key, &raster) {
                    error!(key = %request.key, error = %e, "failed to write tile");
                }
            }
            None => {
                let raster = match disk::load_tile(&prefix, &request.key, storage_side) {
                    Ok(raster) => Some(raster),
                    Err(CacheError::NotPresent) => None,
                    Err(e) => {
                        warn!(key = %request.key, error = %e, "failed to read tile");
                        None
                    }
                };
                let completion = IoCompletion {
                    key: request.key,
                    raster,
                };
                if completions.send(completion).await.is_err() {
                    // Actor is gone; nothing left to report to.
                    break;
                }
            }
        }
    }
}

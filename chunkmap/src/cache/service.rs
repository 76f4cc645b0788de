//! Tile cache service: wiring and lifecycle.

use crate::cache::actor::CacheActor;
use crate::cache::client::CacheClient;
use crate::cache::config::CacheConfig;
use crate::cache::worker::{self, IO_QUEUE_CAPACITY};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Capacity of the actor's command channel.
const COMMAND_QUEUE_CAPACITY: usize = 32;

/// A running tile cache: the actor task, its I/O worker pool, and a client
/// handle for callers.
///
/// Must be started from within a Tokio runtime. Dropping the service
/// without calling [`shutdown`](CacheService::shutdown) cancels the actor
/// but does not wait for the final disk writes; call `shutdown` for a clean
/// drain.
pub struct CacheService {
    client: CacheClient,
    shutdown: CancellationToken,
    actor: JoinHandle<()>,
}

impl CacheService {
    /// Wire the channels, spawn the worker pool and the actor, and return
    /// the running service.
    pub fn start(config: CacheConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (io_tx, io_rx) = mpsc::channel(IO_QUEUE_CAPACITY);
        // Sized so a worker can always post its completion, even while the
        // actor is busy draining at shutdown: every queued read plus one
        // in-flight per worker fits without blocking.
        let (return_tx, return_rx) = mpsc::channel(IO_QUEUE_CAPACITY + 4 * config.workers);

        let workers = worker::spawn_pool(
            config.workers,
            config.prefix.clone(),
            config.storage_side(),
            io_rx,
            return_tx,
        );

        let actor = CacheActor::new(config, command_rx, io_tx, return_rx, workers);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(actor.run(shutdown.clone()));

        Self {
            client: CacheClient::new(command_tx),
            shutdown,
            actor: handle,
        }
    }

    /// A client handle; clone freely.
    pub fn client(&self) -> CacheClient {
        self.client.clone()
    }

    /// Cancellation token observed by the actor; cancelling it is
    /// equivalent to calling [`shutdown`](CacheService::shutdown) except it
    /// does not wait for the drain.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop the cache: drain dirty tiles through the pool, wait for every
    /// worker to exit, then return.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.actor.await {
            warn!(error = %e, "cache actor task failed");
        }
    }
}

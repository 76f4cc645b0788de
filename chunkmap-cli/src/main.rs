//! Chunkmap CLI - command-line interface
//!
//! This binary provides a command-line interface to the chunkmap library:
//! argument parsing with clap, configuration from
//! `~/.chunkmap/config.ini` (CLI arguments override config file values),
//! and the long-running `serve` command hosting the tile cache and its
//! HTTP routes.

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use std::path::PathBuf;

use chunkmap::cache::{self, CacheService};
use chunkmap::config::{format_size, ConfigFile};
use chunkmap::logging;
use chunkmap::server::{router, ServerState};
use tokio_util::sync::CancellationToken;
use tracing::info;

// ============================================================================
// CLI Argument Definitions
// ============================================================================

#[derive(Parser)]
#[command(name = "chunkmap")]
#[command(version = chunkmap::VERSION)]
#[command(about = "Rendered map tile server for block-game worlds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration file at ~/.chunkmap/config.ini
    Init,

    /// Run the tile cache and HTTP server until interrupted
    Serve {
        /// Listen address (default: from config)
        #[arg(long)]
        listen: Option<String>,

        /// On-disk cache root directory (default: from config)
        #[arg(long)]
        prefix: Option<PathBuf>,

        /// Number of disk I/O workers (default: from config)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Inspect or clear the on-disk tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show on-disk cache usage for one dimension
    Stats {
        /// World name
        #[arg(long)]
        world: String,

        /// Dimension name
        #[arg(long)]
        dim: String,
    },
    /// Delete the entire on-disk cache
    Clear,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => run_init(),
        Commands::Serve {
            listen,
            prefix,
            workers,
        } => run_serve(listen, prefix, workers),
        Commands::Cache { action } => run_cache(action),
    };

    if let Err(e) = result {
        e.exit();
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Initialize configuration file.
fn run_init() -> Result<(), CliError> {
    let path = ConfigFile::ensure_exists().map_err(|e| CliError::Config(e.to_string()))?;
    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize chunkmap settings.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

/// Run the tile cache and HTTP server until Ctrl+C, then drain.
fn run_serve(
    listen: Option<String>,
    prefix: Option<PathBuf>,
    workers: Option<usize>,
) -> Result<(), CliError> {
    let config = ConfigFile::load().map_err(|e| CliError::Config(e.to_string()))?;
    let _logging_guard = logging::init_logging(&config.logging.directory, &config.logging.file)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    // CLI takes precedence, then config
    let mut cache_config = config.cache.cache_config();
    if let Some(prefix) = prefix {
        cache_config.prefix = prefix;
    }
    if let Some(workers) = workers {
        if workers == 0 {
            return Err(CliError::Config("--workers must be at least 1".to_string()));
        }
        cache_config.workers = workers;
    }
    let listen_addr = listen.unwrap_or_else(|| config.server.listen_addr.clone());
    if listen_addr.is_empty() {
        return Err(CliError::Config(
            "listen address is empty; set server.listen_addr or use --listen".to_string(),
        ));
    }

    println!("Chunkmap tile server v{}", chunkmap::VERSION);
    println!("==========================");
    println!();
    println!("Listen:  {}", listen_addr);
    println!("Cache:   {}", cache_config.prefix.display());
    println!(
        "Workers: {}, capacity {} tiles, flush every {}s",
        cache_config.workers,
        cache_config.capacity,
        cache_config.flush_interval.as_secs()
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Serve(e.to_string()))?;

    runtime.block_on(async move {
        let prefix = cache_config.prefix.clone();
        let service = CacheService::start(cache_config);
        let app = router(ServerState {
            cache: service.client(),
            prefix,
        });

        let listener = tokio::net::TcpListener::bind(&listen_addr)
            .await
            .map_err(|e| CliError::Serve(format!("failed to bind {}: {}", listen_addr, e)))?;
        info!(addr = %listen_addr, "web server listening");

        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                signal_token.cancel();
            }
        });

        let server_token = shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_token.cancelled().await })
            .await
            .map_err(|e| CliError::Serve(e.to_string()))?;

        // Web server is down; drain the cache before exiting.
        service.shutdown().await;
        Ok::<(), CliError>(())
    })?;

    println!("Shutdown complete.");
    Ok(())
}

/// Run a cache subcommand.
fn run_cache(action: CacheAction) -> Result<(), CliError> {
    let config = ConfigFile::load().map_err(|e| CliError::Config(e.to_string()))?;
    let prefix = config.cache.prefix;

    match action {
        CacheAction::Stats { world, dim } => {
            println!("Tile cache: {}", prefix.display());

            match cache::usage(&prefix, &world, &dim) {
                Ok((files, bytes)) => {
                    println!("  World:     {} / {}", world, dim);
                    println!("  Files:     {}", files);
                    println!("  Size:      {}", format_size(bytes));
                    Ok(())
                }
                Err(e) => Err(CliError::CacheStats(e.to_string())),
            }
        }
        CacheAction::Clear => {
            println!("Clearing tile cache at: {}", prefix.display());

            match cache::clear(&prefix) {
                Ok(result) => {
                    println!(
                        "Deleted {} files, freed {}",
                        result.files_deleted,
                        format_size(result.bytes_freed)
                    );
                    Ok(())
                }
                Err(e) => Err(CliError::CacheClear(e.to_string())),
            }
        }
    }
}

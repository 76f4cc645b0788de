//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and an appropriate exit code.

use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Tile server error
    Serve(String),
    /// Failed to measure cache usage
    CacheStats(String),
    /// Failed to clear the cache
    CacheClear(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Serve(_) = self {
            eprintln!();
            eprintln!("Common issues:");
            eprintln!("  1. Address already in use: another chunkmap instance is running");
            eprintln!("  2. Permission denied: ports below 1024 need elevated privileges");
            eprintln!("  3. Set listen_addr in ~/.chunkmap/config.ini or use --listen");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "configuration error: {}", msg),
            CliError::Serve(msg) => write!(f, "tile server error: {}", msg),
            CliError::CacheStats(msg) => write!(f, "failed to measure cache usage: {}", msg),
            CliError::CacheClear(msg) => write!(f, "failed to clear cache: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

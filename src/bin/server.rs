//! LogKV Server Binary
//!
//! Replays the transaction log and starts the HTTP server.

use std::sync::Arc;

use clap::Parser;
use logkv::network::Server;
use logkv::{Config, Engine, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// LogKV Server
#[derive(Parser, Debug)]
#[command(name = "logkv-server")]
#[command(about = "Crash-recoverable key-value store with a transaction log")]
#[command(version)]
struct Args {
    /// Transaction log file
    #[arg(short = 'f', long, default_value = "transaction.log")]
    log_file: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Records the log queue holds before writers block
    #[arg(short, long, default_value = "16")]
    queue_capacity: usize,

    /// fsync after this many records (1 = every record)
    #[arg(short, long, default_value = "100")]
    sync_every: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,logkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("LogKV Server v{}", logkv::VERSION);
    tracing::info!("Transaction log: {}", args.log_file);
    tracing::info!("Listen address: {}", args.listen);

    let sync_strategy = match args.sync_every {
        1 => SyncStrategy::EveryWrite,
        count => SyncStrategy::EveryNEntries { count },
    };

    // Build config from args
    let config = Config::builder()
        .log_path(&args.log_file)
        .listen_addr(&args.listen)
        .queue_capacity(args.queue_capacity)
        .sync_strategy(sync_strategy)
        .build();

    // Replay the log; a corrupt or unreadable log must not be served
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to initialize transaction log: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");

    let server = Server::new(config, engine);
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

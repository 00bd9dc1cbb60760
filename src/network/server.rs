//! HTTP Server
//!
//! Binds the listen address, serves the router on a tokio runtime, and
//! drains the transaction log on shutdown.

use std::future::Future;
use std::sync::Arc;
use std::thread;

use tokio::net::TcpListener;

use super::router;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::{KvError, Result};

/// HTTP server for LogKV
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
}

impl Server {
    /// Create a new server with the given config and engine
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self { config, engine }
    }

    /// Start the server (blocking until Ctrl+C)
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.serve_until(shutdown_signal()))
    }

    /// Serve until `shutdown` resolves, then close the engine
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.listen_addr.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| KvError::Network(format!("cannot bind {}: {}", addr, e)))?;
        tracing::info!(addr = %listener.local_addr()?, "listening");

        watch_writer_errors(&self.engine)?;

        axum::serve(listener, router(Arc::clone(&self.engine)))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| KvError::Network(e.to_string()))?;

        tracing::info!("server stopped accepting requests, draining transaction log");
        let engine = self.engine;
        tokio::task::spawn_blocking(move || engine.close())
            .await
            .map_err(|e| KvError::Network(format!("shutdown task failed: {}", e)))?
    }
}

/// Resolves on Ctrl+C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, initiating shutdown...");
}

/// Log the writer's failure when it happens. Reads keep being served;
/// mutations start failing with `WriterClosed`.
fn watch_writer_errors(engine: &Engine) -> Result<()> {
    let errors = engine.writer_errors();
    thread::Builder::new()
        .name("txlog-errors".into())
        .spawn(move || {
            if let Ok(e) = errors.recv() {
                tracing::error!(error = %e, "transaction log writer stopped; mutations will fail");
            }
        })?;
    Ok(())
}

//! Error types for LogKV
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for LogKV operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Transaction Log Errors
    // -------------------------------------------------------------------------
    #[error("cannot open transaction log {}: {source}", path.display())]
    LogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transaction log write failed: {0}")]
    LogWrite(#[source] std::io::Error),

    #[error("transaction log corrupt at line {line}: {detail}")]
    LogCorruption { line: usize, detail: String },

    #[error("transaction log sequence numbers exhausted after {0}")]
    SequenceOverflow(u64),

    #[error("transaction log writer is closed")]
    WriterClosed,

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// Build a corruption error for the given 1-based line number
    pub(crate) fn corruption(line: usize, detail: impl Into<String>) -> Self {
        KvError::LogCorruption {
            line,
            detail: detail.into(),
        }
    }
}

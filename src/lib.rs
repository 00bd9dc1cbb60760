//! # LogKV
//!
//! A crash-recoverable in-memory key-value store with:
//! - An append-only transaction log of every mutation
//! - An asynchronous, bounded-queue log writer (one background thread)
//! - Startup replay with sequence validation
//! - An HTTP API on `/v1/{key}`
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Server                            │
//! │              PUT / GET / DELETE /v1/{key}                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                               │
//! │          (replay on open, store + log on mutate)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Store    │          │  LogWriter  │
//!   │  (RwLock)   │          │ (queue+thd) │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌───────────────┐
//!                           │transaction.log│
//!                           └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod network;
pub mod store;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, SyncStrategy};
pub use engine::Engine;
pub use error::{KvError, Result};
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LogKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Engine Module
//!
//! Ties the store to its transaction log.
//!
//! ## Responsibilities
//! - Replay the log into a fresh store before serving traffic
//! - Activate the log writer once replay completes cleanly
//! - Apply live mutations to the store once the writer accepts their records
//!
//! ## Durability window
//! `put`/`delete` land in the store synchronously as soon as the writer
//! queue accepts their record; the record is appended afterwards by the
//! writer thread. A crash in between loses the record along with the
//! in-memory change. A mutation the writer refuses (closed or stopped) is
//! not applied. Two callers racing on one key may have their records
//! appended in a different order than their store writes landed; only the
//! log order survives a restart.

use std::path::Path;

use crossbeam::channel::Receiver;

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::store::Store;
use crate::wal::{Event, LogWriter, Operation, ReplaySummary, TransactionLog};

/// The store plus its running log writer
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// In-memory system of record (internal RwLock)
    store: Store,

    /// Background appender (internal queue)
    log: LogWriter,

    /// What startup replay recovered
    replay: ReplaySummary,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create the transaction log
    /// 2. Replay every record into an empty store
    /// 3. Abort on the first corrupt or unreadable record
    /// 4. Start the writer after the replayed tail
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let mut log = TransactionLog::open(&config.log_path)?;
        let store = Store::new();
        let replay = replay_into(&mut log, &store)?;

        tracing::info!(
            events = replay.events_replayed,
            puts = replay.puts,
            deletes = replay.deletes,
            last_sequence = replay.last_sequence,
            keys = store.len(),
            "transaction log replayed"
        );

        let log = log.run(&config)?;

        Ok(Self {
            config,
            store,
            log,
            replay,
        })
    }

    /// Open with a log path (convenience method)
    ///
    /// Uses default config with the specified log file
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().log_path(path).build())
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Result<String> {
        self.store.get(key)
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Queue the log record (blocks while the queue is full)
    /// 2. Write to the store, only if the record was accepted
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let operation = Operation::Put {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.log.submit_then(operation, || self.store.put(key, value))
    }

    /// Delete a key. Succeeds whether or not the key existed.
    pub fn delete(&self, key: &str) -> Result<()> {
        let operation = Operation::Delete {
            key: key.to_string(),
        };
        self.log.submit_then(operation, || self.store.delete(key))
    }

    /// Stream of asynchronous log write failures
    pub fn writer_errors(&self) -> Receiver<KvError> {
        self.log.errors()
    }

    /// Drain queued log records and stop the writer
    ///
    /// Reads keep working afterwards; mutations fail with
    /// [`KvError::WriterClosed`].
    pub fn close(&self) -> Result<()> {
        self.log.close()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn replay_summary(&self) -> ReplaySummary {
        self.replay
    }

    /// Sequence of the most recent record written
    pub fn last_sequence(&self) -> u64 {
        self.log.last_sequence()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Drain one replay pass into `store`, stopping at the first error
pub fn replay_into(log: &mut TransactionLog, store: &Store) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for event in log.read_events() {
        let event = event?;
        apply(store, &event);

        summary.events_replayed += 1;
        match event.operation {
            Operation::Put { .. } => summary.puts += 1,
            Operation::Delete { .. } => summary.deletes += 1,
        }
        summary.last_sequence = event.sequence;
    }

    Ok(summary)
}

/// Apply one record through the same store operations live traffic uses
fn apply(store: &Store, event: &Event) {
    match &event.operation {
        Operation::Put { key, value } => store.put(key.as_str(), value.as_str()),
        Operation::Delete { key } => store.delete(key),
    }
}

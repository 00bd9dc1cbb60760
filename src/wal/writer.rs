//! Transaction log writer
//!
//! A bounded queue in front of one background worker that appends records.
//!
//! ## Flow
//! ```text
//!  write_put / write_delete ──► bounded queue (capacity N) ──► worker thread
//!        (blocks when full)                                      │
//!                                                                ├─ assign sequence = last + 1
//!                                                                ├─ append record to sink
//!                                                                └─ sync per SyncStrategy
//! ```
//!
//! Write failures (I/O errors, sequence exhaustion) are reported once on the
//! error channel (capacity 1) and stop the worker. Submissions made after
//! that, or after `close`, fail with [`KvError::WriterClosed`].

use std::fs::File;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};

use super::{Event, Operation};
use crate::config::{Config, SyncStrategy};
use crate::error::{KvError, Result};

/// Destination of the writer's records
pub trait LogSink: Write + Send + 'static {
    /// Force written records to stable storage
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Asynchronous appender for the transaction log
///
/// All methods take `&self`, so one writer can be shared behind an `Arc`
/// by every request handler.
pub struct LogWriter {
    /// Producer side of the queue; `None` once `close` has begun
    sender: RwLock<Option<Sender<Operation>>>,

    /// Consumer side of the error channel
    errors: Receiver<KvError>,

    /// Background worker, taken by `close`
    worker: Mutex<Option<JoinHandle<Result<()>>>>,

    /// Last sequence number handed to the sink
    last_sequence: Arc<AtomicU64>,
}

impl LogWriter {
    /// Start a writer on `sink`, continuing after `last_sequence`
    pub fn spawn<S: LogSink>(sink: S, last_sequence: u64, config: &Config) -> Result<Self> {
        Self::spawn_inner(sink, last_sequence, config, false)
    }

    pub(crate) fn spawn_inner<S: LogSink>(
        sink: S,
        last_sequence: u64,
        config: &Config,
        leading_newline: bool,
    ) -> Result<Self> {
        config.validate()?;

        let (sender, queue) = channel::bounded(config.queue_capacity);
        let (error_tx, errors) = channel::bounded(1);
        let last_sequence = Arc::new(AtomicU64::new(last_sequence));

        let worker = Worker {
            queue,
            errors: error_tx,
            last_sequence: Arc::clone(&last_sequence),
            sync_strategy: config.sync_strategy,
            leading_newline,
            unsynced: 0,
        };

        let handle = thread::Builder::new()
            .name("txlog-writer".into())
            .spawn(move || worker.run(sink))?;

        tracing::debug!(
            capacity = config.queue_capacity,
            last_sequence = last_sequence.load(Ordering::Acquire),
            "transaction log writer started"
        );

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            errors,
            worker: Mutex::new(Some(handle)),
            last_sequence,
        })
    }

    /// Queue a put record. Blocks only while the queue is full.
    pub fn write_put(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.submit(Operation::Put {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Queue a delete record. Blocks only while the queue is full.
    pub fn write_delete(&self, key: impl Into<String>) -> Result<()> {
        self.submit(Operation::Delete { key: key.into() })
    }

    fn submit(&self, operation: Operation) -> Result<()> {
        self.submit_then(operation, || ())
    }

    /// Queue `operation`, then run `apply` only if the writer accepted it.
    ///
    /// A refused record (writer closed or stopped) leaves `apply` unrun, so
    /// a mutation reported as failed never takes effect. `close` cannot
    /// complete between acceptance and `apply`.
    pub fn submit_then<F: FnOnce()>(&self, operation: Operation, apply: F) -> Result<()> {
        // The read guard is held across a blocking send; `close` waits on
        // the write side until in-flight submissions are accepted.
        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(KvError::WriterClosed)?;
        sender.send(operation).map_err(|_| KvError::WriterClosed)?;
        apply();
        Ok(())
    }

    /// Stream of asynchronous write failures (at most one per writer)
    pub fn errors(&self) -> Receiver<KvError> {
        self.errors.clone()
    }

    /// Sequence number of the most recent record written
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::Acquire)
    }

    /// Records accepted but not yet written
    pub fn pending(&self) -> usize {
        self.sender.read().as_ref().map_or(0, |s| s.len())
    }

    /// Drain every accepted record, sync, and stop the worker.
    ///
    /// Idempotent; later calls return `Ok(())`.
    pub fn close(&self) -> Result<()> {
        drop(self.sender.write().take());

        let handle = self.worker.lock().take();
        let Some(handle) = handle else {
            return Ok(());
        };

        let outcome = handle.join().map_err(|_| {
            KvError::LogWrite(io::Error::new(
                io::ErrorKind::Other,
                "transaction log writer panicked",
            ))
        })?;

        tracing::info!(
            last_sequence = self.last_sequence(),
            "transaction log writer closed"
        );
        outcome
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "error closing transaction log writer");
        }
    }
}

/// State owned by the background thread
struct Worker {
    queue: Receiver<Operation>,
    errors: Sender<KvError>,
    last_sequence: Arc<AtomicU64>,
    sync_strategy: SyncStrategy,
    leading_newline: bool,
    unsynced: usize,
}

impl Worker {
    fn run<S: LogSink>(mut self, mut sink: S) -> Result<()> {
        // Ends once every sender is dropped and the queue is empty.
        while let Ok(operation) = self.queue.recv() {
            let last = self.last_sequence.load(Ordering::Acquire);
            let Some(sequence) = last.checked_add(1) else {
                tracing::error!(last_sequence = last, "sequence numbers exhausted, writer stopping");
                self.fail(KvError::SequenceOverflow(last));
                return Ok(());
            };
            let event = Event::new(sequence, operation);

            if let Err(e) = self.append(&mut sink, &event) {
                tracing::error!(sequence, error = %e, "transaction log write failed, writer stopping");
                self.fail(KvError::LogWrite(e));
                return Ok(());
            }

            self.last_sequence.store(sequence, Ordering::Release);
            tracing::trace!(%event, "appended");
        }

        sink.flush()?;
        sink.sync()?;
        Ok(())
    }

    /// Report the single fault this worker will ever raise
    fn fail(&self, error: KvError) {
        // Capacity 1 and only ever one send, so this cannot be full.
        let _ = self.errors.try_send(error);
    }

    fn append<S: LogSink>(&mut self, sink: &mut S, event: &Event) -> io::Result<()> {
        let mut record = event.encode();
        if self.leading_newline {
            record.insert(0, '\n');
        }

        sink.write_all(record.as_bytes())?;
        sink.flush()?;
        self.leading_newline = false;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            sink.sync()?;
            self.unsynced = 0;
        }
        Ok(())
    }
}

//! Transaction log lifecycle
//!
//! A [`TransactionLog`] is an opened log that has not started writing yet.
//! It supports replay passes; [`TransactionLog::run`] then hands the file to
//! a [`LogWriter`] that continues numbering after the replayed tail.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use super::reader::{Replay, ReplayProgress};
use super::LogWriter;
use crate::config::Config;
use crate::error::{KvError, Result};

/// Result of replaying a log into a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Number of records applied
    pub events_replayed: u64,

    /// Of which puts
    pub puts: u64,

    /// Of which deletes
    pub deletes: u64,

    /// Last valid sequence number (0 for an empty log)
    pub last_sequence: u64,
}

/// An opened transaction log in its replay phase
pub struct TransactionLog {
    path: PathBuf,
    file: File,
    progress: ReplayProgress,
}

impl TransactionLog {
    /// Open the log at `path` for appending, creating it (and its parent
    /// directories) if absent
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_error = |source: std::io::Error| KvError::LogOpen {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_error)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_error)?;

        tracing::info!(path = %path.display(), "transaction log opened");

        Ok(Self {
            path,
            file,
            progress: ReplayProgress::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest sequence seen by the most recent replay pass
    pub fn last_sequence(&self) -> u64 {
        self.progress.last_sequence
    }

    /// Start a replay pass over the whole file.
    ///
    /// Each pass validates sequences from zero.
    pub fn read_events(&mut self) -> Replay<'_> {
        Replay::start(self.path.clone(), &mut self.progress)
    }

    /// Activate the background writer, consuming the replay phase
    ///
    /// The writer continues after the last sequence of a complete pass. If
    /// no pass has reached end of file, one is run here first and its
    /// error, if any, is returned instead of starting the writer.
    pub fn run(mut self, config: &Config) -> Result<LogWriter> {
        if !self.progress.complete {
            tracing::debug!(
                path = %self.path.display(),
                "no complete replay pass, validating log before writing"
            );
            for event in self.read_events() {
                event?;
            }
        }

        if self.progress.unterminated_tail {
            tracing::warn!(
                path = %self.path.display(),
                "last record has no newline terminator; it will be terminated before the next append"
            );
        }

        LogWriter::spawn_inner(
            self.file,
            self.progress.last_sequence,
            config,
            self.progress.unterminated_tail,
        )
    }
}

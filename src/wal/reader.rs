//! Transaction log reader
//!
//! Scans a log file front-to-back on a background thread and yields its
//! records, in file order, as one stream of `Result<Event>`.
//!
//! ## Pass state machine
//! ```text
//! Scanning ──► yield Ok(event) ──► Scanning
//!     │
//!     ├──────► yield Err(..)  ──► Terminated
//!     └──────► EOF            ──► Terminated (clean)
//! ```
//! At most one `Err` is yielded per pass, and nothing follows it.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};

use super::Event;
use crate::error::{KvError, Result};

/// What a replay pass has established about the log so far
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ReplayProgress {
    /// Highest sequence yielded in the current pass
    pub last_sequence: u64,

    /// The final line parsed but had no newline terminator
    pub unterminated_tail: bool,

    /// The pass reached end of file without an error
    pub complete: bool,
}

/// How a background scan ended
enum ScanEnd {
    /// Every record was delivered
    Eof { unterminated: bool },

    /// An error was delivered, or the consumer went away
    Stopped,
}

/// Iterator over the records of one replay pass
///
/// Dropping it before the end stops the background scan and releases the
/// file handle.
pub struct Replay<'a> {
    events: Option<Receiver<Result<Event>>>,
    worker: Option<JoinHandle<ScanEnd>>,
    progress: &'a mut ReplayProgress,
}

impl<'a> Replay<'a> {
    pub(crate) fn start(path: PathBuf, progress: &'a mut ReplayProgress) -> Self {
        *progress = ReplayProgress::default();

        // Zero capacity: the scanner runs at most one record ahead of the consumer.
        let (tx, rx) = channel::bounded(0);
        let worker = thread::Builder::new()
            .name("txlog-reader".into())
            .spawn(move || scan(path, tx));

        match worker {
            Ok(handle) => Self {
                events: Some(rx),
                worker: Some(handle),
                progress,
            },
            Err(e) => {
                // Surface the spawn failure as the pass's single error.
                let (tx, rx) = channel::bounded(1);
                let _ = tx.send(Err(KvError::Io(e)));
                Self {
                    events: Some(rx),
                    worker: None,
                    progress,
                }
            }
        }
    }

    /// Highest sequence yielded so far
    pub fn last_sequence(&self) -> u64 {
        self.progress.last_sequence
    }

    /// Stop receiving and join the scanner. Returns an error if it panicked.
    fn finish(&mut self) -> Option<KvError> {
        self.events = None;
        let handle = self.worker.take()?;
        match handle.join() {
            Ok(ScanEnd::Eof { unterminated }) => {
                self.progress.unterminated_tail = unterminated;
                self.progress.complete = true;
                None
            }
            Ok(ScanEnd::Stopped) => None,
            Err(_) => Some(KvError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "transaction log reader panicked",
            ))),
        }
    }
}

impl Iterator for Replay<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        let received = self.events.as_ref()?.recv();
        match received {
            Ok(Ok(event)) => {
                self.progress.last_sequence = event.sequence;
                Some(Ok(event))
            }
            Ok(Err(e)) => {
                self.finish();
                Some(Err(e))
            }
            Err(_) => self.finish().map(Err),
        }
    }
}

impl Drop for Replay<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Background scan over the whole file
fn scan(path: PathBuf, out: Sender<Result<Event>>) -> ScanEnd {
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(source) => {
            let _ = out.send(Err(KvError::LogOpen { path, source }));
            return ScanEnd::Stopped;
        }
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    let mut last_sequence = 0u64;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return ScanEnd::Eof { unterminated: false },
            Ok(_) => {}
            Err(e) => {
                let _ = out.send(Err(KvError::Io(e)));
                return ScanEnd::Stopped;
            }
        }
        line_no += 1;

        let terminated = buf.last() == Some(&b'\n');
        if terminated {
            buf.pop();
        }

        let parsed = std::str::from_utf8(&buf)
            .map_err(|_| KvError::corruption(line_no, "line is not valid UTF-8"))
            .and_then(|line| Event::decode(line, line_no))
            .and_then(|event| {
                if event.sequence <= last_sequence {
                    Err(KvError::corruption(
                        line_no,
                        format!(
                            "transaction number out of sequence: {} after {}",
                            event.sequence, last_sequence
                        ),
                    ))
                } else {
                    Ok(event)
                }
            });

        match parsed {
            Ok(event) => {
                last_sequence = event.sequence;
                if out.send(Ok(event)).is_err() {
                    // Consumer dropped the replay.
                    return ScanEnd::Stopped;
                }
                if !terminated {
                    return ScanEnd::Eof { unterminated: true };
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "transaction log replay failed");
                let _ = out.send(Err(e));
                return ScanEnd::Stopped;
            }
        }
    }
}

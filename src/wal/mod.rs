//! Transaction Log Module
//!
//! Provides durability through an append-only text log of store mutations.
//!
//! ## Responsibilities
//! - Queue mutations and append them on a background writer
//! - Assign strictly increasing sequence numbers at append time
//! - Replay the log, rejecting out-of-order or malformed records
//!
//! ## File Format
//! One record per line, four tab-separated fields:
//! ```text
//! ┌──────────┬──────────┬───────────┬─────────────┐
//! │ sequence │ kind     │ key       │ value       │
//! │ (u64)    │ 1=Delete │ (percent- │ (percent-   │
//! │          │ 2=Put    │  encoded) │  encoded)   │
//! └──────────┴──────────┴───────────┴─────────────┘
//! ```
//! Example:
//! ```text
//! 1	2	a	1
//! 2	2	greeting	hello%20world
//! 3	1	a	
//! ```

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{Event, EventKind, Operation};
pub use reader::Replay;
pub use recovery::{ReplaySummary, TransactionLog};
pub use writer::{LogSink, LogWriter};

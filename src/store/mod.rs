//! Store Module
//!
//! The in-memory system of record for reads.
//!
//! ## Responsibilities
//! - Map string keys to string values
//! - Readers-writer discipline over the whole map
//! - Serve both live traffic and log replay through the same operations
//!
//! ## Data Structure Choice
//! A `HashMap` behind one `parking_lot::RwLock`:
//! - No ordering requirement on keys
//! - Operations are short, so a single whole-map lock is enough
//! - Reads proceed concurrently, writes are exclusive

mod table;

pub use table::Store;

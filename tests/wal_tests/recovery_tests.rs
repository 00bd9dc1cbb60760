//! Tests for the transaction log lifecycle
//!
//! These tests verify:
//! - Open creates the log and reports open failures
//! - The writer continues numbering after the replayed tail
//! - Records written by one process instance replay in the next
//! - A torn final line is terminated before new records are appended

use std::fs;
use std::path::PathBuf;

use logkv::config::{Config, SyncStrategy};
use logkv::wal::{Event, TransactionLog};
use logkv::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("transaction.log");
    (temp_dir, log_path)
}

fn test_config() -> Config {
    Config::builder()
        .sync_strategy(SyncStrategy::EveryWrite)
        .build()
}

/// Open, drain replay, and start the writer, as one process start would
fn replay_and_run(path: &PathBuf) -> (Vec<Event>, logkv::wal::LogWriter) {
    let mut log = TransactionLog::open(path).unwrap();
    let events: Vec<Event> = log.read_events().map(|e| e.unwrap()).collect();
    let writer = log.run(&test_config()).unwrap();
    (events, writer)
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, log_path) = setup_temp_log();

    let log = TransactionLog::open(&log_path).unwrap();

    assert!(log_path.exists());
    assert_eq!(log.path(), log_path.as_path());
    assert_eq!(log.last_sequence(), 0);
}

#[test]
fn test_open_failure() {
    let (temp, _) = setup_temp_log();

    // A directory cannot be opened as the log
    let result = TransactionLog::open(temp.path());

    assert!(matches!(result, Err(KvError::LogOpen { .. })));
}

// =============================================================================
// Restart Tests
// =============================================================================

#[test]
fn test_fresh_log_starts_at_one() {
    let (_temp, log_path) = setup_temp_log();

    let (events, writer) = replay_and_run(&log_path);
    assert!(events.is_empty());

    writer.write_put("a", "1").unwrap();
    writer.close().unwrap();

    assert_eq!(fs::read_to_string(&log_path).unwrap(), "1\t2\ta\t1\n");
}

#[test]
fn test_writer_continues_after_replayed_tail() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, "1\t2\ta\t1\n7\t2\tb\t2\n").unwrap();

    let (events, writer) = replay_and_run(&log_path);
    assert_eq!(events.len(), 2);

    writer.write_delete("a").unwrap();
    writer.close().unwrap();

    let contents = fs::read_to_string(&log_path).unwrap();
    assert_eq!(contents, "1\t2\ta\t1\n7\t2\tb\t2\n8\t1\ta\t\n");
}

#[test]
fn test_records_survive_restart() {
    let (_temp, log_path) = setup_temp_log();

    {
        let (_, writer) = replay_and_run(&log_path);
        writer.write_put("a", "1").unwrap();
        writer.write_put("b", "x\ty\nz").unwrap();
        writer.close().unwrap();
    }
    {
        let (events, writer) = replay_and_run(&log_path);
        assert_eq!(events.len(), 2);
        writer.write_delete("a").unwrap();
        writer.close().unwrap();
    }

    let (events, writer) = replay_and_run(&log_path);
    writer.close().unwrap();

    assert_eq!(
        events,
        vec![
            Event::put(1, "a", "1"),
            Event::put(2, "b", "x\ty\nz"),
            Event::delete(3, "a"),
        ]
    );
}

#[test]
fn test_unterminated_tail_is_terminated_before_append() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, "1\t2\ta\t1").unwrap();

    let (events, writer) = replay_and_run(&log_path);
    assert_eq!(events, vec![Event::put(1, "a", "1")]);

    writer.write_put("b", "2").unwrap();
    writer.write_put("c", "3").unwrap();
    writer.close().unwrap();

    let contents = fs::read_to_string(&log_path).unwrap();
    assert_eq!(contents, "1\t2\ta\t1\n2\t2\tb\t2\n3\t2\tc\t3\n");
}

#[test]
fn test_run_without_replay_continues_sequence() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, "1\t2\ta\t1\n").unwrap();

    let writer = TransactionLog::open(&log_path)
        .unwrap()
        .run(&test_config())
        .unwrap();
    writer.write_put("b", "2").unwrap();
    writer.close().unwrap();

    assert_eq!(
        fs::read_to_string(&log_path).unwrap(),
        "1\t2\ta\t1\n2\t2\tb\t2\n"
    );
    let (events, writer) = replay_and_run(&log_path);
    writer.close().unwrap();
    assert_eq!(events.len(), 2);
}

#[test]
fn test_run_after_partial_replay_continues_sequence() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, "1\t2\ta\t1\n2\t2\tb\t2\n3\t2\tc\t3\n").unwrap();

    let mut log = TransactionLog::open(&log_path).unwrap();
    {
        let mut replay = log.read_events();
        assert_eq!(replay.next().unwrap().unwrap().sequence, 1);
    }
    let writer = log.run(&test_config()).unwrap();
    writer.write_delete("a").unwrap();
    writer.close().unwrap();

    let contents = fs::read_to_string(&log_path).unwrap();
    assert!(contents.ends_with("3\t2\tc\t3\n4\t1\ta\t\n"));
}

#[test]
fn test_run_without_replay_rejects_corrupt_log() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, "2\t2\ta\t1\n1\t2\tb\t2\n").unwrap();

    let result = TransactionLog::open(&log_path).unwrap().run(&test_config());

    assert!(matches!(result, Err(KvError::LogCorruption { line: 2, .. })));
    assert_eq!(
        fs::read_to_string(&log_path).unwrap(),
        "2\t2\ta\t1\n1\t2\tb\t2\n"
    );
}

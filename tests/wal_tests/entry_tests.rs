//! Tests for transaction log record encoding and decoding
//!
//! These tests verify:
//! - The tab-separated line layout and kind codes
//! - Percent-encoding of fields containing delimiters
//! - Rejection of malformed records

use logkv::wal::{Event, EventKind, Operation};
use logkv::KvError;

fn corruption_line(err: KvError) -> usize {
    match err {
        KvError::LogCorruption { line, .. } => line,
        other => panic!("expected corruption error, got {:?}", other),
    }
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_put() {
    let event = Event::put(1, "a", "1");
    assert_eq!(event.encode(), "1\t2\ta\t1\n");
}

#[test]
fn test_encode_delete_has_empty_value() {
    let event = Event::delete(7, "a");
    assert_eq!(event.encode(), "7\t1\ta\t\n");
}

#[test]
fn test_encode_escapes_delimiters() {
    let event = Event::put(3, "k", "line1\nline2\tend");
    assert_eq!(event.encode(), "3\t2\tk\tline1%0Aline2%09end\n");
}

#[test]
fn test_encode_escapes_percent() {
    let event = Event::put(1, "k", "100%");
    assert_eq!(event.encode(), "1\t2\tk\t100%25\n");
}

#[test]
fn test_kind_codes() {
    assert_eq!(EventKind::Delete.code(), 1);
    assert_eq!(EventKind::Put.code(), 2);
    assert_eq!(EventKind::from_code(2), Some(EventKind::Put));
    assert_eq!(EventKind::from_code(0), None);
    assert_eq!(EventKind::from_code(3), None);
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_put() {
    let event = Event::decode("12\t2\tgreeting\thello%20world", 1).unwrap();

    assert_eq!(event.sequence, 12);
    assert_eq!(event.kind(), EventKind::Put);
    assert_eq!(event.key(), "greeting");
    assert_eq!(event.value(), Some("hello world"));
}

#[test]
fn test_decode_delete() {
    let event = Event::decode("5\t1\tgone\t", 1).unwrap();

    assert_eq!(
        event.operation,
        Operation::Delete {
            key: "gone".to_string()
        }
    );
    assert_eq!(event.value(), None);
}

#[test]
fn test_decode_missing_value_field() {
    let event = Event::decode("5\t2\tkey", 1).unwrap();
    assert_eq!(event.value(), Some(""));
}

#[test]
fn test_delimiters_survive_encoding() {
    let original = Event::put(9, "tab\tkey", "a\tb\nc\r\nd % e");
    let line = original.encode();

    assert_eq!(line.matches('\t').count(), 3);
    assert_eq!(line.matches('\n').count(), 1);

    let decoded = Event::decode(line.trim_end_matches('\n'), 1).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_decode_unicode() {
    let original = Event::put(1, "ключ", "значение ✓");
    let decoded = Event::decode(original.encode().trim_end_matches('\n'), 1).unwrap();
    assert_eq!(decoded, original);
}

// =============================================================================
// Malformed Record Tests
// =============================================================================

#[test]
fn test_decode_rejects_bad_sequence() {
    let err = Event::decode("x\t2\tk\tv", 4).unwrap_err();
    assert_eq!(corruption_line(err), 4);
}

#[test]
fn test_decode_rejects_unknown_kind() {
    assert!(matches!(
        Event::decode("1\t3\tk\tv", 1),
        Err(KvError::LogCorruption { .. })
    ));
    assert!(matches!(
        Event::decode("1\t0\tk\tv", 1),
        Err(KvError::LogCorruption { .. })
    ));
}

#[test]
fn test_decode_rejects_too_few_fields() {
    assert!(Event::decode("1\t2", 1).is_err());
    assert!(Event::decode("", 1).is_err());
}

#[test]
fn test_decode_rejects_extra_fields() {
    assert!(Event::decode("1\t2\tk\tv\textra", 1).is_err());
}

#[test]
fn test_decode_rejects_empty_key() {
    assert!(Event::decode("1\t2\t\tv", 1).is_err());
}

#[test]
fn test_decode_rejects_bad_escape() {
    let err = Event::decode("1\t2\tk\t50%zz", 2).unwrap_err();
    assert_eq!(corruption_line(err), 2);
}

#[test]
fn test_decode_rejects_non_utf8_escape() {
    assert!(Event::decode("1\t2\tk\t%FF%FE", 1).is_err());
}

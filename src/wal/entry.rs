//! Transaction log event definitions
//!
//! Defines the structure of individual log records and their line format.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{KvError, Result};

/// Bytes left unescaped in key/value fields: RFC 3986 unreserved characters.
/// Everything else, including the tab and newline delimiters, is escaped.
const FIELD_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Numeric kind stored in the second field of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    Delete = 1,
    Put = 2,
}

impl EventKind {
    /// Wire code for this kind
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a wire code, `None` for anything but 1 or 2
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(EventKind::Delete),
            2 => Some(EventKind::Put),
            _ => None,
        }
    }
}

/// A mutation submitted to the writer, before it has a sequence number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: String, value: String },

    /// Delete a key
    Delete { key: String },
}

impl Operation {
    pub fn kind(&self) -> EventKind {
        match self {
            Operation::Put { .. } => EventKind::Put,
            Operation::Delete { .. } => EventKind::Delete,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Operation::Put { key, .. } | Operation::Delete { key } => key,
        }
    }

    /// Value payload, only present for puts
    pub fn value(&self) -> Option<&str> {
        match self {
            Operation::Put { value, .. } => Some(value),
            Operation::Delete { .. } => None,
        }
    }
}

/// One durable record of a store mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Sequence number, strictly increasing within one log file
    pub sequence: u64,

    /// The mutation
    pub operation: Operation,
}

impl Event {
    pub fn new(sequence: u64, operation: Operation) -> Self {
        Self {
            sequence,
            operation,
        }
    }

    pub fn put(sequence: u64, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            sequence,
            Operation::Put {
                key: key.into(),
                value: value.into(),
            },
        )
    }

    pub fn delete(sequence: u64, key: impl Into<String>) -> Self {
        Self::new(sequence, Operation::Delete { key: key.into() })
    }

    pub fn kind(&self) -> EventKind {
        self.operation.kind()
    }

    pub fn key(&self) -> &str {
        self.operation.key()
    }

    pub fn value(&self) -> Option<&str> {
        self.operation.value()
    }

    /// Serialize to a newline-terminated `sequence\tkind\tkey\tvalue` record.
    /// Key and value are percent-encoded; deletes carry an empty value field.
    pub fn encode(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\n",
            self.sequence,
            self.kind().code(),
            utf8_percent_encode(self.key(), FIELD_ENCODE_SET),
            utf8_percent_encode(self.value().unwrap_or(""), FIELD_ENCODE_SET),
        )
    }

    /// Parse one record (without its trailing newline).
    ///
    /// `line_no` is 1-based and only used to annotate errors. A missing
    /// fourth field reads as an empty value.
    pub fn decode(line: &str, line_no: usize) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 || fields.len() > 4 {
            return Err(KvError::corruption(
                line_no,
                format!("expected 4 tab-separated fields, found {}", fields.len()),
            ));
        }

        let sequence: u64 = fields[0].parse().map_err(|_| {
            KvError::corruption(line_no, format!("invalid sequence number {:?}", fields[0]))
        })?;

        let kind = fields[1]
            .parse::<u8>()
            .ok()
            .and_then(EventKind::from_code)
            .ok_or_else(|| {
                KvError::corruption(line_no, format!("invalid event kind {:?}", fields[1]))
            })?;

        let key = decode_field(fields[2], line_no)?;
        if key.is_empty() {
            return Err(KvError::corruption(line_no, "empty key"));
        }

        let operation = match kind {
            EventKind::Put => {
                let value = match fields.get(3) {
                    Some(raw) => decode_field(raw, line_no)?,
                    None => String::new(),
                };
                Operation::Put { key, value }
            }
            EventKind::Delete => Operation::Delete { key },
        };

        Ok(Self::new(sequence, operation))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation {
            Operation::Put { key, .. } => write!(f, "#{} PUT {}", self.sequence, key),
            Operation::Delete { key } => write!(f, "#{} DELETE {}", self.sequence, key),
        }
    }
}

/// Percent-decode one field, rejecting malformed escapes and non-UTF-8 output
fn decode_field(raw: &str, line_no: usize) -> Result<String> {
    // percent_decode_str passes malformed escapes through unchanged.
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(KvError::corruption(
                    line_no,
                    format!("malformed percent-escape at byte {}", i),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| KvError::corruption(line_no, format!("value decoding error: {}", e)))
}

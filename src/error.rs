//! Error types for building and reading dictionaries.
//!
//! Build-time failures ([`ValidationError`], [`CapacityError`]) abort a single
//! encode and carry enough context to locate the offending entry. Query-time
//! failures ([`FormatError`]) mean the buffer is not a well-formed dictionary;
//! callers typically treat them as "dictionary unavailable".

use std::io;
use thiserror::Error;

/// An entry that cannot be represented in the binary format.
///
/// `index` is the entry's position in the encoder's input order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("entry {index}: reading is empty")]
    EmptyReading { index: usize },

    #[error("entry {index} ({reading:?}): no candidates")]
    NoCandidates { index: usize, reading: String },

    #[error("entry {index} ({reading:?}): reading contains reserved byte 0x{byte:02x}")]
    ReservedByteInReading {
        index: usize,
        reading: String,
        byte: u8,
    },

    #[error(
        "entry {index} ({reading:?}): candidate {candidate:?} contains reserved byte 0x{byte:02x}"
    )]
    ReservedByteInCandidate {
        index: usize,
        reading: String,
        candidate: String,
        byte: u8,
    },
}

/// The dictionary does not fit the format's 32-bit fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("too many entries: {count} (max {max})")]
    TooManyEntries { count: usize, max: usize },

    #[error("record offset {offset} exceeds data limit {limit}")]
    DataTooLarge { offset: u64, limit: u64 },
}

/// Any failure while building a dictionary.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The buffer handed to the lookup engine is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("buffer too short for header: {len} bytes")]
    TooShort { len: usize },

    #[error("bad index offset: expected 12, found {found}")]
    BadIndexOffset { found: u32 },

    #[error("bad data offset: expected {expected}, found {found}")]
    BadDataOffset { expected: u64, found: u32 },

    #[error("data offset {data_offset} beyond buffer end ({len} bytes)")]
    DataOutOfBounds { data_offset: usize, len: usize },

    #[error("slot {slot} out of range ({len} entries)")]
    SlotOutOfRange { slot: usize, len: usize },

    #[error("slot {slot}: record offset {offset} outside data region ({data_len} bytes)")]
    OffsetOutOfRange {
        slot: usize,
        offset: u32,
        data_len: usize,
    },

    #[error("slot {slot}: record is not terminated")]
    Unterminated { slot: usize },

    #[error("slot {slot}: record has no candidates")]
    MissingCandidates { slot: usize },

    #[error("slot {slot}: record is not valid UTF-8")]
    InvalidUtf8 { slot: usize },

    #[error("slot {slot}: reading sorts before the previous slot")]
    Unsorted { slot: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_entry() {
        let err = ValidationError::ReservedByteInCandidate {
            index: 3,
            reading: "かな".into(),
            candidate: "a,b".into(),
            byte: b',',
        };
        let msg = err.to_string();
        assert!(msg.contains("entry 3"));
        assert!(msg.contains("かな"));
        assert!(msg.contains("0x2c"));
    }

    #[test]
    fn test_build_error_is_transparent() {
        let err: BuildError = CapacityError::TooManyEntries { count: 10, max: 5 }.into();
        assert_eq!(err.to_string(), "too many entries: 10 (max 5)");
    }
}

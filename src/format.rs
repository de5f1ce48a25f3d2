//! The on-disk layout shared by the encoder and the lookup engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ HEADER (12 bytes, little-endian)                         │
//! │   entry_count:  u32  (N)                                 │
//! │   index_offset: u32  (always 12)                         │
//! │   data_offset:  u32  (12 + 4 * N)                        │
//! ├──────────────────────────────────────────────────────────┤
//! │ INDEX (4 * N bytes)                                      │
//! │   record_offset: u32 × N  (relative to data_offset,      │
//! │                            ascending by reading)         │
//! ├──────────────────────────────────────────────────────────┤
//! │ DATA                                                     │
//! │   per entry, in index order:                             │
//! │     reading , candidate1 , candidate2 , ... \0           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Neither `,` nor `\0` may appear inside a reading or a candidate.

use std::cmp::Ordering;

use crate::error::FormatError;

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 12;

/// Value of the `index_offset` header field.
pub const INDEX_OFFSET: u32 = HEADER_LEN as u32;

/// Width of one index slot in bytes.
pub const SLOT_LEN: usize = 4;

/// Separates the reading and each candidate inside a record.
pub const FIELD_SEPARATOR: u8 = b',';

/// Ends every record.
pub const RECORD_TERMINATOR: u8 = 0;

/// Largest entry count whose `data_offset` still fits in a `u32`.
pub const MAX_ENTRIES: usize = (u32::MAX as usize - HEADER_LEN) / SLOT_LEN;

/// Returns `true` for bytes that may not appear inside a field.
#[inline]
pub fn is_reserved(byte: u8) -> bool {
    byte == FIELD_SEPARATOR || byte == RECORD_TERMINATOR
}

/// The single ordering used to sort entries and to binary-search them.
///
/// Byte-wise comparison of UTF-8 readings. This equals code-point order, so
/// it agrees with `str::cmp`, but lookups only ever see raw bytes.
#[inline]
pub fn compare_readings(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// The decoded fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub entry_count: u32,
    pub index_offset: u32,
    pub data_offset: u32,
}

impl Header {
    /// Header for a dictionary of `entry_count` entries, or `None` when the
    /// data offset would not fit in a `u32` (more than [`MAX_ENTRIES`]).
    pub fn for_count(entry_count: u32) -> Option<Self> {
        let data_offset = entry_count
            .checked_mul(SLOT_LEN as u32)?
            .checked_add(INDEX_OFFSET)?;
        Some(Self {
            entry_count,
            index_offset: INDEX_OFFSET,
            data_offset,
        })
    }

    /// Appends the header's 12 bytes to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.entry_count.to_le_bytes());
        out.extend_from_slice(&self.index_offset.to_le_bytes());
        out.extend_from_slice(&self.data_offset.to_le_bytes());
    }

    /// Reads the raw header fields without checking their consistency.
    pub fn read(bytes: &[u8]) -> Result<Self, FormatError> {
        let too_short = || FormatError::TooShort { len: bytes.len() };
        Ok(Self {
            entry_count: read_u32_le(bytes, 0).ok_or_else(too_short)?,
            index_offset: read_u32_le(bytes, 4).ok_or_else(too_short)?,
            data_offset: read_u32_le(bytes, 8).ok_or_else(too_short)?,
        })
    }

    /// Checks the invariants that make the index and data regions addressable
    /// inside a buffer of `len` bytes.
    pub fn validate(&self, len: usize) -> Result<(), FormatError> {
        if self.index_offset != INDEX_OFFSET {
            return Err(FormatError::BadIndexOffset {
                found: self.index_offset,
            });
        }
        let expected = HEADER_LEN as u64 + SLOT_LEN as u64 * self.entry_count as u64;
        if self.data_offset as u64 != expected {
            return Err(FormatError::BadDataOffset {
                expected,
                found: self.data_offset,
            });
        }
        let data_offset = self.data_offset as usize;
        if data_offset > len {
            return Err(FormatError::DataOutOfBounds { data_offset, len });
        }
        Ok(())
    }
}

/// Reads a little-endian `u32` at `pos`, or `None` if fewer than four bytes
/// remain.
#[inline]
pub fn read_u32_le(bytes: &[u8], pos: usize) -> Option<u32> {
    let end = pos.checked_add(4)?;
    let raw: [u8; 4] = bytes.get(pos..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

/// The reading prefix of a record: bytes up to the first `,` or `\0`.
///
/// Returns `None` if neither byte occurs before the end of `record`.
#[inline]
pub fn reading_key(record: &[u8]) -> Option<&[u8]> {
    let end = record.iter().position(|&b| is_reserved(b))?;
    Some(&record[..end])
}

/// A whole record body, excluding its `\0` terminator.
#[inline]
pub fn record_body(record: &[u8]) -> Option<&[u8]> {
    let end = record.iter().position(|&b| b == RECORD_TERMINATOR)?;
    Some(&record[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_write_read() {
        let header = Header::for_count(3).unwrap();
        let mut buf = Vec::new();
        header.write(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);
        assert_eq!(&buf[..4], &[3, 0, 0, 0]);
        assert_eq!(&buf[4..8], &[12, 0, 0, 0]);
        assert_eq!(&buf[8..12], &[24, 0, 0, 0]);
        assert_eq!(Header::read(&buf).unwrap(), header);
    }

    #[test]
    fn test_header_validate() {
        assert!(Header::for_count(2).unwrap().validate(20).is_ok());
        assert_eq!(
            Header::for_count(2).unwrap().validate(19),
            Err(FormatError::DataOutOfBounds {
                data_offset: 20,
                len: 19
            })
        );

        let mut bad = Header::for_count(1).unwrap();
        bad.index_offset = 16;
        assert_eq!(bad.validate(100), Err(FormatError::BadIndexOffset { found: 16 }));

        let mut bad = Header::for_count(1).unwrap();
        bad.data_offset = 12;
        assert_eq!(
            bad.validate(100),
            Err(FormatError::BadDataOffset {
                expected: 16,
                found: 12
            })
        );
    }

    #[test]
    fn test_header_validate_huge_count_no_overflow() {
        let header = Header {
            entry_count: u32::MAX,
            index_offset: INDEX_OFFSET,
            data_offset: 12,
        };
        assert!(matches!(
            header.validate(64),
            Err(FormatError::BadDataOffset { .. })
        ));
    }

    #[test]
    fn test_header_for_count_limit() {
        let max = MAX_ENTRIES as u32;
        assert_eq!(Header::for_count(max).unwrap().data_offset, 12 + 4 * max);
        assert_eq!(Header::for_count(max + 1), None);
        assert_eq!(Header::for_count(u32::MAX), None);
    }

    #[test]
    fn test_header_read_too_short() {
        assert_eq!(
            Header::read(&[0; 11]),
            Err(FormatError::TooShort { len: 11 })
        );
    }

    #[test]
    fn test_read_u32_le_bounds() {
        let bytes = [1, 0, 0, 0, 2];
        assert_eq!(read_u32_le(&bytes, 0), Some(1));
        assert_eq!(read_u32_le(&bytes, 1), Some(0x0200_0000));
        assert_eq!(read_u32_le(&bytes, 2), None);
        assert_eq!(read_u32_le(&bytes, usize::MAX), None);
    }

    #[test]
    fn test_reading_key() {
        assert_eq!(reading_key(b"abc,x\0"), Some(&b"abc"[..]));
        assert_eq!(reading_key(b"abc\0"), Some(&b"abc"[..]));
        assert_eq!(reading_key(b"abc"), None);
        assert_eq!(record_body(b"a,b,c\0rest"), Some(&b"a,b,c"[..]));
        assert_eq!(record_body(b"a,b"), None);
    }

    #[test]
    fn test_compare_readings_is_byte_order() {
        let words = ["", "a", "ab", "b", "あ", "あい", "あう", "い", "亜", "\u{10000}"];
        for a in words {
            for b in words {
                assert_eq!(
                    compare_readings(a.as_bytes(), b.as_bytes()),
                    a.cmp(b),
                    "{a:?} vs {b:?}"
                );
            }
        }
        // A proper prefix always sorts first, which keeps the `,`-terminated
        // key consistent with whole-reading order.
        assert_eq!(compare_readings(b"ab", b"ab,"), Ordering::Less);
    }
}

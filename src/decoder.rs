use std::cmp::Ordering;
use std::ops::Range;

use crate::encoder::Entry;
use crate::error::FormatError;
use crate::format::{
    self, compare_readings, Header, FIELD_SEPARATOR, HEADER_LEN, SLOT_LEN,
};

/// A read-only view over a serialized dictionary.
///
/// Construction checks the header once; every later access derives its byte
/// ranges from stored offsets and bounds-checks them, so a corrupted or
/// hostile buffer yields [`FormatError`] rather than a panic.
///
/// The view only borrows the buffer and holds no scratch state, so it can be
/// copied freely and shared across threads.
///
/// # Example
/// ```
/// use yomi_dict::{encode, Dictionary, Entry};
///
/// let buffer = encode(&[
///     Entry::new("あい", ["愛"]),
///     Entry::new("あい", ["相"]),
///     Entry::new("あう", ["会う"]),
/// ])
/// .unwrap();
///
/// let dict = Dictionary::new(buffer.as_bytes()).unwrap();
/// assert_eq!(dict.candidates("あい").unwrap(), vec!["愛", "相"]);
/// assert!(dict.lookup("かな").unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Dictionary<'a> {
    index: &'a [u8],
    data: &'a [u8],
    len: usize,
}

impl<'a> Dictionary<'a> {
    /// Parses and checks the header of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Result<Self, FormatError> {
        let header = Header::read(bytes)?;
        header.validate(bytes.len())?;
        let (head, data) = bytes.split_at(header.data_offset as usize);
        Ok(Self {
            index: &head[HEADER_LEN..],
            data,
            len: header.entry_count as usize,
        })
    }

    /// Number of entries (index slots).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns every entry whose reading equals `reading`, in slot order.
    ///
    /// An unknown reading yields an empty `Vec`.
    pub fn lookup(&self, reading: &str) -> Result<Vec<Record<'a>>, FormatError> {
        self.lookup_slots(reading)?
            .map(|slot| self.record(slot))
            .collect()
    }

    /// Returns the candidates of every entry matching `reading`, flattened in
    /// slot order.
    pub fn candidates(&self, reading: &str) -> Result<Vec<&'a str>, FormatError> {
        let mut out = Vec::new();
        for slot in self.lookup_slots(reading)? {
            out.extend(self.record(slot)?.candidates());
        }
        Ok(out)
    }

    /// Returns the range of slots whose reading equals `reading`.
    ///
    /// Does not allocate. The range is empty when nothing matches.
    pub fn lookup_slots(&self, reading: &str) -> Result<Range<usize>, FormatError> {
        let query = reading.as_bytes();
        let Some(hit) = self.find_any(query)? else {
            return Ok(0..0);
        };

        // Duplicates sit next to each other; walk out from the hit.
        let mut start = hit;
        while start > 0 && self.key(start - 1)? == query {
            start -= 1;
        }
        let mut end = hit + 1;
        while end < self.len && self.key(end)? == query {
            end += 1;
        }
        Ok(start..end)
    }

    /// Decodes the record stored in `slot`.
    ///
    /// # Panics
    /// Never; a `slot` past the end is reported as `SlotOutOfRange`.
    pub fn record(&self, slot: usize) -> Result<Record<'a>, FormatError> {
        let raw = self.raw_record(slot)?;
        let body = format::record_body(raw).ok_or(FormatError::Unterminated { slot })?;
        let body = std::str::from_utf8(body).map_err(|_| FormatError::InvalidUtf8 { slot })?;
        let (reading, candidates) = body
            .split_once(FIELD_SEPARATOR as char)
            .ok_or(FormatError::MissingCandidates { slot })?;
        Ok(Record {
            slot,
            reading,
            candidates,
        })
    }

    /// Iterates over every record in slot order.
    pub fn iter(&self) -> Records<'a> {
        Records {
            dict: *self,
            next: 0,
            done: false,
        }
    }

    /// Decodes every record and checks that readings are in sorted order.
    ///
    /// Lookups never need this, but running it once on a buffer from an
    /// untrusted source guarantees later lookups cannot miss entries or fail.
    pub fn verify(&self) -> Result<(), FormatError> {
        let mut prev: Option<&[u8]> = None;
        for record in self.iter() {
            let record = record?;
            let key = record.reading.as_bytes();
            if let Some(prev) = prev {
                if compare_readings(prev, key) == Ordering::Greater {
                    return Err(FormatError::Unsorted { slot: record.slot });
                }
            }
            prev = Some(key);
        }
        Ok(())
    }

    // ── internal helpers ───────────────────────────────────────────────

    /// Binary search for any slot whose key equals `query`.
    fn find_any(&self, query: &[u8]) -> Result<Option<usize>, FormatError> {
        let mut lo = 0;
        let mut hi = self.len;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match compare_readings(self.key(mid)?, query) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Ok(Some(mid)),
            }
        }
        Ok(None)
    }

    /// Data-relative offset stored in `slot`.
    #[inline]
    fn offset(&self, slot: usize) -> Result<u32, FormatError> {
        let out_of_range = FormatError::SlotOutOfRange {
            slot,
            len: self.len,
        };
        if slot >= self.len {
            return Err(out_of_range);
        }
        format::read_u32_le(self.index, slot * SLOT_LEN).ok_or(out_of_range)
    }

    /// Bytes from the start of `slot`'s record to the end of the data region.
    #[inline]
    fn raw_record(&self, slot: usize) -> Result<&'a [u8], FormatError> {
        let offset = self.offset(slot)?;
        match self.data.get(offset as usize..) {
            Some(raw) if !raw.is_empty() => Ok(raw),
            _ => Err(FormatError::OffsetOutOfRange {
                slot,
                offset,
                data_len: self.data.len(),
            }),
        }
    }

    /// Reading bytes of `slot`, read without decoding the rest of the record.
    #[inline]
    fn key(&self, slot: usize) -> Result<&'a [u8], FormatError> {
        format::reading_key(self.raw_record(slot)?).ok_or(FormatError::Unterminated { slot })
    }
}

impl<'a> IntoIterator for &Dictionary<'a> {
    type Item = Result<Record<'a>, FormatError>;
    type IntoIter = Records<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One decoded record, borrowing from the dictionary buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    slot: usize,
    reading: &'a str,
    /// Candidate fields, still joined by `,`.
    candidates: &'a str,
}

impl<'a> Record<'a> {
    /// Index slot this record was read from.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn reading(&self) -> &'a str {
        self.reading
    }

    /// Candidates in stored (preference) order.
    pub fn candidates(&self) -> Candidates<'a> {
        Candidates {
            inner: self.candidates.split(FIELD_SEPARATOR as char),
        }
    }

    /// Number of candidates. Always at least one.
    pub fn candidate_count(&self) -> usize {
        self.candidates.bytes().filter(|&b| b == FIELD_SEPARATOR).count() + 1
    }

    /// The `n`th candidate, if present.
    pub fn candidate(&self, n: usize) -> Option<&'a str> {
        self.candidates().nth(n)
    }

    /// Copies the record into an owned [`Entry`].
    pub fn to_entry(&self) -> Entry {
        Entry::new(self.reading, self.candidates())
    }
}

/// Iterator over a record's candidates.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    inner: std::str::Split<'a, char>,
}

impl<'a> Iterator for Candidates<'a> {
    type Item = &'a str;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl DoubleEndedIterator for Candidates<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

/// A lazy iterator over every record of a [`Dictionary`].
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    dict: Dictionary<'a>,
    next: usize,
    done: bool,
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next >= self.dict.len {
            return None;
        }
        let result = self.dict.record(self.next);
        self.next += 1;
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(self.dict.len - self.next))
        }
    }
}

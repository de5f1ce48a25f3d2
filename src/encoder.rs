use std::io::Write;

use crate::error::{BuildError, CapacityError, ValidationError};
use crate::format::{
    self, compare_readings, Header, FIELD_SEPARATOR, MAX_ENTRIES, RECORD_TERMINATOR,
};

/// One dictionary entry: a reading and its candidates in preference order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub reading: String,
    pub candidates: Vec<String>,
}

impl Entry {
    /// Creates a new `Entry`.
    pub fn new<R, I, C>(reading: R, candidates: I) -> Self
    where
        R: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            reading: reading.into(),
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    /// Checks that the entry can be stored without corrupting the format.
    ///
    /// `index` is only used to label the error.
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if self.reading.is_empty() {
            return Err(ValidationError::EmptyReading { index });
        }
        if let Some(&byte) = self.reading.as_bytes().iter().find(|&&b| format::is_reserved(b)) {
            return Err(ValidationError::ReservedByteInReading {
                index,
                reading: self.reading.clone(),
                byte,
            });
        }
        if self.candidates.is_empty() {
            return Err(ValidationError::NoCandidates {
                index,
                reading: self.reading.clone(),
            });
        }
        for candidate in &self.candidates {
            if let Some(&byte) = candidate.as_bytes().iter().find(|&&b| format::is_reserved(b)) {
                return Err(ValidationError::ReservedByteInCandidate {
                    index,
                    reading: self.reading.clone(),
                    candidate: candidate.clone(),
                    byte,
                });
            }
        }
        Ok(())
    }

    /// Serialized length of this entry's record, terminator included.
    fn record_len(&self) -> usize {
        self.reading.len()
            + self.candidates.iter().map(|c| c.len() + 1).sum::<usize>()
            + 1
    }

    fn write_record(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.reading.as_bytes());
        for candidate in &self.candidates {
            out.push(FIELD_SEPARATOR);
            out.extend_from_slice(candidate.as_bytes());
        }
        out.push(RECORD_TERMINATOR);
    }
}

/// Builds a serialized dictionary from entries pushed in any order.
///
/// Entries are validated as they are pushed and sorted by reading when the
/// dictionary is finished. The sort is stable: entries that share a reading
/// keep their push order.
///
/// # Example
/// ```
/// use yomi_dict::{Encoder, Entry};
///
/// let mut encoder = Encoder::new();
/// encoder.push(Entry::new("あい", ["愛", "相"])).unwrap();
/// encoder.push(Entry::new("あう", ["会う"])).unwrap();
///
/// let dict = encoder.finish().unwrap();
/// assert_eq!(dict.entry_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Encoder {
    entries: Vec<Entry>,
    /// Largest record offset (relative to the data region) the output may use.
    max_record_offset: u64,
    /// Largest entry count the output may hold.
    max_entries: usize,
}

impl Encoder {
    /// Creates an encoder bounded only by the format's 32-bit offsets.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            max_record_offset: u32::MAX as u64,
            max_entries: MAX_ENTRIES,
        }
    }

    /// Creates an encoder whose records must all start at or below
    /// `max_record_offset` bytes into the data region. Values above
    /// `u32::MAX` are clamped. Exceeding the limit makes
    /// [`finish`](Self::finish) return `CapacityError::DataTooLarge`.
    pub fn with_limit(max_record_offset: u64) -> Self {
        Self {
            entries: Vec::new(),
            max_record_offset: max_record_offset.min(u32::MAX as u64),
            max_entries: MAX_ENTRIES,
        }
    }

    /// Caps the number of entries [`finish`](Self::finish) accepts. Values
    /// above [`MAX_ENTRIES`] are clamped. Exceeding the cap makes `finish`
    /// return `CapacityError::TooManyEntries`.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.min(MAX_ENTRIES);
        self
    }

    /// Validates and queues an entry.
    ///
    /// A rejected entry is not queued; the encoder stays usable.
    pub fn push(&mut self, entry: Entry) -> Result<(), ValidationError> {
        entry.validate(self.entries.len())?;
        self.entries.push(entry);
        Ok(())
    }

    /// Returns the number of entries queued so far.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Sorts the queued entries and serializes them.
    pub fn finish(mut self) -> Result<DictBuffer, CapacityError> {
        let count = self.entries.len();
        if count > self.max_entries {
            return Err(CapacityError::TooManyEntries {
                count,
                max: self.max_entries,
            });
        }

        self.entries
            .sort_by(|a, b| compare_readings(a.reading.as_bytes(), b.reading.as_bytes()));

        let data_len: usize = self.entries.iter().map(Entry::record_len).sum();
        let header = u32::try_from(count)
            .ok()
            .and_then(Header::for_count)
            .ok_or(CapacityError::TooManyEntries {
                count,
                max: MAX_ENTRIES,
            })?;
        let mut bytes = Vec::with_capacity(header.data_offset as usize + data_len);
        header.write(&mut bytes);

        // Offsets are known up front, so the index is written before the data
        // and the buffer never has to be patched.
        let mut offset = 0u64;
        for entry in &self.entries {
            if offset > self.max_record_offset {
                return Err(CapacityError::DataTooLarge {
                    offset,
                    limit: self.max_record_offset,
                });
            }
            bytes.extend_from_slice(&(offset as u32).to_le_bytes());
            offset += entry.record_len() as u64;
        }
        for entry in &self.entries {
            entry.write_record(&mut bytes);
        }

        tracing::debug!(
            entries = count,
            data_bytes = data_len,
            total_bytes = bytes.len(),
            "encoded dictionary"
        );

        Ok(DictBuffer {
            bytes,
            entry_count: count,
        })
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates, sorts and serializes `entries` in one call.
pub fn encode(entries: &[Entry]) -> Result<DictBuffer, BuildError> {
    let mut encoder = Encoder::new();
    for entry in entries {
        encoder.push(entry.clone())?;
    }
    Ok(encoder.finish()?)
}

/// A serialized dictionary, ready to be embedded or written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictBuffer {
    bytes: Vec<u8>,
    entry_count: usize,
}

impl DictBuffer {
    /// The serialized bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer and returns the raw byte vector.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of entries in the dictionary.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Total serialized size in bytes, header included.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` when the dictionary holds no entries (the header is still written).
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Writes the serialized bytes to `sink`.
    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<(), BuildError> {
        sink.write_all(&self.bytes)?;
        sink.flush()?;
        Ok(())
    }
}

impl AsRef<[u8]> for DictBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let dict = encode(&[Entry::new("b", ["B"]), Entry::new("a", ["A1", "A2"])]).unwrap();
        let mut expected = vec![
            2, 0, 0, 0, // entry count
            12, 0, 0, 0, // index offset
            20, 0, 0, 0, // data offset
            0, 0, 0, 0, // "a" at 0
            8, 0, 0, 0, // "b" at 8
        ];
        expected.extend_from_slice(b"a,A1,A2\0b,B\0");
        assert_eq!(dict.as_bytes(), &expected[..]);
        assert_eq!(dict.entry_count(), 2);
    }

    #[test]
    fn test_encode_empty() {
        let dict = Encoder::new().finish().unwrap();
        assert_eq!(dict.as_bytes(), &[0, 0, 0, 0, 12, 0, 0, 0, 12, 0, 0, 0]);
        assert!(dict.is_empty());
        assert_eq!(dict.byte_len(), 12);
    }

    #[test]
    fn test_sort_is_stable_for_duplicates() {
        let dict = encode(&[
            Entry::new("b", ["1"]),
            Entry::new("a", ["2"]),
            Entry::new("b", ["3"]),
            Entry::new("a", ["4"]),
        ])
        .unwrap();
        let data = &dict.as_bytes()[12 + 4 * 4..];
        assert_eq!(data, b"a,2\0a,4\0b,1\0b,3\0");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let entries = vec![
            Entry::new("かな", ["仮名", "金"]),
            Entry::new("あい", ["愛"]),
            Entry::new("かな", ["哉"]),
        ];
        assert_eq!(encode(&entries).unwrap(), encode(&entries).unwrap());
    }

    #[test]
    fn test_validate_rejects_reserved_bytes() {
        let err = Entry::new("a,b", ["x"]).validate(0).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ReservedByteInReading { byte: b',', .. }
        ));

        let err = Entry::new("a", ["x", "y\0"]).validate(7).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ReservedByteInCandidate {
                index: 7,
                reading: "a".into(),
                candidate: "y\0".into(),
                byte: 0,
            }
        );
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert_eq!(
            Entry::new("", ["x"]).validate(0),
            Err(ValidationError::EmptyReading { index: 0 })
        );
        assert_eq!(
            Entry::new("a", Vec::<String>::new()).validate(1),
            Err(ValidationError::NoCandidates {
                index: 1,
                reading: "a".into()
            })
        );
    }

    #[test]
    fn test_empty_candidate_is_allowed() {
        assert!(Entry::new("a", [""]).validate(0).is_ok());
    }

    #[test]
    fn test_push_reports_input_position() {
        let mut enc = Encoder::new();
        enc.push(Entry::new("a", ["x"])).unwrap();
        let err = enc.push(Entry::new("b", ["y,z"])).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ReservedByteInCandidate { index: 1, .. }
        ));
        // Rejected entries are not queued.
        assert_eq!(enc.count(), 1);
    }

    #[test]
    fn test_encode_fn_reports_validation() {
        let err = encode(&[Entry::new("", ["x"])]).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Validation(ValidationError::EmptyReading { index: 0 })
        ));
    }

    #[test]
    fn test_with_limit_exceeded() {
        // "a,x\0" is 4 bytes, so the second record starts at offset 4.
        let mut enc = Encoder::with_limit(3);
        enc.push(Entry::new("a", ["x"])).unwrap();
        enc.push(Entry::new("b", ["y"])).unwrap();
        assert_eq!(
            enc.finish(),
            Err(CapacityError::DataTooLarge {
                offset: 4,
                limit: 3
            })
        );
    }

    #[test]
    fn test_with_limit_exact_fit() {
        let mut enc = Encoder::with_limit(4);
        enc.push(Entry::new("a", ["x"])).unwrap();
        enc.push(Entry::new("b", ["y"])).unwrap();
        assert!(enc.finish().is_ok());
    }

    #[test]
    fn test_max_entries_exceeded() {
        let mut enc = Encoder::new().with_max_entries(2);
        for reading in ["a", "b", "c"] {
            enc.push(Entry::new(reading, ["x"])).unwrap();
        }
        assert_eq!(
            enc.finish(),
            Err(CapacityError::TooManyEntries { count: 3, max: 2 })
        );
    }

    #[test]
    fn test_max_entries_exact_fit() {
        let mut enc = Encoder::with_limit(64).with_max_entries(2);
        enc.push(Entry::new("a", ["x"])).unwrap();
        enc.push(Entry::new("b", ["y"])).unwrap();
        assert_eq!(enc.finish().unwrap().entry_count(), 2);
    }

    #[test]
    fn test_max_entries_clamped_to_format() {
        let mut enc = Encoder::new().with_max_entries(usize::MAX);
        enc.push(Entry::new("a", ["x"])).unwrap();
        assert!(enc.finish().is_ok());
    }

    #[test]
    fn test_write_to_sink() {
        let dict = encode(&[Entry::new("a", ["x"])]).unwrap();
        let mut out = Vec::new();
        dict.write_to(&mut out).unwrap();
        assert_eq!(out, dict.as_bytes());
    }
}

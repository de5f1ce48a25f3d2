//! # yomi-dict
//!
//! A compact binary dictionary mapping readings (yomi) to ordered candidate
//! lists, built once offline and queried many times by an input-method engine
//! that usually embeds the bytes as static data.
//!
//! ## Format overview
//!
//! A 12-byte header (entry count, index offset, data offset) is followed by
//! an index of little-endian `u32` record offsets, sorted by reading, and a
//! data region of `reading,candidate1,candidate2,...\0` records. Lookups
//! binary-search the index, comparing only the reading prefix of each record,
//! and never copy the buffer. See [`format`] for the exact layout.
//!
//! Readings may repeat; every entry with the queried reading is returned, in
//! the order the entries were given to the encoder.
//!
//! ## Example
//!
//! ```rust
//! use yomi_dict::{Dictionary, Encoder, Entry};
//!
//! // Build
//! let mut encoder = Encoder::new();
//! encoder.push(Entry::new("あい", ["愛"])).unwrap();
//! encoder.push(Entry::new("あい", ["相"])).unwrap();
//! encoder.push(Entry::new("あう", ["会う"])).unwrap();
//! let buffer = encoder.finish().unwrap();
//! println!("{} entries in {} bytes", buffer.entry_count(), buffer.byte_len());
//!
//! // Query
//! let dict = Dictionary::new(buffer.as_bytes()).unwrap();
//! assert_eq!(dict.candidates("あい").unwrap(), vec!["愛", "相"]);
//! assert!(dict.candidates("かな").unwrap().is_empty());
//! ```
//!
//! ## Embedded buffers
//!
//! A dictionary compiled into the host program is queried the same way; the
//! view borrows the static bytes for its whole life:
//!
//! ```rust
//! # use yomi_dict::{encode, Dictionary, Entry};
//! # let built = encode(&[Entry::new("かな", ["仮名", "哉"])]).unwrap();
//! # let bytes: &'static [u8] = Box::leak(built.into_bytes().into_boxed_slice());
//! let dict = Dictionary::new(bytes).unwrap();
//! for record in dict.lookup("かな").unwrap() {
//!     for (i, candidate) in record.candidates().enumerate() {
//!         println!("{}: {}", i, candidate);
//!     }
//! }
//! ```
//!
//! ## Source files
//!
//! The [`source`] module parses the line-oriented `reading /cand1/cand2/`
//! text format, and [`package`] renders a built dictionary as a C or Rust
//! array literal.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
pub mod package;
pub mod source;

// Re-export primary types at the crate root.
pub use decoder::{Candidates, Dictionary, Record, Records};
pub use encoder::{encode, DictBuffer, Encoder, Entry};
pub use error::{BuildError, CapacityError, FormatError, ValidationError};
pub use package::{write_package, OutputFormat, PackageOptions};
pub use source::{
    parse_line, parse_str, read_source, write_line, ParseWarning, ParsedSource, WarningKind,
};

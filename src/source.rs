//! Parser for the line-oriented source dictionary.
//!
//! ```text
//! # comment
//! あい /愛/相/
//! あう /会う/合う/
//! ```
//!
//! Each line is `reading /candidate1/candidate2/.../`. Blank lines and lines
//! starting with `#` are ignored. Lines that cannot be turned into a valid
//! [`Entry`] are skipped and reported as [`ParseWarning`]s; ingestion never
//! fails on bad input lines.
//!
//! [`write_line`] goes the other way, for dumping a built dictionary. The
//! text form cannot express a trailing empty candidate: `x /a//` parses back
//! as `["a"]`.

use std::io::{self, BufRead, Write};

use crate::encoder::Entry;
use crate::error::ValidationError;

/// Separates the reading from the candidate list.
const READING_SEPARATOR: &str = " /";

/// Separates candidates within a line.
const CANDIDATE_SEPARATOR: char = '/';

/// Why a source line was skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WarningKind {
    /// The line has no ` /` between reading and candidates.
    #[error("malformed line")]
    MissingSeparator,
    /// The line parsed but the entry cannot be encoded.
    #[error(transparent)]
    Invalid(ValidationError),
}

/// A skipped source line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct ParseWarning {
    /// 1-based line number, or 0 when parsing a lone line.
    pub line: usize,
    /// The trimmed line text.
    pub text: String,
    pub kind: WarningKind,
}

/// Entries and warnings collected from a whole source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSource {
    pub entries: Vec<Entry>,
    pub warnings: Vec<ParseWarning>,
}

/// Parses one source line.
///
/// Returns `None` for blank lines and comments.
pub fn parse_line(line: &str) -> Option<Result<Entry, ParseWarning>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let warn = |kind| ParseWarning {
        line: 0,
        text: line.to_string(),
        kind,
    };

    let Some((reading, rest)) = line.split_once(READING_SEPARATOR) else {
        return Some(Err(warn(WarningKind::MissingSeparator)));
    };
    let candidates = rest.trim().trim_end_matches(CANDIDATE_SEPARATOR);
    let entry = Entry::new(reading.trim(), candidates.split(CANDIDATE_SEPARATOR));

    Some(
        entry
            .validate(0)
            .map(|()| entry)
            .map_err(|err| warn(WarningKind::Invalid(err))),
    )
}

/// Parses a whole source text.
pub fn parse_str(text: &str) -> ParsedSource {
    let mut parsed = ParsedSource::default();
    for (n, line) in text.lines().enumerate() {
        parsed.push_line(n + 1, line);
    }
    parsed
}

/// Parses a source from a reader, line by line.
pub fn read_source<R: BufRead>(reader: R) -> io::Result<ParsedSource> {
    let mut parsed = ParsedSource::default();
    for (n, line) in reader.lines().enumerate() {
        parsed.push_line(n + 1, &line?);
    }
    Ok(parsed)
}

impl ParsedSource {
    fn push_line(&mut self, line_no: usize, line: &str) {
        match parse_line(line) {
            None => {}
            Some(Ok(entry)) => self.entries.push(entry),
            Some(Err(mut warning)) => {
                warning.line = line_no;
                // Report the entry by its position in the source, not 0.
                if let WarningKind::Invalid(err) = &mut warning.kind {
                    relabel(err, self.entries.len());
                }
                self.warnings.push(warning);
            }
        }
    }
}

/// Writes one entry in source format, `reading /c1/c2/`, followed by a
/// newline.
///
/// Returns `false` when [`parse_line`] would not read the same entry back,
/// e.g. for a trailing empty candidate or a candidate containing `/`.
pub fn write_line<'a, W, I>(out: &mut W, reading: &str, candidates: I) -> io::Result<bool>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let candidates: Vec<&str> = candidates.into_iter().collect();
    let mut line = format!("{reading}{READING_SEPARATOR}");
    for candidate in &candidates {
        line.push_str(candidate);
        line.push(CANDIDATE_SEPARATOR);
    }
    writeln!(out, "{line}")?;

    let lossless = match parse_line(&line) {
        Some(Ok(entry)) => entry.reading == reading && entry.candidates == candidates,
        _ => false,
    };
    Ok(lossless)
}

fn relabel(err: &mut ValidationError, at: usize) {
    match err {
        ValidationError::EmptyReading { index }
        | ValidationError::NoCandidates { index, .. }
        | ValidationError::ReservedByteInReading { index, .. }
        | ValidationError::ReservedByteInCandidate { index, .. } => *index = at,
    }
}

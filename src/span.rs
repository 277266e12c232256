use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Byte span inside a Solidity source file.
///
/// Offsets are byte indices into the file, half-open `[start, end)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceSpan {
    /// Path to the source file as given on the command line or in the config.
    pub file: PathBuf,

    /// Start byte offset (inclusive).
    pub start: usize,

    /// End byte offset (exclusive).
    pub end: usize,
}

/// Decode a solc `src` attribute (`"<start>:<length>[:<file index>]"`).
///
/// Returns `None` for anything that does not follow that scheme.
pub fn decode_src(src: &str) -> Option<(usize, usize)> {
    let mut parts = src.split(':');
    let start = parts.next()?.parse::<usize>().ok()?;
    let length = parts.next()?.parse::<usize>().ok()?;

    // Optional file index; it must still be numeric when present.
    if let Some(index) = parts.next() {
        index.parse::<i64>().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }

    Some((start, start.checked_add(length)?))
}

/// Convert a byte offset into a 1-based (line, column) location.
///
/// Column counts Unicode scalar values on the line segment.
pub fn byte_offset_to_line_col(code: &str, offset: usize) -> Option<(usize, usize)> {
    let prefix = code.get(..offset)?;

    let line = prefix.bytes().filter(|&b| b == b'\n').count() + 1;
    let line_start = prefix.rfind('\n').map(|pos| pos + 1).unwrap_or(0);
    let col = prefix[line_start..].chars().count() + 1;

    Some((line, col))
}

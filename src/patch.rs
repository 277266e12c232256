use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MutationError, Result};

/// One byte-range substitution against an original buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Replacement {
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

static TRAILING_SEMICOLON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*;").expect("trailing semicolon pattern is valid")
});

/// Return `source[start..end]`, or `SpanOutOfBounds` if the range does not fit.
pub fn slice(source: &str, start: usize, end: usize) -> Result<&str> {
    source
        .get(start..end)
        .ok_or(MutationError::SpanOutOfBounds {
            start,
            end,
            len: source.len(),
        })
}

/// Replace `source[start..end]` with `replacement` and return the full new text.
///
/// `start == end` inserts. The tail is taken up to the full buffer length.
pub fn replace_span(source: &str, replacement: &str, start: usize, end: usize) -> Result<String> {
    if start > end {
        return Err(MutationError::SpanOutOfBounds {
            start,
            end,
            len: source.len(),
        });
    }

    let before = slice(source, 0, start)?;
    let after = slice(source, end, source.len())?;

    let mut out = String::with_capacity(
        source.len() + replacement.len().saturating_sub(end - start),
    );
    out.push_str(before);
    out.push_str(replacement);
    out.push_str(after);

    Ok(out)
}

/// Apply several non-overlapping replacements, all expressed in offsets of the original `source`.
///
/// Replacements are applied in ascending `start` order. Each one is shifted by the
/// cumulative length delta of the ones before it.
pub fn replace_multiple(source: &str, mut replacements: Vec<Replacement>) -> Result<String> {
    replacements.sort_by_key(|r| r.start);

    let (out, _) = replacements.into_iter().try_fold(
        (source.to_string(), 0isize),
        |(buffer, cur_offset), r| {
            let actual_start = shift(r.start, cur_offset, &buffer)?;
            let actual_end = shift(r.end, cur_offset, &buffer)?;
            let next = replace_span(&buffer, &r.text, actual_start, actual_end)?;

            let delta = r.text.len() as isize - (r.end as isize - r.start as isize);
            Ok::<_, MutationError>((next, cur_offset + delta))
        },
    )?;

    Ok(out)
}

fn shift(pos: usize, offset: isize, buffer: &str) -> Result<usize> {
    pos.checked_add_signed(offset)
        .ok_or(MutationError::SpanOutOfBounds {
            start: pos,
            end: pos,
            len: buffer.len(),
        })
}

/// Wrap `source[start..end]` in `/* */`.
///
/// A `;` that follows the span (after optional whitespace) is pulled into the
/// comment so that deleting a statement leaves a valid line behind.
pub fn comment_out(source: &str, start: usize, end: usize) -> Result<String> {
    let rest = slice(source, end, source.len())?;
    let end = match TRAILING_SEMICOLON.find(rest) {
        Some(m) => end + m.end(),
        None => end,
    };

    let commented = format!("/*{}*/", slice(source, start, end)?);
    replace_span(source, &commented, start, end)
}

/// Byte offset just past the `;` that terminates the statement ending at `end`, if any.
pub fn statement_end(source: &str, end: usize) -> Result<usize> {
    let rest = slice(source, end, source.len())?;
    Ok(TRAILING_SEMICOLON
        .find(rest)
        .map(|m| end + m.end())
        .unwrap_or(end))
}

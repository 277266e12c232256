use thiserror::Error;

use crate::mutation::MutationType;

/// Errors raised by the mutation engine.
///
/// Everything here aborts the current file. Soft conditions such as
/// duplicate or non-compiling candidates are not errors; they only show up in
/// the sampling statistics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    /// A node that should carry a `src` span lacks one or has an unparseable encoding.
    #[error("malformed source span {src:?} on `{node_type}` node")]
    MalformedSpan { node_type: String, src: Option<String> },

    /// A decoded span does not fit into the source buffer (or splits a UTF-8 character).
    #[error("span [{start}, {end}) is out of bounds for source of length {len}")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    /// `mutate_randomly` was called on a node the operator does not claim.
    #[error("{operator} applied to a `{node_type}` node that is not one of its mutation points")]
    PreconditionViolation {
        operator: MutationType,
        node_type: String,
    },

    /// A mutation operator name that is not part of the catalog.
    #[error("unknown mutation operator `{0}`")]
    UnknownMutation(String),
}

pub type Result<T, E = MutationError> = std::result::Result<T, E>;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::mutation::MutationType;
use crate::span::{SourceSpan, byte_offset_to_line_col};

/// One accepted mutant of a Solidity source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mutant {
    /// 1-based identifier, in generation order across the whole run.
    pub id: u64,

    /// Operator applied to create this mutant.
    pub operator: MutationType,

    /// Span of the AST node the operator acted on.
    pub span: SourceSpan,

    /// 1-based line of the first changed byte in the original file.
    pub line: usize,

    /// 1-based column of the first changed byte in the original file.
    pub column: usize,

    /// Original text of the changed region.
    pub original_snippet: String,

    /// Replacement text of the changed region.
    pub mutated_snippet: String,

    /// Annotated mutant file on disk.
    pub path: PathBuf,

    /// Unified diff between the original file and the mutant.
    pub diff: String,
}

/// Smallest region in which `mutated` differs from `original`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Start byte offset in the original (and mutated) text.
    pub start: usize,

    /// End byte offset (exclusive) in the original text.
    pub end: usize,

    pub original: String,
    pub replacement: String,
}

impl Change {
    /// Compute the changed region by trimming the common prefix and suffix.
    ///
    /// Boundaries are moved outwards to UTF-8 character boundaries.
    pub fn between(original: &str, mutated: &str) -> Self {
        let (a, b) = (original.as_bytes(), mutated.as_bytes());

        let mut prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
        while !(original.is_char_boundary(prefix) && mutated.is_char_boundary(prefix)) {
            prefix -= 1;
        }

        let max_suffix = a.len().min(b.len()) - prefix;
        let mut suffix = a
            .iter()
            .rev()
            .zip(b.iter().rev())
            .take(max_suffix)
            .take_while(|(x, y)| x == y)
            .count();
        while !(original.is_char_boundary(a.len() - suffix)
            && mutated.is_char_boundary(b.len() - suffix))
        {
            suffix -= 1;
        }

        Self {
            start: prefix,
            end: a.len() - suffix,
            original: original[prefix..a.len() - suffix].to_string(),
            replacement: mutated[prefix..b.len() - suffix].to_string(),
        }
    }

    /// 1-based (line, column) of the change in the original text.
    pub fn line_col(&self, original: &str) -> (usize, usize) {
        byte_offset_to_line_col(original, self.start).unwrap_or((1, 1))
    }
}

/// Insert a `/// <Operator> of: <original line>` comment above the first changed line.
///
/// The comment takes the indentation of the original line. If no line
/// differs, `mutated` is returned unchanged.
pub fn annotate(original: &str, mutated: &str, operator: MutationType) -> String {
    let mut offset = 0;

    for (orig_line, mut_line) in original.split_inclusive('\n').zip(mutated.split_inclusive('\n')) {
        if orig_line != mut_line {
            let indent: String = orig_line
                .chars()
                .take_while(|c| matches!(c, ' ' | '\t'))
                .collect();
            let comment = format!("{indent}/// {operator} of: {}\n", orig_line.trim());
            return [&mutated[..offset], comment.as_str(), &mutated[offset..]].concat();
        }
        offset += mut_line.len();
    }

    // One file ran out of lines first: annotate the first extra line, if any.
    if offset < mutated.len() {
        let comment = format!("/// {operator}\n");
        return [&mutated[..offset], comment.as_str(), &mutated[offset..]].concat();
    }

    mutated.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotate_inserts_comment_with_indentation() {
        let original = "contract C {\n    function f(uint a, uint b) public returns (uint) {\n        return a + b;\n    }\n}\n";
        let mutated = original.replace("a + b", "a - b");

        let annotated = annotate(original, &mutated, MutationType::ArithmeticBinaryOpMutation);
        assert_eq!(
            annotated,
            "contract C {\n    function f(uint a, uint b) public returns (uint) {\n        /// ArithmeticBinaryOpMutation of: return a + b;\n        return a - b;\n    }\n}\n"
        );
    }

    #[test]
    fn annotate_keeps_missing_final_newline() {
        let annotated = annotate("a;\nb;", "a;\nc;", MutationType::DeleteExpressionMutation);
        assert_eq!(annotated, "a;\n/// DeleteExpressionMutation of: b;\nc;");
    }

    #[test]
    fn annotate_blank_line_stays_one_comment_line() {
        let annotated = annotate("a;\n    \nb;\n", "a;\n    x;\nb;\n", MutationType::SwapLinesMutation);
        assert_eq!(annotated, "a;\n    /// SwapLinesMutation of: \n    x;\nb;\n");
    }

    #[test]
    fn annotate_identical_text_is_unchanged() {
        assert_eq!(
            annotate("x;\n", "x;\n", MutationType::SwapLinesMutation),
            "x;\n"
        );
    }

    #[test]
    fn change_is_the_minimal_region() {
        let change = Change::between("return a + b;", "return a ** b;");
        assert_eq!(change.start, 9);
        assert_eq!(change.end, 10);
        assert_eq!(change.original, "+");
        assert_eq!(change.replacement, "**");
    }

    #[test]
    fn change_of_wrapping_edits() {
        let change = Change::between("foo();", "/*foo();*/");
        assert_eq!(change.original, "foo();");
        assert_eq!(change.replacement, "/*foo();*/");

        let change = Change::between("require(c);", "require(!(c));");
        assert_eq!((change.start, change.end), (8, 9));
        assert_eq!(change.original, "c");
        assert_eq!(change.replacement, "!(c)");
    }

    #[test]
    fn change_respects_char_boundaries() {
        let change = Change::between("s = \"é\";", "s = \"è\";");
        assert_eq!(change.original, "é");
        assert_eq!(change.replacement, "è");
    }

    #[test]
    fn change_line_col() {
        let original = "a;\n  b + c;\n";
        let change = Change::between(original, "a;\n  b - c;\n");
        assert_eq!(change.line_col(original), (2, 5));
    }
}

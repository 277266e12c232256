//! Read-only view over a solc compact JSON AST.
//!
//! A [`SolNode`] borrows one value of the parsed tree. Field accessors are
//! forgiving: asking a node for a field it does not have yields `None`, an
//! empty node or an empty list. Span decoding is the exception and fails
//! loudly, see [`SolNode::bounds`].

use serde_json::Value;

use crate::error::{MutationError, Result};
use crate::patch::{self, Replacement};
use crate::span::decode_src;

/// Handle onto one node of a parsed AST.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolNode<'a> {
    element: Option<&'a Value>,
}

impl<'a> SolNode<'a> {
    pub fn new(value: &'a Value) -> Self {
        if value.is_null() {
            Self { element: None }
        } else {
            Self {
                element: Some(value),
            }
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.element.is_none()
    }

    /// Child node stored under field `name` (empty if absent).
    pub fn get_node(&self, name: &str) -> SolNode<'a> {
        self.element
            .and_then(|e| e.get(name))
            .map(SolNode::new)
            .unwrap_or_default()
    }

    /// String field `name`, if present and a string.
    pub fn get_str(&self, name: &str) -> Option<&'a str> {
        self.element?.get(name)?.as_str()
    }

    fn get_list(&self, name: &str) -> Vec<SolNode<'a>> {
        self.element
            .and_then(|e| e.get(name))
            .and_then(Value::as_array)
            .map(|items| items.iter().map(SolNode::new).collect())
            .unwrap_or_default()
    }

    pub fn node_type(&self) -> Option<&'a str> {
        self.get_str("nodeType")
    }

    pub fn is(&self, node_type: &str) -> bool {
        self.node_type() == Some(node_type)
    }

    pub fn src(&self) -> Option<&'a str> {
        self.get_str("src")
    }

    pub fn name(&self) -> Option<&'a str> {
        self.get_str("name")
    }

    pub fn operator(&self) -> Option<&'a str> {
        self.get_str("operator")
    }

    pub fn member_name(&self) -> Option<&'a str> {
        self.get_str("memberName")
    }

    pub fn expression(&self) -> SolNode<'a> {
        self.get_node("expression")
    }

    pub fn left_expression(&self) -> SolNode<'a> {
        self.get_node("leftExpression")
    }

    pub fn right_expression(&self) -> SolNode<'a> {
        self.get_node("rightExpression")
    }

    pub fn right_hand_side(&self) -> SolNode<'a> {
        self.get_node("rightHandSide")
    }

    pub fn condition(&self) -> SolNode<'a> {
        self.get_node("condition")
    }

    pub fn arguments(&self) -> Vec<SolNode<'a>> {
        self.get_list("arguments")
    }

    pub fn statements(&self) -> Vec<SolNode<'a>> {
        self.get_list("statements")
    }

    /// `typeDescriptions.typeString`, e.g. `"int_const 42"` or `"uint256"`.
    pub fn type_string(&self) -> Option<&'a str> {
        self.get_node("typeDescriptions").get_str("typeString")
    }

    /// Name of the function a `FunctionCall` node invokes, when the callee is a plain identifier.
    pub fn callee_name(&self) -> Option<&'a str> {
        if self.is("FunctionCall") {
            self.expression().name()
        } else {
            None
        }
    }

    /// Decode the node's `src` span into `(start, end)` byte offsets.
    pub fn bounds(&self) -> Result<(usize, usize)> {
        self.src()
            .and_then(decode_src)
            .ok_or_else(|| MutationError::MalformedSpan {
                node_type: self.node_type().unwrap_or("<untyped>").to_string(),
                src: self.src().map(str::to_string),
            })
    }

    /// Source text covered by this node.
    pub fn text<'s>(&self, source: &'s str) -> Result<&'s str> {
        let (start, end) = self.bounds()?;
        patch::slice(source, start, end)
    }

    /// Replace this node's text with `new` and return the whole new file.
    pub fn replace_in_source(&self, source: &str, new: &str) -> Result<String> {
        let (start, end) = self.bounds()?;
        patch::replace_span(source, new, start, end)
    }

    /// Replace the text of several nodes at once; spans refer to the original `source`.
    pub fn replace_multiple(source: &str, reps: Vec<(SolNode<'_>, String)>) -> Result<String> {
        let reps = reps
            .into_iter()
            .map(|(node, text)| {
                let (start, end) = node.bounds()?;
                Ok(Replacement::new(start, end, text))
            })
            .collect::<Result<Vec<_>>>()?;
        patch::replace_multiple(source, reps)
    }

    /// Comment this node out, together with a trailing `;`.
    pub fn comment_out(&self, source: &str) -> Result<String> {
        let (start, end) = self.bounds()?;
        patch::comment_out(source, start, end)
    }

    /// Child values in document order: object fields, then array elements.
    fn children(&self) -> Vec<SolNode<'a>> {
        match self.element {
            Some(Value::Object(fields)) => fields.values().map(SolNode::new).collect(),
            Some(Value::Array(items)) => items.iter().map(SolNode::new).collect(),
            _ => Vec::new(),
        }
    }

    /// Pre-order walk over the whole tree below (and including) this node.
    ///
    /// Once `accept` matches a node, that node and everything below it is
    /// accepted. A node matched by `skip` is dropped together with its subtree,
    /// even when accepted. `visit` runs on every accepted, non-skipped node and
    /// its `Some` results are collected in document order.
    pub fn traverse<T>(
        &self,
        mut visit: impl FnMut(&SolNode<'a>) -> Option<T>,
        skip: impl Fn(&SolNode<'a>) -> bool,
        accept: impl Fn(&SolNode<'a>) -> bool,
    ) -> Vec<T> {
        let mut acc = Vec::new();
        self.traverse_internal(&mut visit, &skip, &accept, false, &mut acc);
        acc
    }

    fn traverse_internal<T>(
        &self,
        visit: &mut impl FnMut(&SolNode<'a>) -> Option<T>,
        skip: &impl Fn(&SolNode<'a>) -> bool,
        accept: &impl Fn(&SolNode<'a>) -> bool,
        accepted: bool,
        acc: &mut Vec<T>,
    ) {
        let accepted = accepted || accept(self);
        if skip(self) {
            return;
        }

        if accepted {
            if let Some(r) = visit(self) {
                acc.push(r);
            }
        }

        for child in self.children() {
            child.traverse_internal(visit, skip, accept, accepted, acc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "nodeType": "FunctionDefinition",
            "name": "f",
            "src": "0:20:0",
            "body": {
                "nodeType": "Block",
                "src": "10:10:0",
                "statements": [
                    { "nodeType": "ExpressionStatement", "name": "a", "src": "11:2:0" },
                    {
                        "nodeType": "FunctionCall",
                        "src": "14:4:0",
                        "expression": { "nodeType": "Identifier", "name": "assert", "src": "14:1:0" },
                        "arguments": [
                            { "nodeType": "FunctionDefinition", "name": "inner", "src": "16:1:0" }
                        ]
                    }
                ]
            }
        })
    }

    #[test]
    fn accessors_return_none_on_mismatch() {
        let v = json!({ "nodeType": "Literal", "value": "1" });
        let node = SolNode::new(&v);

        assert_eq!(node.node_type(), Some("Literal"));
        assert_eq!(node.operator(), None);
        assert!(node.left_expression().is_empty());
        assert!(node.arguments().is_empty());
        assert_eq!(node.type_string(), None);

        let scalar = json!(3);
        let node = SolNode::new(&scalar);
        assert_eq!(node.node_type(), None);
        assert!(node.statements().is_empty());
        assert!(node.expression().expression().is_empty());
    }

    #[test]
    fn bounds_decode_and_fail_strictly() {
        let v = json!({ "nodeType": "Identifier", "src": "4:3:0" });
        assert_eq!(SolNode::new(&v).bounds().unwrap(), (4, 7));
        assert_eq!(SolNode::new(&v).text("abcdefghi").unwrap(), "efg");

        let missing = json!({ "nodeType": "Identifier" });
        assert_eq!(
            SolNode::new(&missing).bounds().unwrap_err(),
            MutationError::MalformedSpan {
                node_type: "Identifier".to_string(),
                src: None
            }
        );

        let garbage = json!({ "nodeType": "Identifier", "src": "x:1" });
        assert!(matches!(
            SolNode::new(&garbage).bounds(),
            Err(MutationError::MalformedSpan { .. })
        ));
    }

    #[test]
    fn text_outside_source_is_out_of_bounds() {
        let v = json!({ "nodeType": "Identifier", "src": "4:10:0" });
        assert!(matches!(
            SolNode::new(&v).text("short"),
            Err(MutationError::SpanOutOfBounds { .. })
        ));
    }

    #[test]
    fn traverse_is_preorder_in_document_order() {
        let v = sample();
        let root = SolNode::new(&v);

        let kinds = root.traverse(|n| n.node_type().map(str::to_string), |_| false, |_| true);
        assert_eq!(
            kinds,
            vec![
                "FunctionDefinition",
                "Block",
                "ExpressionStatement",
                "FunctionCall",
                "Identifier",
                "FunctionDefinition",
            ]
        );
    }

    #[test]
    fn skipped_subtree_contributes_nothing() {
        let v = sample();
        let root = SolNode::new(&v);

        let is_assert = |n: &SolNode| n.callee_name() == Some("assert");
        // `inner` would be accepted on its own, but lives under the skipped call.
        let accept_inner = |n: &SolNode| n.name() == Some("inner") || n.name() == Some("f");

        let names = root.traverse(|n| n.name().map(str::to_string), is_assert, accept_inner);
        assert_eq!(names, vec!["f", "a"]);
    }

    #[test]
    fn accept_is_sticky_for_the_subtree() {
        let v = sample();
        let root = SolNode::new(&v);

        let only_block = |n: &SolNode| n.is("Block");
        let kinds = root.traverse(|n| n.node_type().map(str::to_string), |_| false, only_block);
        assert_eq!(
            kinds,
            vec![
                "Block",
                "ExpressionStatement",
                "FunctionCall",
                "Identifier",
                "FunctionDefinition",
            ]
        );
    }

    #[test]
    fn replace_multiple_uses_node_spans() {
        let source = "x - y";
        let v = json!({
            "nodeType": "BinaryOperation",
            "operator": "-",
            "src": "0:5:0",
            "leftExpression": { "nodeType": "Identifier", "src": "0:1:0" },
            "rightExpression": { "nodeType": "Identifier", "src": "4:1:0" }
        });
        let node = SolNode::new(&v);
        let left = node.left_expression();
        let right = node.right_expression();

        let swapped = SolNode::replace_multiple(
            source,
            vec![
                (right, left.text(source).unwrap().to_string()),
                (left, right.text(source).unwrap().to_string()),
            ],
        )
        .unwrap();
        assert_eq!(swapped, "y - x");
    }
}

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::ast::SolNode;
use crate::error::{MutationError, Result};
use crate::patch;

const ARITHMETIC_OPS: &[&str] = &["+", "-", "*", "/", "%", "**"];
const PREDICATE_OPS: &[&str] = &["==", "!=", ">", "<", ">=", "<="];
const LOGICAL_OPS: &[&str] = &["&&", "||", "&", "|", "^", "<<", ">>"];
const NON_COMMUTATIVE_OPS: &[&str] = &["-", "/", "%", "**", ">", "<", ">=", "<=", "<<", ">>"];
const PREFIX_OPS: &[&str] = &["++", "--", "~"];
const SUFFIX_OPS: &[&str] = &["++", "--"];
const BOOL_LITERALS: &[&str] = &["true", "false"];
const ASSIGNMENT_LITERALS: &[&str] = &["true", "false", "0", "1"];
const INT_CONST_PREFIX: &str = "int_const ";

/// Mutation operators, in catalog order.
///
/// Each variant is stateless. [`MutationType::is_mutation_point`] decides
/// whether an AST node is a place the operator can act on, and
/// [`MutationType::mutate_randomly`] performs one randomly chosen edit there,
/// returning the complete new source file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum MutationType {
    /// `a + b` -> `a * b`: swap one arithmetic operator for another.
    ArithmeticBinaryOpMutation,

    /// `a < b` -> `a >= b`: swap one comparison for another.
    PredicateBinaryOpMutation,

    /// `a && b` -> `a | b`: swap one logical or bitwise operator for another.
    LogicalBinaryOpMutation,

    /// `++i` -> `~i`, `i--` -> `i++`.
    UnaryOperatorMutation,

    /// `a - b` -> `b - a` for non-commutative operators.
    SwapArgumentsOperatorMutation,

    /// `f(a, b)` -> `f(b, a)`.
    SwapArgumentsFunctionMutation,

    /// Swap two statements of a block.
    SwapLinesMutation,

    /// `require(c)` -> `require(!(c))`.
    RequireMutation,

    /// `if (c)` -> `if (true)`, `if (false)` or `if (!(c))`.
    IfStatementMutation,

    /// `x = e` -> `x = 0` (or `1`, `true`, `false`, a random integer).
    AssignmentMutation,

    /// `41` -> `42`, `40` or a random integer.
    IntegerMutation,

    /// `foo();` -> `/*foo();*/`.
    DeleteExpressionMutation,

    /// `x++;` -> `unchecked{ x++; }`.
    UncheckedBlockMutation,

    /// `f(a, b)` -> `a`.
    FunctionCallMutation,

    /// `f(a, b, c)` -> `f(c, b, a)`: exchange two call arguments by position.
    SwapCallArgumentsMutation,

    /// `t.delegatecall(d)` -> `t.call(d)`.
    ElimDelegateMutation,
}

static BY_NAME: LazyLock<HashMap<&'static str, MutationType>> =
    LazyLock::new(|| MutationType::ALL.iter().map(|m| (m.name(), *m)).collect());

impl MutationType {
    /// Full catalog, in the order used to fill sampling work queues.
    pub const ALL: [MutationType; 16] = [
        MutationType::ArithmeticBinaryOpMutation,
        MutationType::PredicateBinaryOpMutation,
        MutationType::LogicalBinaryOpMutation,
        MutationType::UnaryOperatorMutation,
        MutationType::SwapArgumentsOperatorMutation,
        MutationType::SwapArgumentsFunctionMutation,
        MutationType::SwapLinesMutation,
        MutationType::RequireMutation,
        MutationType::IfStatementMutation,
        MutationType::AssignmentMutation,
        MutationType::IntegerMutation,
        MutationType::DeleteExpressionMutation,
        MutationType::UncheckedBlockMutation,
        MutationType::FunctionCallMutation,
        MutationType::SwapCallArgumentsMutation,
        MutationType::ElimDelegateMutation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MutationType::ArithmeticBinaryOpMutation => "ArithmeticBinaryOpMutation",
            MutationType::PredicateBinaryOpMutation => "PredicateBinaryOpMutation",
            MutationType::LogicalBinaryOpMutation => "LogicalBinaryOpMutation",
            MutationType::UnaryOperatorMutation => "UnaryOperatorMutation",
            MutationType::SwapArgumentsOperatorMutation => "SwapArgumentsOperatorMutation",
            MutationType::SwapArgumentsFunctionMutation => "SwapArgumentsFunctionMutation",
            MutationType::SwapLinesMutation => "SwapLinesMutation",
            MutationType::RequireMutation => "RequireMutation",
            MutationType::IfStatementMutation => "IfStatementMutation",
            MutationType::AssignmentMutation => "AssignmentMutation",
            MutationType::IntegerMutation => "IntegerMutation",
            MutationType::DeleteExpressionMutation => "DeleteExpressionMutation",
            MutationType::UncheckedBlockMutation => "UncheckedBlockMutation",
            MutationType::FunctionCallMutation => "FunctionCallMutation",
            MutationType::SwapCallArgumentsMutation => "SwapCallArgumentsMutation",
            MutationType::ElimDelegateMutation => "ElimDelegateMutation",
        }
    }

    /// Does this operator apply to `node`?
    pub fn is_mutation_point(&self, node: &SolNode<'_>) -> bool {
        match self {
            MutationType::ArithmeticBinaryOpMutation => binary_op_in(node, ARITHMETIC_OPS),
            MutationType::PredicateBinaryOpMutation => binary_op_in(node, PREDICATE_OPS),
            MutationType::LogicalBinaryOpMutation => binary_op_in(node, LOGICAL_OPS),
            MutationType::SwapArgumentsOperatorMutation => {
                binary_op_in(node, NON_COMMUTATIVE_OPS)
            }
            MutationType::UnaryOperatorMutation => {
                node.is("UnaryOperation") && node.operator().is_some_and(|op| !op.is_empty())
            }
            MutationType::SwapArgumentsFunctionMutation
            | MutationType::SwapCallArgumentsMutation => {
                node.is("FunctionCall") && node.arguments().len() > 1
            }
            MutationType::SwapLinesMutation => node.is("Block") && node.statements().len() > 1,
            MutationType::RequireMutation => {
                node.callee_name() == Some("require") && !node.arguments().is_empty()
            }
            MutationType::IfStatementMutation => node.is("IfStatement"),
            MutationType::AssignmentMutation => node.is("Assignment"),
            MutationType::IntegerMutation => int_const_value(node).is_some(),
            MutationType::DeleteExpressionMutation | MutationType::UncheckedBlockMutation => {
                node.is("ExpressionStatement")
            }
            MutationType::FunctionCallMutation => {
                node.is("FunctionCall") && !node.arguments().is_empty()
            }
            MutationType::ElimDelegateMutation => {
                let callee = node.expression();
                node.is("FunctionCall")
                    && callee.is("MemberAccess")
                    && callee.member_name() == Some("delegatecall")
            }
        }
    }

    /// Apply one random edit of this kind at `node` and return the full mutated source.
    ///
    /// Fails with [`MutationError::PreconditionViolation`] when `node` is not a
    /// mutation point of this operator. The result may equal `source`.
    pub fn mutate_randomly(
        &self,
        node: &SolNode<'_>,
        source: &str,
        rng: &mut impl Rng,
    ) -> Result<String> {
        if !self.is_mutation_point(node) {
            return Err(MutationError::PreconditionViolation {
                operator: *self,
                node_type: node.node_type().unwrap_or("<untyped>").to_string(),
            });
        }

        match self {
            MutationType::ArithmeticBinaryOpMutation => {
                replace_binary_op(node, source, pick(rng, ARITHMETIC_OPS))
            }
            MutationType::PredicateBinaryOpMutation => {
                replace_binary_op(node, source, pick(rng, PREDICATE_OPS))
            }
            MutationType::LogicalBinaryOpMutation => {
                replace_binary_op(node, source, pick(rng, LOGICAL_OPS))
            }

            MutationType::UnaryOperatorMutation => {
                let (start, end) = node.bounds()?;
                let op = node.operator().unwrap_or_default();
                let text = node.text(source)?;

                if text.as_bytes().first() == op.as_bytes().first() {
                    patch::replace_span(source, pick(rng, PREFIX_OPS), start, start + op.len())
                } else {
                    let op_start =
                        end.checked_sub(op.len())
                            .ok_or(MutationError::SpanOutOfBounds {
                                start,
                                end,
                                len: source.len(),
                            })?;
                    patch::replace_span(source, pick(rng, SUFFIX_OPS), op_start, end)
                }
            }

            MutationType::SwapArgumentsOperatorMutation => {
                let left = node.left_expression();
                let right = node.right_expression();
                SolNode::replace_multiple(
                    source,
                    vec![
                        (left, right.text(source)?.to_string()),
                        (right, left.text(source)?.to_string()),
                    ],
                )
            }

            MutationType::SwapArgumentsFunctionMutation
            | MutationType::SwapCallArgumentsMutation => {
                swap_two(node.arguments(), source, rng)
            }

            MutationType::SwapLinesMutation => swap_two(node.statements(), source, rng),

            MutationType::RequireMutation => {
                let args = node.arguments();
                let arg = &args[0];
                arg.replace_in_source(source, &format!("!({})", arg.text(source)?))
            }

            MutationType::IfStatementMutation => {
                let cond = node.condition();
                if rng.gen_bool(0.5) {
                    cond.replace_in_source(source, pick(rng, BOOL_LITERALS))
                } else {
                    cond.replace_in_source(source, &format!("!({})", cond.text(source)?))
                }
            }

            MutationType::AssignmentMutation => {
                let idx = rng.gen_range(0..=ASSIGNMENT_LITERALS.len());
                let new = match ASSIGNMENT_LITERALS.get(idx) {
                    Some(lit) => lit.to_string(),
                    None => rng.r#gen::<u64>().to_string(),
                };
                node.right_hand_side().replace_in_source(source, &new)
            }

            MutationType::IntegerMutation => {
                let value = int_const_value(node).unwrap_or_default();
                let new = match rng.gen_range(0..4) {
                    0 => value.wrapping_add(1),
                    1 => value.wrapping_sub(1),
                    _ => rng.r#gen::<u64>(),
                };
                node.replace_in_source(source, &new.to_string())
            }

            MutationType::DeleteExpressionMutation => node.comment_out(source),

            MutationType::UncheckedBlockMutation => {
                let (start, end) = node.bounds()?;
                let end = patch::statement_end(source, end)?;
                let statement = patch::slice(source, start, end)?;
                patch::replace_span(source, &format!("unchecked{{ {statement} }}"), start, end)
            }

            MutationType::FunctionCallMutation => {
                let args = node.arguments();
                let arg = &args[rng.gen_range(0..args.len())];
                node.replace_in_source(source, arg.text(source)?)
            }

            MutationType::ElimDelegateMutation => {
                let member = node.expression();
                let (start, end) = member.bounds()?;
                let name_start = end
                    .checked_sub("delegatecall".len())
                    .filter(|s| *s >= start)
                    .ok_or(MutationError::SpanOutOfBounds {
                        start,
                        end,
                        len: source.len(),
                    })?;
                patch::replace_span(source, "call", name_start, end)
            }
        }
    }
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MutationType {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self> {
        BY_NAME
            .get(s)
            .copied()
            .ok_or_else(|| MutationError::UnknownMutation(s.to_string()))
    }
}

fn pick<'s>(rng: &mut impl Rng, options: &[&'s str]) -> &'s str {
    options[rng.gen_range(0..options.len())]
}

fn binary_op_in(node: &SolNode<'_>, ops: &[&str]) -> bool {
    node.is("BinaryOperation") && node.operator().is_some_and(|op| ops.contains(&op))
}

fn int_const_value(node: &SolNode<'_>) -> Option<u64> {
    node.type_string()?
        .strip_prefix(INT_CONST_PREFIX)?
        .parse::<u64>()
        .ok()
}

/// Replace everything between the two operands with ` op `.
fn replace_binary_op(node: &SolNode<'_>, source: &str, op: &str) -> Result<String> {
    let (_, left_end) = node.left_expression().bounds()?;
    let (right_start, _) = node.right_expression().bounds()?;
    patch::replace_span(source, &format!(" {op} "), left_end, right_start)
}

/// Shuffle `items` and exchange the source text of the first two.
fn swap_two(mut items: Vec<SolNode<'_>>, source: &str, rng: &mut impl Rng) -> Result<String> {
    items.shuffle(rng);
    let (a, b) = (items[0], items[1]);
    SolNode::replace_multiple(
        source,
        vec![
            (a, b.text(source)?.to_string()),
            (b, a.text(source)?.to_string()),
        ],
    )
}

use crate::error::{FormulaError, Result};
use crate::node::Node;

pub fn is_call(node: &Node) -> bool {
    matches!(node, Node::Call { .. })
}

/// True if `node` is a call to exactly `op`.
pub fn is_call_to(node: &Node, op: &str) -> bool {
    match node {
        Node::Call { op: o, .. } => o == op,
        _ => false,
    }
}

/// Operator and arguments of `node`, which must be a call.
pub fn check_call(node: &Node) -> Result<(&str, &[Node])> {
    node.as_call().ok_or_else(|| FormulaError::Syntax {
        message: "expected a function call".to_string(),
        expr: node.to_string(),
    })
}

/// Fails on the first escape marker found anywhere below (or at) `node`.
/// The error names the outermost escaped subexpression.
pub fn reject_escape(node: &Node) -> Result<()> {
    match node {
        Node::Call { .. } if node.is_escape() => Err(FormulaError::Unsupported {
            expr: node.to_string(),
        }),
        Node::Call { args, .. } => args.iter().try_for_each(reject_escape),
        _ => Ok(()),
    }
}

/// The root of a formula must be `lhs ~ rhs`, exactly two arguments.
/// Returns the two sides.
pub fn check_formula(node: &Node) -> Result<(&Node, &Node)> {
    if !is_call_to(node, "~") {
        return Err(FormulaError::Syntax {
            message: "expected `lhs ~ rhs`".to_string(),
            expr: node.to_string(),
        });
    }
    match check_call(node)? {
        (_, [lhs, rhs]) => Ok((lhs, rhs)),
        (_, args) => Err(FormulaError::Syntax {
            message: format!("`~` takes two sides, got {}", args.len()),
            expr: node.to_string(),
        }),
    }
}

use serde::Serialize;
use std::fmt;

use crate::error::Result;
use crate::evaluator::Scope;
use crate::node::Node;
use crate::parse::parse;
use crate::rewrite::Rewriter;
use crate::term::{Special, Term};
use crate::validate::{check_formula, reject_escape};

/// A two-sided (or one-sided) formula with both sides rewritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Formula {
    original: Node,
    lhs: Term,
    rhs: Term,
}

impl Formula {
    /// Validate and rewrite `node`, which must be `lhs ~ rhs`.
    pub fn from_node(node: &Node, scope: &Scope) -> Result<Formula> {
        let (lhs, rhs) = check_formula(node)?;
        reject_escape(node)?;
        let rewriter = Rewriter::new(scope);
        Ok(Formula {
            original: node.clone(),
            lhs: rewriter.rewrite(lhs)?,
            rhs: rewriter.rewrite(rhs)?,
        })
    }

    /// Parse `input` and build the formula.
    pub fn parse(input: &str, scope: &Scope) -> Result<Formula> {
        Formula::from_node(&parse(input)?, scope)
    }

    /// The expression as written.
    pub fn original(&self) -> &Node {
        &self.original
    }

    pub fn lhs(&self) -> &Term {
        &self.lhs
    }

    pub fn rhs(&self) -> &Term {
        &self.rhs
    }

    /// Both sides joined again under `~`.
    pub fn normalized(&self) -> Term {
        Term::op(Special::Tilde, vec![self.lhs.clone(), self.rhs.clone()])
    }

    pub fn is_one_sided(&self) -> bool {
        self.lhs == Term::Absent
    }
}

/// Prints text that parses back to an equal formula.
impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.normalized())
    }
}

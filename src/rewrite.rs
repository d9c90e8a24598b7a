use crate::capture::capture_call;
use crate::error::Result;
use crate::evaluator::Scope;
use crate::node::Node;
use crate::term::{Special, Term};
use crate::validate::reject_escape;

/// Turns parsed expressions into term trees.
///
/// Calls to `+`, `&`, `*` and `~` keep their operator and arity, with each
/// argument rewritten. Any other call becomes a captured call whose head
/// is resolved in the rewriter's scope.
///
/// The output is a [`Term`], not a [`Node`], so a rewritten tree cannot be
/// fed back through the rewriter.
pub struct Rewriter<'s> {
    scope: &'s Scope,
}

impl<'s> Rewriter<'s> {
    pub fn new(scope: &'s Scope) -> Rewriter<'s> {
        Rewriter { scope }
    }

    /// Rewrite `node`. Escape markers anywhere in it are rejected before
    /// anything else happens.
    pub fn rewrite(&self, node: &Node) -> Result<Term> {
        reject_escape(node)?;
        self.lower(node)
    }

    fn lower(&self, node: &Node) -> Result<Term> {
        match node {
            Node::Absent => Ok(Term::Absent),
            Node::Symbol { name } => Ok(Term::column(name.as_str())),
            Node::Number { value } => Ok(Term::constant(*value)),
            Node::Call { op, args } => {
                let lowered = self.lower_all(args)?;
                match Special::from_symbol(op) {
                    Some(special) => Ok(Term::op(special, lowered)),
                    None => Ok(Term::Captured(capture_call(node, lowered, self.scope)?)),
                }
            }
        }
    }

    fn lower_all(&self, args: &[Node]) -> Result<Vec<Term>> {
        args.iter().map(|arg| self.lower(arg)).collect()
    }
}

/// Shorthand for `Rewriter::new(scope).rewrite(node)`.
pub fn rewrite(node: &Node, scope: &Scope) -> Result<Term> {
    Rewriter::new(scope).rewrite(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormulaError;

    fn sym(name: &str) -> Node {
        Node::symbol(name)
    }

    #[test]
    fn leaves() {
        let scope = Scope::new();
        assert_eq!(rewrite(&sym("a"), &scope), Ok(Term::column("a")));
        assert_eq!(rewrite(&Node::number(1.0), &scope), Ok(Term::constant(1.0)));
        assert_eq!(rewrite(&Node::Absent, &scope), Ok(Term::Absent));
    }

    #[test]
    fn specials_keep_operator_and_arity() {
        let scope = Scope::new();
        let n = Node::call(
            "*",
            vec![sym("a"), Node::call("&", vec![sym("b"), sym("c")]), sym("d")],
        );
        assert_eq!(
            rewrite(&n, &scope),
            Ok(Term::op(
                Special::Expand,
                vec![
                    Term::column("a"),
                    Term::op(Special::Interaction, vec![Term::column("b"), Term::column("c")]),
                    Term::column("d"),
                ]
            ))
        );
    }

    #[test]
    fn sums_inside_calls_are_lowered_as_terms() {
        let scope = Scope::with_builtins();
        let n = Node::call("log", vec![Node::call("+", vec![sym("a"), sym("b")])]);
        let term = rewrite(&n, &scope).unwrap();
        let call = match &term {
            Term::Captured(call) => call,
            other => panic!("expected a captured call, got {:?}", other),
        };
        assert_eq!(
            call.lowered_args(),
            &[Term::op(Special::Sum, vec![Term::column("a"), Term::column("b")])][..]
        );
        assert_eq!(call.free_variables(), &["a".to_string(), "b".to_string()][..]);
        assert_eq!(call.original(), &n);
    }

    #[test]
    fn nested_calls_are_captured_inside_out() {
        let scope = Scope::with_builtins();
        let n = Node::call("exp", vec![Node::call("log", vec![sym("x")])]);
        let term = rewrite(&n, &scope).unwrap();
        let names: Vec<_> = term
            .captured_calls()
            .iter()
            .map(|c| c.function().name().to_string())
            .collect();
        assert_eq!(names, vec!["exp", "log"]);
    }

    #[test]
    fn escape_is_rejected_before_capture() {
        // `nope` is unresolvable, but the escape marker is reported first
        let n = Node::call("nope", vec![sym("a"), Node::escape(sym("b"))]);
        assert_eq!(
            rewrite(&n, &Scope::new()),
            Err(FormulaError::Unsupported {
                expr: "$b".to_string()
            })
        );
    }

    #[test]
    fn unresolved_function_fails_the_whole_rewrite() {
        let n = Node::call("+", vec![sym("a"), Node::call("mystery", vec![sym("b")])]);
        assert!(matches!(
            rewrite(&n, &Scope::with_builtins()),
            Err(FormulaError::UnresolvedFunction { ref name, .. }) if name == "mystery"
        ));
    }
}

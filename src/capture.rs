//! Captured calls: function applications that are not formula operators.
//!
//! A call such as `log(a)` cannot be interpreted while the formula is
//! built, because `a` names a data column. It is kept as a
//! [`CapturedCall`] holding the resolved function, the original expression
//! and a [`CallClosure`] that reproduces the call once a data row is known.

use serde::Serialize;
use std::fmt;

use crate::error::{EvalError, FormulaError, Result};
use crate::evaluator::{Env, Function, Scope};
use crate::free_vars::free_variables;
use crate::node::Node;
use crate::term::Term;
use crate::validate::check_call;

/// Re-evaluates a captured expression against bindings for its free
/// variables. Evaluation interprets the stored expression; nothing is
/// generated.
#[derive(Clone)]
pub struct CallClosure {
    function: Function,
    args: Vec<Node>,
    free_variables: Vec<String>,
    scope: Scope,
}

impl CallClosure {
    /// Evaluate the call with free variables read from `env`.
    pub fn call(&self, env: &Env) -> std::result::Result<f64, EvalError> {
        self.scope.apply(&self.function, &self.args, env)
    }

    /// Evaluate the call binding `values` to the free variables in order.
    pub fn call_positional(&self, values: &[f64]) -> std::result::Result<f64, EvalError> {
        if values.len() != self.free_variables.len() {
            return Err(EvalError::Bindings {
                variables: self.free_variables.clone(),
                actual: values.len(),
            });
        }
        let env: Env = self
            .free_variables
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect();
        self.call(&env)
    }
}

impl fmt::Debug for CallClosure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CallClosure")
            .field("function", &self.function.name())
            .field("free_variables", &self.free_variables)
            .finish()
    }
}

/// A function application kept for evaluation against data.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedCall {
    function: Function,
    #[serde(skip)]
    closure: CallClosure,
    free_variables: Vec<String>,
    original: Node,
    lowered_args: Vec<Term>,
}

impl CapturedCall {
    /// The function, resolved when the formula was written.
    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn closure(&self) -> &CallClosure {
        &self.closure
    }

    pub fn free_variables(&self) -> &[String] {
        &self.free_variables
    }

    /// The call exactly as written, before rewriting.
    pub fn original(&self) -> &Node {
        &self.original
    }

    /// Arguments rewritten as formula terms, so that `f(a + b)` still sees
    /// `a + b` as a sum of terms.
    pub fn lowered_args(&self) -> &[Term] {
        &self.lowered_args
    }

    /// Shorthand for `self.closure().call(env)`.
    pub fn evaluate(&self, env: &Env) -> std::result::Result<f64, EvalError> {
        self.closure.call(env)
    }
}

impl PartialEq for CapturedCall {
    fn eq(&self, other: &CapturedCall) -> bool {
        self.function == other.function
            && self.free_variables == other.free_variables
            && self.original == other.original
            && self.lowered_args == other.lowered_args
    }
}

/// Wrap the ordinary call `node` into a captured call.
///
/// `lowered_args` are the call's arguments already rewritten, one per
/// argument of `node`. The head function and every call nested in the
/// arguments are looked up in `scope` now; the closure keeps a snapshot of
/// `scope` to evaluate them.
pub fn capture_call(node: &Node, lowered_args: Vec<Term>, scope: &Scope) -> Result<CapturedCall> {
    let (op, args) = check_call(node)?;
    if lowered_args.len() != args.len() {
        return Err(FormulaError::Syntax {
            message: format!(
                "expected {} lowered arguments, got {}",
                args.len(),
                lowered_args.len()
            ),
            expr: node.to_string(),
        });
    }
    let function = scope
        .resolve(op)
        .cloned()
        .ok_or_else(|| FormulaError::UnresolvedFunction {
            name: op.to_string(),
            expr: node.to_string(),
        })?;
    if let Some(name) = unresolved_call(args, scope) {
        return Err(FormulaError::UnresolvedFunction {
            name: name.to_string(),
            expr: node.to_string(),
        });
    }
    let free_variables: Vec<String> = free_variables(node).into_iter().collect();
    let closure = CallClosure {
        function: function.clone(),
        args: args.to_vec(),
        free_variables: free_variables.clone(),
        scope: scope.clone(),
    };
    Ok(CapturedCall {
        function,
        closure,
        free_variables,
        original: node.clone(),
        lowered_args,
    })
}

/// First operator below `args` that `scope` does not define.
fn unresolved_call<'n>(args: &'n [Node], scope: &Scope) -> Option<&'n str> {
    let mut missing = None;
    for arg in args {
        arg.walk(&mut |n: &'n Node| match n {
            Node::Call { op, .. } if missing.is_none() && !scope.contains(op) => {
                missing = Some(op.as_str())
            }
            _ => {}
        });
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_a() -> Node {
        Node::call("log", vec![Node::symbol("a")])
    }

    #[test]
    fn captures_function_and_free_variables() {
        let scope = Scope::with_builtins();
        let call = capture_call(&log_a(), vec![Term::column("a")], &scope).unwrap();
        assert_eq!(call.function().name(), "log");
        assert_eq!(call.free_variables(), &["a".to_string()][..]);
        assert_eq!(call.original(), &log_a());
        assert_eq!(call.lowered_args(), &[Term::column("a")][..]);
    }

    #[test]
    fn closure_reproduces_the_call() {
        let mut scope = Scope::with_builtins();
        scope.define("poly", Some(2), |args| Ok(args[0] * args[0] + args[1]));
        let node = Node::call("poly", vec![Node::symbol("a"), Node::symbol("b")]);
        let call = capture_call(
            &node,
            vec![Term::column("a"), Term::column("b")],
            &scope,
        )
        .unwrap();

        let mut env = Env::new();
        env.insert("a".to_string(), 3.0);
        env.insert("b".to_string(), 1.0);
        assert_eq!(call.evaluate(&env), Ok(10.0));
        assert_eq!(call.closure().call_positional(&[2.0, 0.5]), Ok(4.5));
        assert_eq!(
            call.closure().call_positional(&[2.0]),
            Err(EvalError::Bindings {
                variables: vec!["a".to_string(), "b".to_string()],
                actual: 1,
            })
        );
    }

    #[test]
    fn head_is_bound_eagerly() {
        let mut scope = Scope::new();
        scope.define("f", Some(1), |args| Ok(args[0] + 1.0));
        let node = Node::call("f", vec![Node::number(1.0)]);
        let call = capture_call(&node, vec![Term::constant(1.0)], &scope).unwrap();
        scope.define("f", Some(1), |args| Ok(args[0] + 100.0));
        assert_eq!(call.evaluate(&Env::new()), Ok(2.0));
    }

    #[test]
    fn nested_operators_are_resolved_eagerly() {
        let scope = Scope::with_builtins();
        let node = Node::call(
            "log",
            vec![Node::call("&", vec![Node::symbol("a"), Node::symbol("b")])],
        );
        let lowered = vec![Term::op(
            crate::term::Special::Interaction,
            vec![Term::column("a"), Term::column("b")],
        )];
        let call = capture_call(&node, lowered, &scope).unwrap();
        let mut env = Env::new();
        env.insert("a".to_string(), 2.0);
        env.insert("b".to_string(), 0.5);
        assert_eq!(call.evaluate(&env), Ok(0.0));

        let node = Node::call(
            "exp",
            vec![Node::call("~", vec![Node::symbol("a"), Node::symbol("b")])],
        );
        assert_eq!(
            capture_call(&node, vec![Term::Absent], &scope).map(|_| ()),
            Err(FormulaError::UnresolvedFunction {
                name: "~".to_string(),
                expr: "exp(a ~ b)".to_string(),
            })
        );
    }

    #[test]
    fn debug_omits_the_scope() {
        let call = capture_call(&log_a(), vec![Term::column("a")], &Scope::with_builtins()).unwrap();
        let shown = format!("{:?}", call.closure());
        assert!(shown.contains("log"), "{}", shown);
        assert!(!shown.contains("sqrt"), "{}", shown);
    }

    #[test]
    fn rejects_unknown_functions_and_non_calls() {
        let scope = Scope::new();
        assert!(matches!(
            capture_call(&log_a(), vec![Term::column("a")], &scope),
            Err(FormulaError::UnresolvedFunction { .. })
        ));
        assert!(matches!(
            capture_call(&Node::symbol("a"), vec![], &Scope::with_builtins()),
            Err(FormulaError::Syntax { .. })
        ));
    }
}
